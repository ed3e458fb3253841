//! Versioned validation and XML codec for the Common Alerting Protocol
//!
//! This crate decodes, validates and encodes CAP 1.0, 1.1 and 1.2 alert
//! messages against a single version-neutral [`Alert`] model. The rules
//! that differ between versions live in one table per version
//! ([`VersionProfile`]); the codec and validator consult it instead of
//! carrying per-version copies of the model.
//!
//! # Features
//!
//! - Namespace-driven version detection on decode
//! - Structured diagnostics with a severity, a path and a stable rule id
//! - Decoding keeps going past field errors and reports them all
//! - Encoding refuses any alert that does not validate for the target version
//! - Group text (`addresses`, `code`, `references`, `incidents`) with quoting
//!
//! # Example
//!
//! ```rust
//! use omnicap_cap::{decode, encode, CapVersion};
//!
//! let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <alert xmlns="urn:oasis:names:tc:emergency:cap:1.2">
//!   <identifier>KSTO1055887203</identifier>
//!   <sender>KSTO@NWS.NOAA.GOV</sender>
//!   <sent>2003-06-17T14:57:00-07:00</sent>
//!   <status>Actual</status>
//!   <msgType>Alert</msgType>
//!   <scope>Public</scope>
//! </alert>"#;
//!
//! let decoded = decode(xml);
//! assert!(!decoded.diagnostics.has_errors());
//! let alert = decoded.alert.expect("Failed to decode CAP");
//! assert_eq!(alert.version, CapVersion::V1_2);
//!
//! let encoded = encode(&alert, CapVersion::V1_1);
//! assert!(encoded.xml.unwrap().contains("cap:1.1"));
//! ```

pub mod alert;
pub mod diagnostic;
pub mod enums;
pub mod error;
pub mod group;
pub mod parser;
pub mod profile;
pub mod serializer;
pub mod validate;

pub use alert::{
    Alert, Area, CapDateTime, Circle, Info, Point, Polygon, Reference, Resource, ValuePair,
};
pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticList, Severity};
pub use enums::{
    CapEnum, Category, Certainty, EnumError, MsgType, ResponseType, Scope, Status, Urgency,
};
pub use error::CodecError;
pub use group::Group;
pub use parser::{decode, decode_bytes, decode_strict, Decoded};
pub use profile::{CapVersion, EnumKind, Field, Requiredness, ValuePairStyle, VersionProfile};
pub use serializer::{convert, encode, encode_strict, encode_with, EncodeOptions, Encoded};
pub use validate::{parse_datetime, validate_alert, validate_for};
