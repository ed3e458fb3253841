//! Per-version CAP rule tables
//!
//! Everything that differs between CAP 1.0, 1.1 and 1.2 lives here: which
//! fields are required, which enum tokens exist, the namespace that pins a
//! document to a version, and how value pairs are spelled on the wire. The
//! rest of the crate asks the profile instead of branching on versions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A CAP protocol version. The set is closed and known at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CapVersion {
    #[serde(rename = "1.0")]
    V1_0,
    #[serde(rename = "1.1")]
    V1_1,
    #[serde(rename = "1.2")]
    V1_2,
}

impl CapVersion {
    /// All versions, oldest first
    pub const ALL: [CapVersion; 3] = [CapVersion::V1_0, CapVersion::V1_1, CapVersion::V1_2];

    /// The rule table for this version
    pub fn profile(self) -> &'static VersionProfile {
        match self {
            CapVersion::V1_0 => &V1_0_PROFILE,
            CapVersion::V1_1 => &V1_1_PROFILE,
            CapVersion::V1_2 => &V1_2_PROFILE,
        }
    }

    /// Canonical xmlns string for this version
    pub fn namespace(self) -> &'static str {
        self.profile().namespace
    }

    /// Exact match of a root namespace against the known versions
    pub fn from_namespace(namespace: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|version| version.namespace() == namespace)
    }

    /// Short version label ("1.0", "1.1", "1.2")
    pub fn as_str(self) -> &'static str {
        match self {
            CapVersion::V1_0 => "1.0",
            CapVersion::V1_1 => "1.1",
            CapVersion::V1_2 => "1.2",
        }
    }
}

impl fmt::Display for CapVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CAP {}", self.as_str())
    }
}

impl FromStr for CapVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.0" | "V1_0" => Ok(CapVersion::V1_0),
            "1.1" | "V1_1" => Ok(CapVersion::V1_1),
            "1.2" | "V1_2" => Ok(CapVersion::V1_2),
            other => Err(format!(
                "unknown CAP version '{}' (expected 1.0, 1.1 or 1.2)",
                other
            )),
        }
    }
}

/// Whether a field must, may, or cannot appear under a version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requiredness {
    Required,
    Optional,
    Unsupported,
}

/// Fields whose requiredness changed between versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Scope,
    Category,
    ResponseType,
    MimeType,
    DerefUri,
}

/// The closed enumerations of the CAP schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnumKind {
    Status,
    MsgType,
    Scope,
    Category,
    ResponseType,
    Urgency,
    Severity,
    Certainty,
}

impl fmt::Display for EnumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnumKind::Status => "status",
            EnumKind::MsgType => "msgType",
            EnumKind::Scope => "scope",
            EnumKind::Category => "category",
            EnumKind::ResponseType => "responseType",
            EnumKind::Urgency => "urgency",
            EnumKind::Severity => "severity",
            EnumKind::Certainty => "certainty",
        };
        f.write_str(name)
    }
}

/// How `eventCode`, `parameter` and `geocode` are spelled on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuePairStyle {
    /// `<parameter>valueName=value</parameter>` (1.0)
    InlineText,
    /// `<parameter><valueName>..</valueName><value>..</value></parameter>` (1.1+)
    Elements,
}

/// Static rule table for one CAP version
#[derive(Debug)]
pub struct VersionProfile {
    pub version: CapVersion,
    pub namespace: &'static str,
    pub scope: Requiredness,
    pub category: Requiredness,
    pub response_type: Requiredness,
    pub mime_type: Requiredness,
    pub deref_uri: Requiredness,
    /// `password` is part of the 1.0 schema only
    pub password_permitted: bool,
    pub value_pair_style: ValuePairStyle,
}

/// Enum tokens that are not part of the first version, with the version that
/// introduced them.
const INTRODUCED: &[(EnumKind, &str, CapVersion)] = &[
    (EnumKind::Status, "Draft", CapVersion::V1_1),
    (EnumKind::Category, "CBRNE", CapVersion::V1_1),
    (EnumKind::Certainty, "Observed", CapVersion::V1_1),
    (EnumKind::ResponseType, "Avoid", CapVersion::V1_2),
    (EnumKind::ResponseType, "AllClear", CapVersion::V1_2),
];

/// Tokens kept for legacy documents. Accepted by every version.
const DEPRECATED: &[(EnumKind, &str)] = &[(EnumKind::Certainty, "Very Likely")];

static V1_0_PROFILE: VersionProfile = VersionProfile {
    version: CapVersion::V1_0,
    namespace: "http://www.incident.com/cap/1.0",
    scope: Requiredness::Optional,
    category: Requiredness::Optional,
    response_type: Requiredness::Unsupported,
    mime_type: Requiredness::Optional,
    deref_uri: Requiredness::Unsupported,
    password_permitted: true,
    value_pair_style: ValuePairStyle::InlineText,
};

static V1_1_PROFILE: VersionProfile = VersionProfile {
    version: CapVersion::V1_1,
    namespace: "urn:oasis:names:tc:emergency:cap:1.1",
    scope: Requiredness::Required,
    category: Requiredness::Required,
    response_type: Requiredness::Optional,
    mime_type: Requiredness::Optional,
    deref_uri: Requiredness::Optional,
    password_permitted: false,
    value_pair_style: ValuePairStyle::Elements,
};

static V1_2_PROFILE: VersionProfile = VersionProfile {
    version: CapVersion::V1_2,
    namespace: "urn:oasis:names:tc:emergency:cap:1.2",
    scope: Requiredness::Required,
    category: Requiredness::Required,
    response_type: Requiredness::Optional,
    mime_type: Requiredness::Required,
    deref_uri: Requiredness::Optional,
    password_permitted: false,
    value_pair_style: ValuePairStyle::Elements,
};

impl VersionProfile {
    /// Requiredness of a version-sensitive field
    pub fn requiredness(&self, field: Field) -> Requiredness {
        match field {
            Field::Scope => self.scope,
            Field::Category => self.category,
            Field::ResponseType => self.response_type,
            Field::MimeType => self.mime_type,
            Field::DerefUri => self.deref_uri,
        }
    }

    /// Whether `token` of `kind` exists in this version
    pub fn permits(&self, kind: EnumKind, token: &str) -> bool {
        INTRODUCED
            .iter()
            .find(|(k, t, _)| *k == kind && *t == token)
            .map_or(true, |(_, _, since)| *since <= self.version)
    }
}

/// Whether `token` of `kind` is a deprecated alias. The same under every
/// version.
pub fn is_deprecated(kind: EnumKind, token: &str) -> bool {
    DEPRECATED.iter().any(|(k, t)| *k == kind && *t == token)
}
