//! CAP closed enumerations and their wire tokens
//!
//! Each enumeration is its own type. `Urgency::Unknown`, `Severity::Unknown`
//! and `Certainty::Unknown` share a wire token but are unrelated values.
//!
//! Which tokens a version accepts is looked up in [`crate::profile`]; this
//! module only knows the token spelling.

use crate::profile::{self, CapVersion, EnumKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A closed CAP enumeration with a fixed wire token per value
pub trait CapEnum: Copy + Sized + 'static {
    const KIND: EnumKind;
    const VALUES: &'static [Self];

    /// Wire token, e.g. `"Very Likely"`
    fn token(self) -> &'static str;

    /// Exact, case-sensitive lookup across every version
    fn from_token(token: &str) -> Option<Self> {
        Self::VALUES.iter().copied().find(|v| v.token() == token)
    }
}

macro_rules! cap_enum {
    (
        $(#[$meta:meta])*
        $name:ident: $kind:ident {
            $($(#[$vmeta:meta])* $variant:ident => $token:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl CapEnum for $name {
            const KIND: EnumKind = EnumKind::$kind;
            const VALUES: &'static [Self] = &[$($name::$variant),+];

            fn token(self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.token())
            }
        }
    };
}

cap_enum! {
    /// Handling code of the alert message
    Status: Status {
        Actual => "Actual",
        Exercise => "Exercise",
        System => "System",
        Test => "Test",
        /// 1.1 and later
        Draft => "Draft",
    }
}

cap_enum! {
    /// Nature of the alert message
    MsgType: MsgType {
        Alert => "Alert",
        Update => "Update",
        Cancel => "Cancel",
        Ack => "Ack",
        Error => "Error",
    }
}

cap_enum! {
    /// Intended distribution of the alert message
    Scope: Scope {
        Public => "Public",
        Restricted => "Restricted",
        Private => "Private",
    }
}

cap_enum! {
    /// Category of the subject event
    Category: Category {
        Geo => "Geo",
        Met => "Met",
        Safety => "Safety",
        Security => "Security",
        Rescue => "Rescue",
        Fire => "Fire",
        Health => "Health",
        Env => "Env",
        Transport => "Transport",
        Infra => "Infra",
        /// 1.1 and later
        Cbrne => "CBRNE",
        Other => "Other",
    }
}

cap_enum! {
    /// Recommended type of action for the target audience
    ResponseType: ResponseType {
        Shelter => "Shelter",
        Evacuate => "Evacuate",
        Prepare => "Prepare",
        Execute => "Execute",
        /// 1.2 and later
        Avoid => "Avoid",
        Monitor => "Monitor",
        Assess => "Assess",
        /// 1.2 and later
        AllClear => "AllClear",
        None => "None",
    }
}

cap_enum! {
    Urgency: Urgency {
        Immediate => "Immediate",
        Expected => "Expected",
        Future => "Future",
        Past => "Past",
        Unknown => "Unknown",
    }
}

cap_enum! {
    Severity: Severity {
        Extreme => "Extreme",
        Severe => "Severe",
        Moderate => "Moderate",
        Minor => "Minor",
        Unknown => "Unknown",
    }
}

cap_enum! {
    Certainty: Certainty {
        /// 1.1 and later
        Observed => "Observed",
        Likely => "Likely",
        Possible => "Possible",
        Unlikely => "Unlikely",
        Unknown => "Unknown",
        /// Deprecated since 1.1; kept distinct from `Likely` for round-trips
        VeryLikely => "Very Likely",
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnumError {
    #[error("'{token}' is not a valid {kind} value")]
    UnknownToken { kind: EnumKind, token: String },

    #[error("{kind} value '{token}' is not defined in {version}")]
    NotInVersion {
        kind: EnumKind,
        token: &'static str,
        version: CapVersion,
    },
}

/// Decode a wire token under `version`.
///
/// Deprecated aliases decode to their own value; use [`is_deprecated`] to
/// flag them.
pub fn decode<T: CapEnum>(token: &str, version: CapVersion) -> Result<T, EnumError> {
    let value = T::from_token(token).ok_or_else(|| EnumError::UnknownToken {
        kind: T::KIND,
        token: token.to_string(),
    })?;
    check_version(value, version)?;
    Ok(value)
}

/// Encode a value for `version`, failing if the version lacks it
pub fn encode<T: CapEnum>(value: T, version: CapVersion) -> Result<&'static str, EnumError> {
    check_version(value, version)?;
    Ok(value.token())
}

/// Whether a value is a deprecated alias
pub fn is_deprecated<T: CapEnum>(value: T) -> bool {
    profile::is_deprecated(T::KIND, value.token())
}

fn check_version<T: CapEnum>(value: T, version: CapVersion) -> Result<(), EnumError> {
    if version.profile().permits(T::KIND, value.token()) {
        Ok(())
    } else {
        Err(EnumError::NotInVersion {
            kind: T::KIND,
            token: value.token(),
            version,
        })
    }
}
