//! Error types for CAP decoding and encoding

use crate::diagnostic::{DiagnosticKind, DiagnosticList};
use crate::enums::EnumError;
use thiserror::Error;

/// Failures that stop a decode or encode call.
///
/// `MalformedInput` and `UnknownVersion` are document-level: nothing past
/// them can be interpreted. `Invalid` carries the full diagnostic list of a
/// document that was walked completely but failed validation.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Malformed input: {reason}")]
    MalformedInput { reason: String },

    #[error("Unknown CAP namespace: '{namespace}'")]
    UnknownVersion { namespace: String },

    #[error("Document failed validation with {} error(s)", .0.errors().count())]
    Invalid(DiagnosticList),

    #[error(transparent)]
    Enum(#[from] EnumError),

    #[error("XML write error: {reason}")]
    Write { reason: String },
}

impl CodecError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }

    /// Returns true for errors that abort before any entity is interpreted
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CodecError::MalformedInput { .. } | CodecError::UnknownVersion { .. }
        )
    }

    /// Express this error as diagnostics
    pub fn into_diagnostics(self) -> DiagnosticList {
        let mut diagnostics = DiagnosticList::new();
        match self {
            CodecError::Invalid(list) => return list,
            CodecError::MalformedInput { reason } => diagnostics.error(
                DiagnosticKind::MalformedInput,
                "xml.malformed",
                "",
                reason,
            ),
            CodecError::UnknownVersion { namespace } => diagnostics.error(
                DiagnosticKind::UnknownVersion,
                "version.unknown",
                "alert",
                format!("namespace '{}' does not identify a CAP version", namespace),
            ),
            CodecError::Enum(e) => diagnostics.error(
                DiagnosticKind::InvalidEnumValue,
                "enum.unsupported-in-version",
                "alert",
                e.to_string(),
            ),
            CodecError::Write { reason } => {
                diagnostics.error(DiagnosticKind::MalformedInput, "xml.write", "", reason)
            }
        }
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(CodecError::malformed("eof").is_fatal());
        assert!(CodecError::UnknownVersion {
            namespace: "urn:x".to_string()
        }
        .is_fatal());
        assert!(!CodecError::Invalid(DiagnosticList::new()).is_fatal());
    }

    #[test]
    fn test_into_diagnostics() {
        let diagnostics = CodecError::UnknownVersion {
            namespace: "urn:x".to_string(),
        }
        .into_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        let d = diagnostics.iter().next().unwrap();
        assert_eq!(d.kind, DiagnosticKind::UnknownVersion);
        assert_eq!(d.rule_id, "version.unknown");
        assert!(d.is_error());
    }
}
