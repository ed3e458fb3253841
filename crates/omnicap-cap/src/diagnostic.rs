//! Structured validation findings

use serde::Serialize;
use std::fmt;

/// `Error` is a CAP "MUST" violation, `Warning` a "SHOULD" violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Category of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// Unparsable XML; nothing else can be reported
    MalformedInput,
    /// Root namespace matches no known CAP version
    UnknownVersion,
    RequiredFieldMissing,
    InvalidEnumValue,
    /// Polygon, circle, altitude and field-usage invariants
    InvalidStructure,
    /// Timestamps, numbers and token character restrictions
    InvalidFormat,
    Deprecated,
}

/// One finding, located by a dotted path such as
/// `alert.info[0].area[2].ceiling`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub path: String,
    pub message: String,
    /// Stable identifier of the rule that fired
    #[serde(rename = "ruleId")]
    pub rule_id: &'static str,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity, self.rule_id, self.path, self.message
        )
    }
}

/// Ordered diagnostics from a single decode, encode or validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiagnosticList(Vec<Diagnostic>);

impl DiagnosticList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn error(
        &mut self,
        kind: DiagnosticKind,
        rule_id: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.add(Severity::Error, kind, rule_id, path, message);
    }

    pub fn warning(
        &mut self,
        kind: DiagnosticKind,
        rule_id: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.add(Severity::Warning, kind, rule_id, path, message);
    }

    fn add(
        &mut self,
        severity: Severity,
        kind: DiagnosticKind,
        rule_id: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.0.push(Diagnostic {
            severity,
            kind,
            path: path.into(),
            message: message.into(),
            rule_id,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    /// Highest severity present, if any
    pub fn max_severity(&self) -> Option<Severity> {
        self.0.iter().map(|d| d.severity).max()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Whether anything was already reported at `path` or below it
    pub fn mentions(&self, path: &str) -> bool {
        self.0.iter().any(|d| {
            d.path
                .strip_prefix(path)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('['))
        })
    }

    /// First diagnostic fired by `rule_id`
    pub fn find(&self, rule_id: &str) -> Option<&Diagnostic> {
        self.0.iter().find(|d| d.rule_id == rule_id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl<'a> IntoIterator for &'a DiagnosticList {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for DiagnosticList {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Extend<Diagnostic> for DiagnosticList {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl fmt::Display for DiagnosticList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_severity() {
        let mut list = DiagnosticList::new();
        assert_eq!(list.max_severity(), None);

        list.warning(DiagnosticKind::Deprecated, "alert.password.deprecated", "alert.password", "x");
        assert_eq!(list.max_severity(), Some(Severity::Warning));
        assert!(!list.has_errors());

        list.error(DiagnosticKind::InvalidFormat, "datetime.format", "alert.sent", "y");
        assert_eq!(list.max_severity(), Some(Severity::Error));
        assert_eq!(list.errors().count(), 1);
        assert_eq!(list.warnings().count(), 1);
    }

    #[test]
    fn test_mentions_matches_path_prefixes() {
        let mut list = DiagnosticList::new();
        list.error(
            DiagnosticKind::InvalidEnumValue,
            "enum.unknown-token",
            "alert.info[0].category[1]",
            "bad",
        );
        assert!(list.mentions("alert.info[0].category"));
        assert!(list.mentions("alert.info[0]"));
        assert!(!list.mentions("alert.info[0].cat"));
        assert!(!list.mentions("alert.info[1]"));
    }

    #[test]
    fn test_display_and_serialization() {
        let mut list = DiagnosticList::new();
        list.error(
            DiagnosticKind::InvalidStructure,
            "polygon.closure",
            "alert.info[0].area[0].polygon[0]",
            "first and last points differ",
        );

        assert_eq!(
            list.to_string(),
            "ERROR [polygon.closure] alert.info[0].area[0].polygon[0]: first and last points differ"
        );

        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json[0]["severity"], "ERROR");
        assert_eq!(json[0]["kind"], "InvalidStructure");
        assert_eq!(json[0]["ruleId"], "polygon.closure");
    }
}
