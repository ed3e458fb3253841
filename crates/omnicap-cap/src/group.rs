//! The space-delimited, quote-aware "group" text format
//!
//! CAP packs `addresses`, `code`, `references` and `incidents` into a single
//! text value. Tokens are separated by whitespace; a token containing
//! whitespace, a comma or a double quote is wrapped in double quotes, with
//! `\"` and `\\` escapes inside the quotes.
//!
//! The identity of a group is its token list. `parse(serialize(t)) == t`
//! holds for every token list, but `serialize(parse(s))` only preserves the
//! tokens of `s`, not its spacing or quoting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered list of group tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group(Vec<String>);

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the wire text of a group
    pub fn parse(text: &str) -> Self {
        Self(parse(text))
    }

    /// Wire text of this group
    pub fn to_wire(&self) -> String {
        serialize(&self.0)
    }

    pub fn push(&mut self, token: impl Into<String>) {
        self.0.push(token.into());
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<S: Into<String>> FromIterator<S> for Group {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Extend<String> for Group {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Group {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<Vec<String>> for Group {
    fn from(tokens: Vec<String>) -> Self {
        Self(tokens)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Split group text into tokens.
///
/// Unquoted backslashes are literal. An unterminated quote runs to the end
/// of the input.
pub fn parse(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '\\' => match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => current.push('\\'),
                },
                '"' => in_quotes = false,
                _ => current.push(c),
            }
        } else if c.is_whitespace() {
            if in_token {
                tokens.push(std::mem::take(&mut current));
                in_token = false;
            }
        } else if c == '"' {
            in_quotes = true;
            in_token = true;
        } else {
            current.push(c);
            in_token = true;
        }
    }

    if in_token {
        tokens.push(current);
    }

    tokens
}

/// Join tokens with single spaces, quoting where needed
pub fn serialize<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write_token(&mut out, token.as_ref());
    }
    out
}

fn needs_quotes(token: &str) -> bool {
    token.is_empty()
        || token
            .chars()
            .any(|c| c.is_whitespace() || c == ',' || c == '"')
}

fn write_token(out: &mut String, token: &str) {
    if !needs_quotes(token) {
        out.push_str(token);
        return;
    }

    out.push('"');
    for c in token.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_tokens() {
        assert_eq!(parse("a  b\tc\n d"), vec!["a", "b", "c", "d"]);
        assert!(parse("   ").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_parse_quoted_tokens() {
        assert_eq!(
            parse(r#"one "two words" three"#),
            vec!["one", "two words", "three"]
        );
        assert_eq!(parse(r#""say \"hi\"""#), vec![r#"say "hi""#]);
        assert_eq!(parse(r#""""#), vec![""]);
    }

    #[test]
    fn test_unquoted_backslash_is_literal() {
        assert_eq!(parse(r"C:\dir x"), vec![r"C:\dir", "x"]);
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        assert_eq!(parse(r#"a "b c"#), vec!["a", "b c"]);
    }

    #[test]
    fn test_serialize_quotes_when_needed() {
        assert_eq!(serialize(&["a", "b"]), "a b");
        assert_eq!(serialize(&["two words"]), r#""two words""#);
        assert_eq!(serialize(&["x,y,z"]), r#""x,y,z""#);
        assert_eq!(serialize(&[r#"q"uote"#]), r#""q\"uote""#);
        assert_eq!(serialize(&[""]), r#""""#);
        assert_eq!(serialize::<&str>(&[]), "");
    }

    #[test]
    fn test_parse_inverts_serialize() {
        let samples: Vec<Vec<&str>> = vec![
            vec![],
            vec!["single"],
            vec!["with space", "plain", ""],
            vec![r#"a\"b"#, r"trailing\", "tab\there"],
            vec!["sender@example.org,id-42,2020-01-01T00:00:00-05:00"],
            vec!["\"", "\\", " ", ","],
        ];
        for tokens in samples {
            assert_eq!(parse(&serialize(&tokens)), tokens, "tokens: {:?}", tokens);
        }
    }

    #[test]
    fn test_normalization_is_semantic() {
        let messy = "  a   \"b\"  \"c d\" ";
        let normalized = serialize(&parse(messy));
        assert_eq!(normalized, r#"a b "c d""#);
        assert_eq!(parse(&normalized), parse(messy));
    }

    #[test]
    fn test_group_wrapper() {
        let group: Group = ["a", "b c"].into_iter().collect();
        assert_eq!(group.len(), 2);
        assert_eq!(group.to_wire(), r#"a "b c""#);
        assert_eq!(Group::parse(&group.to_wire()), group);
    }
}
