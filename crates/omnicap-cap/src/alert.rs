//! CAP alert message structures
//!
//! Fields that a document may omit but a valid alert requires (`sent`,
//! `status`, `urgency`, ...) are `Option`s so that an incomplete tree can still
//! be validated as a whole. They are only `None` on alerts that fail
//! validation. Required text fields use the empty string for "absent".

use crate::enums::{Category, Certainty, MsgType, ResponseType, Scope, Severity, Status, Urgency};
use crate::group::Group;
use crate::profile::CapVersion;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Language assumed for an `info` block without `<language>`
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Root CAP message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Protocol version the message is pinned to (via its xmlns)
    pub version: CapVersion,
    pub identifier: String,
    pub sender: String,
    /// Deprecated, insecure; only part of the 1.0 schema
    pub password: Option<String>,
    pub sent: Option<CapDateTime>,
    pub status: Option<Status>,
    pub msg_type: Option<MsgType>,
    pub source: Option<String>,
    pub scope: Option<Scope>,
    pub restriction: Option<String>,
    pub addresses: Group,
    pub code: Group,
    pub note: Option<String>,
    /// Tokens of the form `sender,identifier,sent`
    pub references: Group,
    pub incidents: Group,
    pub info: Vec<Info>,
}

/// One language-scoped information block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub language: String,
    pub category: Vec<Category>,
    pub event: String,
    pub response_type: Vec<ResponseType>,
    pub urgency: Option<Urgency>,
    pub severity: Option<Severity>,
    pub certainty: Option<Certainty>,
    pub audience: Option<String>,
    pub event_code: Vec<ValuePair>,
    pub effective: Option<CapDateTime>,
    pub onset: Option<CapDateTime>,
    pub expires: Option<CapDateTime>,
    pub sender_name: Option<String>,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub instruction: Option<String>,
    pub web: Option<String>,
    pub contact: Option<String>,
    pub parameter: Vec<ValuePair>,
    pub resource: Vec<Resource>,
    pub area: Vec<Area>,
}

/// Supplementary file attached to an info block
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resource {
    pub resource_desc: String,
    pub mime_type: Option<String>,
    /// Size in bytes
    pub size: Option<u64>,
    pub uri: Option<String>,
    /// Base64 content, an inline fallback for `uri`
    pub deref_uri: Option<String>,
    /// SHA-1 hex digest of the resource
    pub digest: Option<String>,
}

/// Geographic target of an info block: the union of its shapes and geocodes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Area {
    pub area_desc: String,
    pub polygon: Vec<Polygon>,
    pub circle: Vec<Circle>,
    pub geocode: Vec<ValuePair>,
    /// Feet above mean sea level
    pub altitude: Option<f64>,
    /// Feet above mean sea level; only meaningful with `altitude`
    pub ceiling: Option<f64>,
}

/// WGS-84 coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

/// Closed ring of points; the first and last point are identical
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point,
    /// Kilometers
    pub radius: f64,
}

/// Named value used by `eventCode`, `parameter` and `geocode`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValuePair {
    pub value_name: String,
    pub value: String,
}

/// One split `references` token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference<'a> {
    pub sender: &'a str,
    pub identifier: &'a str,
    pub sent: &'a str,
}

/// CAP timestamp: whole seconds with an explicit numeric UTC offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CapDateTime(DateTime<FixedOffset>);

/// Wire layout of [`CapDateTime`]
pub const CAP_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

impl CapDateTime {
    pub fn new(datetime: DateTime<FixedOffset>) -> Self {
        Self(datetime)
    }

    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    /// Wire form, e.g. `2002-05-24T16:49:00-07:00`
    pub fn to_wire(&self) -> String {
        self.0.format(CAP_DATETIME_FORMAT).to_string()
    }
}

impl From<DateTime<FixedOffset>> for CapDateTime {
    fn from(datetime: DateTime<FixedOffset>) -> Self {
        Self(datetime)
    }
}

impl From<CapDateTime> for String {
    fn from(value: CapDateTime) -> Self {
        value.to_wire()
    }
}

impl TryFrom<String> for CapDateTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        crate::validate::parse_datetime(&value)
    }
}

impl fmt::Display for CapDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl Alert {
    /// Create an empty alert pinned to `version`
    pub fn new(version: CapVersion) -> Self {
        Self {
            version,
            identifier: String::new(),
            sender: String::new(),
            password: None,
            sent: None,
            status: None,
            msg_type: None,
            source: None,
            scope: None,
            restriction: None,
            addresses: Group::new(),
            code: Group::new(),
            note: None,
            references: Group::new(),
            incidents: Group::new(),
            info: Vec::new(),
        }
    }

    /// xmlns string that pins this alert's version
    pub fn xmlns(&self) -> &'static str {
        self.version.namespace()
    }

    /// Split each `references` token into its three parts.
    ///
    /// Tokens that do not have exactly three comma-separated parts are
    /// returned as `None`.
    pub fn reference_records(&self) -> Vec<Option<Reference<'_>>> {
        self.references.iter().map(split_reference).collect()
    }

    /// Apply the decode-time derivations: a missing `language` becomes
    /// [`DEFAULT_LANGUAGE`] and a missing `effective` takes the value of `sent`.
    pub fn normalized(mut self) -> Self {
        for info in &mut self.info {
            if info.language.is_empty() {
                info.language = DEFAULT_LANGUAGE.to_string();
            }
            if info.effective.is_none() {
                info.effective = self.sent;
            }
        }
        self
    }
}

pub(crate) fn split_reference(token: &str) -> Option<Reference<'_>> {
    let mut parts = token.split(',');
    let sender = parts.next()?;
    let identifier = parts.next()?;
    let sent = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Reference {
        sender,
        identifier,
        sent,
    })
}

impl Info {
    /// Create an info block in the default language
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            category: Vec::new(),
            event: event.into(),
            response_type: Vec::new(),
            urgency: None,
            severity: None,
            certainty: None,
            audience: None,
            event_code: Vec::new(),
            effective: None,
            onset: None,
            expires: None,
            sender_name: None,
            headline: None,
            description: None,
            instruction: None,
            web: None,
            contact: None,
            parameter: Vec::new(),
            resource: Vec::new(),
            area: Vec::new(),
        }
    }
}

impl Area {
    pub fn new(area_desc: impl Into<String>) -> Self {
        Self {
            area_desc: area_desc.into(),
            ..Self::default()
        }
    }
}

impl Resource {
    pub fn new(resource_desc: impl Into<String>) -> Self {
        Self {
            resource_desc: resource_desc.into(),
            ..Self::default()
        }
    }
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Whether the ring is explicitly closed (exact equality, no epsilon)
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => self.points.len() > 1 && first == last,
            _ => false,
        }
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, point) in self.points.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", point)?;
        }
        Ok(())
    }
}

impl Circle {
    pub fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl fmt::Display for Circle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.center, self.radius)
    }
}

impl ValuePair {
    pub fn new(value_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            value_name: value_name.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_records() {
        let mut alert = Alert::new(CapVersion::V1_2);
        alert.references = Group::parse(
            "sender@example.org,id-42,2020-01-01T00:00:00-05:00 broken-token",
        );

        let records = alert.reference_records();
        assert_eq!(records.len(), 2);
        let first = records[0].as_ref().unwrap();
        assert_eq!(first.sender, "sender@example.org");
        assert_eq!(first.identifier, "id-42");
        assert_eq!(first.sent, "2020-01-01T00:00:00-05:00");
        assert!(records[1].is_none());
    }

    #[test]
    fn test_normalized_applies_defaults() {
        let sent: CapDateTime = "2020-01-01T00:00:00-05:00".to_string().try_into().unwrap();
        let mut alert = Alert::new(CapVersion::V1_1);
        alert.sent = Some(sent);
        let mut info = Info::new("Flood");
        info.language = String::new();
        alert.info.push(info);

        let alert = alert.normalized();
        assert_eq!(alert.info[0].language, DEFAULT_LANGUAGE);
        assert_eq!(alert.info[0].effective, Some(sent));
    }

    #[test]
    fn test_polygon_closure_is_exact() {
        let closed = Polygon::new(vec![
            Point::new(1.0, 1.0),
            Point::new(1.0, 2.0),
            Point::new(2.0, 2.0),
            Point::new(1.0, 1.0),
        ]);
        assert!(closed.is_closed());

        let mut open = closed.clone();
        open.points[3].lat = 1.000_000_1;
        assert!(!open.is_closed());
        assert!(!Polygon::default().is_closed());
    }

    #[test]
    fn test_shape_wire_forms() {
        let circle = Circle::new(Point::new(32.9525, -115.5527), 0.0);
        assert_eq!(circle.to_string(), "32.9525,-115.5527 0");

        let polygon = Polygon::new(vec![Point::new(38.47, -120.14), Point::new(38.34, -119.95)]);
        assert_eq!(polygon.to_string(), "38.47,-120.14 38.34,-119.95");
    }

    #[test]
    fn test_datetime_keeps_offset() {
        let value: CapDateTime = "2002-05-24T16:49:00-07:00".to_string().try_into().unwrap();
        assert_eq!(value.to_wire(), "2002-05-24T16:49:00-07:00");
    }
}
