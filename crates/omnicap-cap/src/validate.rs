//! Structural validation for CAP alerts
//!
//! The validator walks every entity of an alert and records each defect
//! instead of stopping at the first one. Requiredness and enum availability
//! come from the [`VersionProfile`] of the version being validated against.

use crate::alert::{
    split_reference, Alert, Area, CapDateTime, Circle, Info, Point, Polygon, Resource, ValuePair,
    CAP_DATETIME_FORMAT,
};
use crate::diagnostic::{DiagnosticKind, DiagnosticList};
use crate::enums::{self, CapEnum, MsgType, Scope};
use crate::profile::{CapVersion, Field, Requiredness, ValuePairStyle, VersionProfile};
use chrono::DateTime;
use regex::Regex;
use std::sync::OnceLock;

/// Validates an alert against the version it is pinned to
pub fn validate_alert(alert: &Alert) -> DiagnosticList {
    validate_for(alert, alert.version)
}

/// Validates an alert against an explicit target version
pub fn validate_for(alert: &Alert, version: CapVersion) -> DiagnosticList {
    let mut diagnostics = DiagnosticList::new();
    validate_into(alert, version, &mut diagnostics);
    diagnostics
}

/// Appends findings to `diagnostics`. Required-field findings are skipped for
/// paths that already carry a diagnostic (e.g. a value that failed to parse).
pub(crate) fn validate_into(alert: &Alert, version: CapVersion, diagnostics: &mut DiagnosticList) {
    let mut validator = Validator {
        profile: version.profile(),
        diagnostics,
    };
    validator.alert(alert);
}

/// Parses a CAP timestamp: `YYYY-MM-DDThh:mm:ss` plus a mandatory numeric
/// offset. The `Z` designator and fractional seconds are rejected.
pub fn parse_datetime(value: &str) -> Result<CapDateTime, String> {
    if !datetime_shape().is_match(value) {
        if value.ends_with('Z') || value.ends_with('z') {
            return Err(format!(
                "'{}' uses the 'Z' designator; CAP requires a numeric offset such as -00:00",
                value
            ));
        }
        return Err(format!(
            "'{}' does not match YYYY-MM-DDThh:mm:ss±hh:mm",
            value
        ));
    }

    DateTime::parse_from_str(value, CAP_DATETIME_FORMAT)
        .map(CapDateTime::new)
        .map_err(|e| format!("'{}' is not a valid date/time: {}", value, e))
}

fn datetime_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| {
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}[+-][0-9]{2}:[0-9]{2}$")
            .expect("datetime pattern is valid")
    })
}

/// First character that may not appear in identifiers, senders and codes
pub fn forbidden_char(value: &str) -> Option<char> {
    value
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, ',' | '<' | '&'))
}

/// Whether `value` is a 40 hex digit SHA-1 digest
pub fn is_valid_digest(value: &str) -> bool {
    value.len() == 40 && value.chars().all(|c| c.is_ascii_hexdigit())
}

struct Validator<'a> {
    profile: &'static VersionProfile,
    diagnostics: &'a mut DiagnosticList,
}

impl Validator<'_> {
    fn require(&mut self, present: bool, path: &str) {
        if present || self.diagnostics.mentions(path) {
            return;
        }
        let field = path.rsplit('.').next().unwrap_or(path);
        self.diagnostics.error(
            DiagnosticKind::RequiredFieldMissing,
            "field.required",
            path,
            format!("{} is required", field),
        );
    }

    /// Requiredness check for fields whose status changed across versions
    fn versioned(&mut self, field: Field, present: bool, path: &str) {
        match self.profile.requiredness(field) {
            Requiredness::Required => self.require(present, path),
            Requiredness::Optional => {}
            Requiredness::Unsupported if present => {
                let name = path.rsplit('.').next().unwrap_or(path);
                self.diagnostics.error(
                    DiagnosticKind::InvalidStructure,
                    "field.unsupported-in-version",
                    path,
                    format!("{} is not part of {}", name, self.profile.version),
                );
            }
            Requiredness::Unsupported => {}
        }
    }

    fn enum_value<T: CapEnum>(&mut self, value: T, path: &str) {
        if let Err(e) = enums::encode(value, self.profile.version) {
            self.diagnostics.error(
                DiagnosticKind::InvalidEnumValue,
                "enum.unsupported-in-version",
                path,
                e.to_string(),
            );
        }
        if enums::is_deprecated(value) {
            self.diagnostics.warning(
                DiagnosticKind::Deprecated,
                "enum.deprecated",
                path,
                format!("{} value '{}' is deprecated", T::KIND, value.token()),
            );
        }
    }

    fn required_enum<T: CapEnum>(&mut self, value: Option<T>, path: &str) {
        match value {
            Some(value) => self.enum_value(value, path),
            None => self.require(false, path),
        }
    }

    fn token(&mut self, value: &str, path: &str) {
        if let Some(c) = forbidden_char(value) {
            self.diagnostics.error(
                DiagnosticKind::InvalidFormat,
                "token.forbidden-char",
                path,
                format!("'{}' contains forbidden character {:?}", value, c),
            );
        }
    }

    fn timestamp(&mut self, value: Option<&CapDateTime>, path: &str) {
        if let Some(value) = value {
            if value.as_datetime().timestamp_subsec_nanos() != 0 {
                self.diagnostics.error(
                    DiagnosticKind::InvalidFormat,
                    "datetime.sub-second",
                    path,
                    "CAP timestamps carry whole seconds only",
                );
            }
        }
    }

    fn alert(&mut self, alert: &Alert) {
        tracing::trace!(identifier = %alert.identifier, version = %self.profile.version, "validating alert");

        self.require(!alert.identifier.is_empty(), "alert.identifier");
        self.token(&alert.identifier, "alert.identifier");
        self.require(!alert.sender.is_empty(), "alert.sender");
        self.token(&alert.sender, "alert.sender");

        if alert.password.is_some() {
            let message = if self.profile.password_permitted {
                "password is deprecated and insecure".to_string()
            } else {
                format!("password is insecure and not part of {}", self.profile.version)
            };
            self.diagnostics.warning(
                DiagnosticKind::Deprecated,
                "alert.password.deprecated",
                "alert.password",
                message,
            );
        }

        self.require(alert.sent.is_some(), "alert.sent");
        self.timestamp(alert.sent.as_ref(), "alert.sent");
        self.required_enum(alert.status, "alert.status");
        self.required_enum(alert.msg_type, "alert.msgType");

        self.versioned(Field::Scope, alert.scope.is_some(), "alert.scope");
        if let Some(scope) = alert.scope {
            self.enum_value(scope, "alert.scope");
        }
        self.restricted_fields(alert);

        for (i, code) in alert.code.iter().enumerate() {
            self.token(code, &format!("alert.code[{}]", i));
        }
        self.references(alert);

        for (i, info) in alert.info.iter().enumerate() {
            self.info(info, &format!("alert.info[{}]", i));
        }
        self.language_overrides(&alert.info);
    }

    fn restricted_fields(&mut self, alert: &Alert) {
        match alert.scope {
            Some(Scope::Restricted) if alert.restriction.is_none() => {
                self.diagnostics.error(
                    DiagnosticKind::InvalidStructure,
                    "alert.restriction.required",
                    "alert.restriction",
                    "restriction is required when scope is Restricted",
                );
            }
            Some(Scope::Private) if alert.addresses.is_empty() => {
                self.diagnostics.error(
                    DiagnosticKind::InvalidStructure,
                    "alert.addresses.required",
                    "alert.addresses",
                    "addresses are required when scope is Private",
                );
            }
            _ => {}
        }

        if alert.restriction.is_some() && alert.scope != Some(Scope::Restricted) {
            self.diagnostics.warning(
                DiagnosticKind::InvalidStructure,
                "alert.restriction.unused",
                "alert.restriction",
                "restriction is only meaningful when scope is Restricted",
            );
        }
    }

    fn references(&mut self, alert: &Alert) {
        for (i, token) in alert.references.iter().enumerate() {
            let well_formed = split_reference(token).is_some_and(|r| {
                !r.sender.is_empty() && !r.identifier.is_empty() && parse_datetime(r.sent).is_ok()
            });
            if !well_formed {
                self.diagnostics.error(
                    DiagnosticKind::InvalidFormat,
                    "references.record",
                    format!("alert.references[{}]", i),
                    format!("'{}' is not a sender,identifier,sent record", token),
                );
            }
        }

        let answers_earlier = matches!(
            alert.msg_type,
            Some(MsgType::Update | MsgType::Cancel | MsgType::Ack | MsgType::Error)
        );
        if answers_earlier && alert.references.is_empty() {
            self.diagnostics.warning(
                DiagnosticKind::InvalidStructure,
                "alert.references.expected",
                "alert.references",
                "Update, Cancel, Ack and Error messages should reference earlier messages",
            );
        }
    }

    fn info(&mut self, info: &Info, path: &str) {
        let category_path = format!("{}.category", path);
        self.versioned(Field::Category, !info.category.is_empty(), &category_path);
        for (i, category) in info.category.iter().enumerate() {
            self.enum_value(*category, &format!("{}[{}]", category_path, i));
        }

        self.require(!info.event.is_empty(), &format!("{}.event", path));

        let response_path = format!("{}.responseType", path);
        self.versioned(Field::ResponseType, !info.response_type.is_empty(), &response_path);
        for (i, response) in info.response_type.iter().enumerate() {
            self.enum_value(*response, &format!("{}[{}]", response_path, i));
        }

        self.required_enum(info.urgency, &format!("{}.urgency", path));
        self.required_enum(info.severity, &format!("{}.severity", path));
        self.required_enum(info.certainty, &format!("{}.certainty", path));

        for (i, pair) in info.event_code.iter().enumerate() {
            self.value_pair(pair, &format!("{}.eventCode[{}]", path, i));
        }

        self.timestamp(info.effective.as_ref(), &format!("{}.effective", path));
        self.timestamp(info.onset.as_ref(), &format!("{}.onset", path));
        self.timestamp(info.expires.as_ref(), &format!("{}.expires", path));
        if let (Some(effective), Some(expires)) = (&info.effective, &info.expires) {
            if expires < effective {
                self.diagnostics.warning(
                    DiagnosticKind::InvalidStructure,
                    "info.expires-before-effective",
                    format!("{}.expires", path),
                    format!("expires {} is earlier than effective {}", expires, effective),
                );
            }
        }

        for (i, pair) in info.parameter.iter().enumerate() {
            self.value_pair(pair, &format!("{}.parameter[{}]", path, i));
        }
        for (i, resource) in info.resource.iter().enumerate() {
            self.resource(resource, &format!("{}.resource[{}]", path, i));
        }
        for (i, area) in info.area.iter().enumerate() {
            self.area(area, &format!("{}.area[{}]", path, i));
        }
    }

    fn value_pair(&mut self, pair: &ValuePair, path: &str) {
        self.require(!pair.value_name.is_empty(), &format!("{}.valueName", path));
        self.require(!pair.value.is_empty(), &format!("{}.value", path));

        // `valueName=value` splits at the first `=` and keeps both sides as-is
        if self.profile.value_pair_style == ValuePairStyle::InlineText {
            let padded = |s: &str| s.trim() != s;
            if pair.value_name.contains('=') || padded(&pair.value_name) || padded(&pair.value) {
                self.diagnostics.error(
                    DiagnosticKind::InvalidFormat,
                    "value-pair.inline-text",
                    path,
                    format!(
                        "'{}={}' cannot be written as {} inline text: the name may not contain '=' and neither part may start or end with whitespace",
                        pair.value_name, pair.value, self.profile.version
                    ),
                );
            }
        }
    }

    fn resource(&mut self, resource: &Resource, path: &str) {
        self.require(
            !resource.resource_desc.is_empty(),
            &format!("{}.resourceDesc", path),
        );
        self.versioned(
            Field::MimeType,
            resource.mime_type.is_some(),
            &format!("{}.mimeType", path),
        );

        let deref_path = format!("{}.derefUri", path);
        self.versioned(Field::DerefUri, resource.deref_uri.is_some(), &deref_path);
        if resource.deref_uri.is_some()
            && resource.uri.is_none()
            && self.profile.deref_uri != Requiredness::Unsupported
        {
            self.diagnostics.warning(
                DiagnosticKind::InvalidStructure,
                "resource.deref-uri.without-uri",
                deref_path,
                "derefUri is an inline fallback and should accompany uri",
            );
        }

        if let Some(digest) = &resource.digest {
            if !is_valid_digest(digest) {
                self.diagnostics.error(
                    DiagnosticKind::InvalidFormat,
                    "resource.digest.format",
                    format!("{}.digest", path),
                    format!("'{}' is not a 40 character SHA-1 hex digest", digest),
                );
            }
        }
    }

    fn area(&mut self, area: &Area, path: &str) {
        self.require(!area.area_desc.is_empty(), &format!("{}.areaDesc", path));

        for (i, polygon) in area.polygon.iter().enumerate() {
            self.polygon(polygon, &format!("{}.polygon[{}]", path, i));
        }
        for (i, circle) in area.circle.iter().enumerate() {
            self.circle(circle, &format!("{}.circle[{}]", path, i));
        }
        for (i, pair) in area.geocode.iter().enumerate() {
            self.value_pair(pair, &format!("{}.geocode[{}]", path, i));
        }

        for (name, value) in [("altitude", area.altitude), ("ceiling", area.ceiling)] {
            if value.is_some_and(|v| !v.is_finite()) {
                self.diagnostics.error(
                    DiagnosticKind::InvalidStructure,
                    "area.non-finite",
                    format!("{}.{}", path, name),
                    format!("{} must be a finite number", name),
                );
            }
        }

        let ceiling_path = format!("{}.ceiling", path);
        match (area.altitude, area.ceiling) {
            (None, Some(_)) => {
                self.diagnostics.error(
                    DiagnosticKind::InvalidStructure,
                    "area.ceiling-without-altitude",
                    ceiling_path,
                    "ceiling requires altitude",
                );
            }
            (Some(altitude), Some(ceiling)) if ceiling < altitude => {
                self.diagnostics.error(
                    DiagnosticKind::InvalidStructure,
                    "area.ceiling-below-altitude",
                    ceiling_path,
                    format!("ceiling {} is below altitude {}", ceiling, altitude),
                );
            }
            _ => {}
        }
    }

    fn polygon(&mut self, polygon: &Polygon, path: &str) {
        let points = &polygon.points;
        if points.len() < 4 {
            self.diagnostics.error(
                DiagnosticKind::InvalidStructure,
                "polygon.min-points",
                path,
                format!("polygon has {} points, at least 4 are required", points.len()),
            );
        }
        if !points.is_empty() && !polygon.is_closed() {
            self.diagnostics.error(
                DiagnosticKind::InvalidStructure,
                "polygon.closure",
                path,
                "first and last points must be identical",
            );
        }
        for (i, pair) in points.windows(2).enumerate() {
            if pair[0] == pair[1] {
                self.diagnostics.error(
                    DiagnosticKind::InvalidStructure,
                    "polygon.degenerate-edge",
                    path,
                    format!("points {} and {} are identical", i, i + 1),
                );
            }
        }
        for point in points {
            self.point(point, path);
        }
    }

    fn circle(&mut self, circle: &Circle, path: &str) {
        self.point(&circle.center, path);
        if !(circle.radius.is_finite() && circle.radius >= 0.0) {
            self.diagnostics.error(
                DiagnosticKind::InvalidStructure,
                "circle.radius",
                path,
                format!("radius {} must be a finite, non-negative number", circle.radius),
            );
        }
    }

    fn point(&mut self, point: &Point, path: &str) {
        if !(-90.0..=90.0).contains(&point.lat) || !(-180.0..=180.0).contains(&point.lon) {
            self.diagnostics.error(
                DiagnosticKind::InvalidStructure,
                "point.range",
                path,
                format!("point {} is outside WGS-84 bounds", point),
            );
        }
    }

    /// Advisory: a later block in the same language should add targeting,
    /// not restate core fields with different values.
    fn language_overrides(&mut self, infos: &[Info]) {
        for (j, later) in infos.iter().enumerate() {
            let Some((i, earlier)) = infos[..j]
                .iter()
                .enumerate()
                .find(|(_, earlier)| earlier.language == later.language)
            else {
                continue;
            };

            let overridden = [
                ("event", differs(non_empty(&earlier.event), non_empty(&later.event))),
                ("urgency", differs(earlier.urgency, later.urgency)),
                ("severity", differs(earlier.severity, later.severity)),
                ("certainty", differs(earlier.certainty, later.certainty)),
                (
                    "headline",
                    differs(earlier.headline.as_deref(), later.headline.as_deref()),
                ),
            ];
            for (field, _) in overridden.iter().filter(|(_, changed)| *changed) {
                self.diagnostics.warning(
                    DiagnosticKind::InvalidStructure,
                    "info.language.override",
                    format!("alert.info[{}].{}", j, field),
                    format!(
                        "overrides {} of info[{}] with the same language '{}'",
                        field, i, later.language
                    ),
                );
            }
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn differs<T: PartialEq>(a: Option<T>, b: Option<T>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a != b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{Category, Certainty, ResponseType, Severity, Status, Urgency};
    use crate::group::Group;

    fn sent() -> CapDateTime {
        parse_datetime("2024-01-15T10:30:00-05:00").unwrap()
    }

    fn create_valid_alert(version: CapVersion) -> Alert {
        let mut alert = Alert::new(version);
        alert.identifier = "KSTO1055887203".to_string();
        alert.sender = "KSTO@NWS.NOAA.GOV".to_string();
        alert.sent = Some(sent());
        alert.status = Some(Status::Actual);
        alert.msg_type = Some(MsgType::Alert);
        alert.scope = Some(Scope::Public);

        let mut info = Info::new("SEVERE THUNDERSTORM");
        info.category.push(Category::Met);
        info.urgency = Some(Urgency::Immediate);
        info.severity = Some(Severity::Severe);
        info.certainty = Some(Certainty::Observed);
        info.effective = Some(sent());

        let mut area = Area::new("EXTREME NORTH CENTRAL TUOLUMNE COUNTY");
        area.polygon.push(Polygon::new(vec![
            Point::new(38.47, -120.14),
            Point::new(38.34, -119.95),
            Point::new(38.52, -119.74),
            Point::new(38.47, -120.14),
        ]));
        info.area.push(area);
        alert.info.push(info);
        alert
    }

    fn rules(diagnostics: &DiagnosticList) -> Vec<&'static str> {
        diagnostics.iter().map(|d| d.rule_id).collect()
    }

    #[test]
    fn test_valid_alert() {
        let diagnostics = validate_alert(&create_valid_alert(CapVersion::V1_2));
        assert!(diagnostics.is_empty(), "{}", diagnostics);
    }

    #[test]
    fn test_three_point_polygon() {
        for version in [CapVersion::V1_1, CapVersion::V1_2] {
            let mut alert = create_valid_alert(version);
            alert.info[0].area[0].polygon[0].points.remove(1);
            let diagnostics = validate_alert(&alert);
            let d = diagnostics.find("polygon.min-points").unwrap();
            assert!(d.is_error());
            assert_eq!(d.kind, DiagnosticKind::InvalidStructure);
            assert_eq!(d.path, "alert.info[0].area[0].polygon[0]");
        }
    }

    #[test]
    fn test_open_polygon() {
        let mut alert = create_valid_alert(CapVersion::V1_2);
        alert.info[0].area[0].polygon[0].points[3] = Point::new(38.48, -120.14);
        let diagnostics = validate_alert(&alert);
        assert_eq!(rules(&diagnostics), vec!["polygon.closure"]);
    }

    #[test]
    fn test_degenerate_edge() {
        let mut alert = create_valid_alert(CapVersion::V1_2);
        let points = &mut alert.info[0].area[0].polygon[0].points;
        let first = points[0];
        points.insert(1, first);
        let diagnostics = validate_alert(&alert);
        assert_eq!(rules(&diagnostics), vec!["polygon.degenerate-edge"]);
    }

    #[test]
    fn test_ceiling_without_altitude() {
        let mut alert = create_valid_alert(CapVersion::V1_0);
        alert.info[0].certainty = Some(Certainty::Likely);
        alert.info[0].area[0].ceiling = Some(1000.0);
        let diagnostics = validate_alert(&alert);
        let d = diagnostics.find("area.ceiling-without-altitude").unwrap();
        assert_eq!(d.kind, DiagnosticKind::InvalidStructure);
        assert_eq!(d.path, "alert.info[0].area[0].ceiling");

        alert.info[0].area[0].altitude = Some(2000.0);
        let diagnostics = validate_alert(&alert);
        assert_eq!(rules(&diagnostics), vec!["area.ceiling-below-altitude"]);

        alert.info[0].area[0].altitude = Some(500.0);
        assert!(validate_alert(&alert).is_empty());
    }

    #[test]
    fn test_scope_requiredness_by_version() {
        let mut alert = create_valid_alert(CapVersion::V1_1);
        alert.scope = None;
        let diagnostics = validate_alert(&alert);
        let d = diagnostics.find("field.required").unwrap();
        assert_eq!(d.path, "alert.scope");
        assert_eq!(d.kind, DiagnosticKind::RequiredFieldMissing);

        let mut alert = create_valid_alert(CapVersion::V1_0);
        alert.info[0].certainty = Some(Certainty::Likely);
        alert.scope = None;
        assert!(validate_alert(&alert).is_empty());
    }

    #[test]
    fn test_enum_not_in_target_version() {
        let mut alert = create_valid_alert(CapVersion::V1_1);
        alert.info[0].category.push(Category::Cbrne);
        alert.info[0].response_type.push(ResponseType::AllClear);
        let diagnostics = validate_alert(&alert);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.iter().next().unwrap().path, "alert.info[0].responseType[0]");

        let diagnostics = validate_for(&alert, CapVersion::V1_0);
        let paths: Vec<_> = diagnostics.iter().map(|d| d.path.as_str()).collect();
        assert!(paths.contains(&"alert.info[0].category[1]"));
        assert!(paths.contains(&"alert.info[0].certainty"));
        assert!(paths.contains(&"alert.info[0].responseType"));
    }

    #[test]
    fn test_password_is_warning_only() {
        for version in CapVersion::ALL {
            let mut alert = create_valid_alert(version);
            alert.info[0].certainty = Some(Certainty::Likely);
            alert.password = Some("secret".to_string());
            let diagnostics = validate_alert(&alert);
            assert!(!diagnostics.has_errors());
            assert_eq!(rules(&diagnostics), vec!["alert.password.deprecated"]);
        }
    }

    #[test]
    fn test_very_likely_is_deprecated() {
        let mut alert = create_valid_alert(CapVersion::V1_2);
        alert.info[0].certainty = Some(Certainty::VeryLikely);
        let diagnostics = validate_alert(&alert);
        let d = diagnostics.find("enum.deprecated").unwrap();
        assert_eq!(d.kind, DiagnosticKind::Deprecated);
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn test_forbidden_token_characters() {
        let mut alert = create_valid_alert(CapVersion::V1_2);
        alert.identifier = "id with space".to_string();
        alert.sender = "a&b".to_string();
        alert.code = Group::parse("ok \"bad,code\"");
        let diagnostics = validate_alert(&alert);
        let paths: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.rule_id == "token.forbidden-char")
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(paths, vec!["alert.identifier", "alert.sender", "alert.code[1]"]);
    }

    #[test]
    fn test_parse_datetime_rules() {
        assert!(parse_datetime("2002-05-24T16:49:00-07:00").is_ok());
        assert!(parse_datetime("2002-05-24T16:49:00Z").unwrap_err().contains("'Z'"));
        assert!(parse_datetime("2002-05-24T16:49:00.5-07:00").is_err());
        assert!(parse_datetime("2002-05-24 16:49:00-07:00").is_err());
        assert!(parse_datetime("2002-13-24T16:49:00-07:00").is_err());
    }

    #[test]
    fn test_resource_rules() {
        let mut alert = create_valid_alert(CapVersion::V1_2);
        let mut resource = Resource::new("map");
        resource.digest = Some("not-a-digest".to_string());
        resource.deref_uri = Some("aGVsbG8=".to_string());
        alert.info[0].resource.push(resource);

        let diagnostics = validate_alert(&alert);
        assert_eq!(
            rules(&diagnostics),
            vec![
                "field.required",
                "resource.deref-uri.without-uri",
                "resource.digest.format"
            ]
        );
        assert_eq!(
            diagnostics.find("field.required").unwrap().path,
            "alert.info[0].resource[0].mimeType"
        );
    }

    #[test]
    fn test_restricted_scope_needs_restriction() {
        let mut alert = create_valid_alert(CapVersion::V1_2);
        alert.scope = Some(Scope::Restricted);
        assert_eq!(rules(&validate_alert(&alert)), vec!["alert.restriction.required"]);

        alert.scope = Some(Scope::Private);
        alert.restriction = Some("staff only".to_string());
        assert_eq!(
            rules(&validate_alert(&alert)),
            vec!["alert.addresses.required", "alert.restriction.unused"]
        );
    }

    #[test]
    fn test_language_override_is_advisory() {
        let mut alert = create_valid_alert(CapVersion::V1_2);
        let mut second = alert.info[0].clone();
        second.severity = Some(Severity::Extreme);
        second.area.clear();
        alert.info.push(second);

        let diagnostics = validate_alert(&alert);
        assert!(!diagnostics.has_errors());
        let d = diagnostics.find("info.language.override").unwrap();
        assert_eq!(d.path, "alert.info[1].severity");

        alert.info[1].language = "es-US".to_string();
        assert!(validate_alert(&alert).is_empty());
    }

    #[test]
    fn test_point_range() {
        let mut alert = create_valid_alert(CapVersion::V1_2);
        alert.info[0].area[0]
            .circle
            .push(Circle::new(Point::new(91.0, -120.0), 5.0));
        let diagnostics = validate_alert(&alert);
        assert_eq!(rules(&diagnostics), vec!["point.range"]);
        let d = diagnostics.iter().next().unwrap();
        assert_eq!(d.kind, DiagnosticKind::InvalidStructure);
        assert_eq!(d.path, "alert.info[0].area[0].circle[0]");

        alert.info[0].area[0].circle[0].center = Point::new(38.0, 180.5);
        assert_eq!(rules(&validate_alert(&alert)), vec!["point.range"]);

        alert.info[0].area[0].circle[0].center = Point::new(-90.0, 180.0);
        assert!(validate_alert(&alert).is_empty());
    }

    #[test]
    fn test_circle_radius() {
        let mut alert = create_valid_alert(CapVersion::V1_2);
        alert.info[0].area[0]
            .circle
            .push(Circle::new(Point::new(38.0, -120.0), -1.0));
        let diagnostics = validate_alert(&alert);
        assert_eq!(rules(&diagnostics), vec!["circle.radius"]);
        let d = diagnostics.iter().next().unwrap();
        assert_eq!(d.kind, DiagnosticKind::InvalidStructure);
        assert_eq!(d.path, "alert.info[0].area[0].circle[0]");

        alert.info[0].area[0].circle[0].radius = f64::INFINITY;
        assert_eq!(rules(&validate_alert(&alert)), vec!["circle.radius"]);

        alert.info[0].area[0].circle[0].radius = 0.0;
        assert!(validate_alert(&alert).is_empty());
    }

    #[test]
    fn test_area_non_finite() {
        let mut alert = create_valid_alert(CapVersion::V1_2);
        alert.info[0].area[0].altitude = Some(f64::NAN);
        let diagnostics = validate_alert(&alert);
        assert_eq!(rules(&diagnostics), vec!["area.non-finite"]);
        let d = diagnostics.iter().next().unwrap();
        assert_eq!(d.kind, DiagnosticKind::InvalidStructure);
        assert_eq!(d.path, "alert.info[0].area[0].altitude");
    }

    #[test]
    fn test_inline_value_pairs_must_split_back() {
        let mut alert = create_valid_alert(CapVersion::V1_0);
        alert.info[0].certainty = Some(Certainty::Likely);
        alert.info[0].parameter.push(ValuePair::new("a=b", "c"));
        alert.info[0].parameter.push(ValuePair::new("name", " padded"));
        alert.info[0].area[0].geocode.push(ValuePair::new("FIPS ", "006109"));
        alert.info[0].event_code.push(ValuePair::new("SAME", "SVR=x"));

        let diagnostics = validate_alert(&alert);
        let paths: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.rule_id == "value-pair.inline-text")
            .map(|d| d.path.as_str())
            .collect();
        assert_eq!(
            paths,
            vec![
                "alert.info[0].parameter[0]",
                "alert.info[0].parameter[1]",
                "alert.info[0].area[0].geocode[0]"
            ]
        );
        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics.iter().all(|d| d.kind == DiagnosticKind::InvalidFormat));

        // Element style carries the same pairs unchanged
        alert.version = CapVersion::V1_2;
        alert.info[0].certainty = Some(Certainty::Observed);
        assert!(validate_alert(&alert).is_empty());
    }

    #[test]
    fn test_reports_every_defect() {
        let mut alert = create_valid_alert(CapVersion::V1_2);
        alert.identifier.clear();
        alert.info[0].urgency = None;
        alert.info[0].area[0].polygon[0].points.truncate(2);
        alert.info[0].area[0].ceiling = Some(10.0);
        alert.info[0].area.push(Area::new(""));

        let diagnostics = validate_alert(&alert);
        assert_eq!(
            rules(&diagnostics),
            vec![
                "field.required",
                "field.required",
                "polygon.min-points",
                "polygon.closure",
                "area.ceiling-without-altitude",
                "field.required",
            ]
        );
    }
}
