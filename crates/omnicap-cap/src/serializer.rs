//! XML serialization for CAP alerts

use crate::alert::{Alert, Area, CapDateTime, Info, Resource, ValuePair};
use crate::diagnostic::DiagnosticList;
use crate::enums::{self, CapEnum};
use crate::error::CodecError;
use crate::parser::decode;
use crate::profile::{CapVersion, ValuePairStyle};
use crate::validate::validate_for;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::Writer;
use tracing::debug;

/// Result of encoding one alert.
///
/// `xml` is present only when the pre-encode validation raised no `ERROR`.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub xml: Option<String>,
    pub diagnostics: DiagnosticList,
}

impl Encoded {
    /// Convert into a `Result`, failing unless XML was produced
    pub fn into_result(self) -> Result<String, CodecError> {
        match self.xml {
            Some(xml) => Ok(xml),
            None => Err(CodecError::Invalid(self.diagnostics)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Indent nested elements by two spaces
    pub pretty: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Encode an alert as a CAP document for `version`
pub fn encode(alert: &Alert, version: CapVersion) -> Encoded {
    encode_with(alert, version, EncodeOptions::default())
}

/// Encode with explicit output options
pub fn encode_with(alert: &Alert, version: CapVersion, options: EncodeOptions) -> Encoded {
    let mut diagnostics = validate_for(alert, version);
    if diagnostics.has_errors() {
        debug!(
            identifier = %alert.identifier,
            %version,
            errors = diagnostics.errors().count(),
            "alert failed pre-encode validation"
        );
        return Encoded {
            xml: None,
            diagnostics,
        };
    }

    match write_document(alert, version, options) {
        Ok(xml) => {
            debug!(identifier = %alert.identifier, %version, bytes = xml.len(), "encoded CAP alert");
            Encoded {
                xml: Some(xml),
                diagnostics,
            }
        }
        Err(e) => {
            diagnostics.extend(e.into_diagnostics());
            Encoded {
                xml: None,
                diagnostics,
            }
        }
    }
}

/// Encode, failing on any `ERROR` diagnostic
pub fn encode_strict(alert: &Alert, version: CapVersion) -> Result<String, CodecError> {
    encode(alert, version).into_result()
}

/// Re-encode a CAP document for another version.
///
/// Returns the decode diagnostics if the source does not decode, otherwise
/// the diagnostics of encoding under `target`.
pub fn convert(xml: &str, target: CapVersion, options: EncodeOptions) -> Encoded {
    let decoded = decode(xml);
    match decoded.alert {
        Some(mut alert) => {
            alert.version = target;
            encode_with(&alert, target, options)
        }
        None => Encoded {
            xml: None,
            diagnostics: decoded.diagnostics,
        },
    }
}

fn write_document(
    alert: &Alert,
    version: CapVersion,
    options: EncodeOptions,
) -> Result<String, CodecError> {
    let writer = if options.pretty {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    };
    let mut encoder = Encoder { writer, version };
    encoder.alert(alert)?;

    let bytes = encoder.writer.into_inner();
    String::from_utf8(bytes).map_err(|e| CodecError::Write {
        reason: e.to_string(),
    })
}

struct Encoder {
    writer: Writer<Vec<u8>>,
    version: CapVersion,
}

impl Encoder {
    fn event(&mut self, event: XmlEvent<'_>) -> Result<(), CodecError> {
        self.writer
            .write_event(event)
            .map_err(|e| CodecError::Write {
                reason: e.to_string(),
            })
    }

    fn start(&mut self, name: &str) -> Result<(), CodecError> {
        self.event(XmlEvent::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<(), CodecError> {
        self.event(XmlEvent::End(BytesEnd::new(name)))
    }

    fn text(&mut self, name: &str, value: &str) -> Result<(), CodecError> {
        self.start(name)?;
        self.event(XmlEvent::Text(BytesText::new(value)))?;
        self.end(name)
    }

    fn optional(&mut self, name: &str, value: Option<&str>) -> Result<(), CodecError> {
        match value {
            Some(value) => self.text(name, value),
            None => Ok(()),
        }
    }

    fn required(&mut self, name: &str, value: &str) -> Result<(), CodecError> {
        if value.is_empty() {
            return Ok(());
        }
        self.text(name, value)
    }

    fn enum_value<T: CapEnum>(&mut self, name: &str, value: Option<T>) -> Result<(), CodecError> {
        match value {
            Some(value) => {
                let token = enums::encode(value, self.version)?;
                self.text(name, token)
            }
            None => Ok(()),
        }
    }

    fn datetime(&mut self, name: &str, value: Option<&CapDateTime>) -> Result<(), CodecError> {
        match value {
            Some(value) => self.text(name, &value.to_wire()),
            None => Ok(()),
        }
    }

    fn value_pair(&mut self, name: &str, pair: &ValuePair) -> Result<(), CodecError> {
        match self.version.profile().value_pair_style {
            ValuePairStyle::InlineText => {
                self.text(name, &format!("{}={}", pair.value_name, pair.value))
            }
            ValuePairStyle::Elements => {
                self.start(name)?;
                self.text("valueName", &pair.value_name)?;
                self.text("value", &pair.value)?;
                self.end(name)
            }
        }
    }

    fn alert(&mut self, alert: &Alert) -> Result<(), CodecError> {
        self.event(XmlEvent::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("alert");
        root.push_attribute(("xmlns", self.version.namespace()));
        self.event(XmlEvent::Start(root))?;

        self.required("identifier", &alert.identifier)?;
        self.required("sender", &alert.sender)?;
        self.optional("password", alert.password.as_deref())?;
        self.datetime("sent", alert.sent.as_ref())?;
        self.enum_value("status", alert.status)?;
        self.enum_value("msgType", alert.msg_type)?;
        self.optional("source", alert.source.as_deref())?;
        self.enum_value("scope", alert.scope)?;
        self.optional("restriction", alert.restriction.as_deref())?;
        if !alert.addresses.is_empty() {
            self.text("addresses", &alert.addresses.to_wire())?;
        }
        if !alert.code.is_empty() {
            self.text("code", &alert.code.to_wire())?;
        }
        self.optional("note", alert.note.as_deref())?;
        if !alert.references.is_empty() {
            self.text("references", &alert.references.to_wire())?;
        }
        if !alert.incidents.is_empty() {
            self.text("incidents", &alert.incidents.to_wire())?;
        }

        for info in &alert.info {
            self.info(info)?;
        }

        self.end("alert")
    }

    fn info(&mut self, info: &Info) -> Result<(), CodecError> {
        self.start("info")?;

        self.required("language", &info.language)?;
        for category in &info.category {
            self.enum_value("category", Some(*category))?;
        }
        self.required("event", &info.event)?;
        for response in &info.response_type {
            self.enum_value("responseType", Some(*response))?;
        }
        self.enum_value("urgency", info.urgency)?;
        self.enum_value("severity", info.severity)?;
        self.enum_value("certainty", info.certainty)?;
        self.optional("audience", info.audience.as_deref())?;
        for pair in &info.event_code {
            self.value_pair("eventCode", pair)?;
        }
        self.datetime("effective", info.effective.as_ref())?;
        self.datetime("onset", info.onset.as_ref())?;
        self.datetime("expires", info.expires.as_ref())?;
        self.optional("senderName", info.sender_name.as_deref())?;
        self.optional("headline", info.headline.as_deref())?;
        self.optional("description", info.description.as_deref())?;
        self.optional("instruction", info.instruction.as_deref())?;
        self.optional("web", info.web.as_deref())?;
        self.optional("contact", info.contact.as_deref())?;
        for pair in &info.parameter {
            self.value_pair("parameter", pair)?;
        }
        for resource in &info.resource {
            self.resource(resource)?;
        }
        for area in &info.area {
            self.area(area)?;
        }

        self.end("info")
    }

    fn resource(&mut self, resource: &Resource) -> Result<(), CodecError> {
        self.start("resource")?;
        self.required("resourceDesc", &resource.resource_desc)?;
        self.optional("mimeType", resource.mime_type.as_deref())?;
        if let Some(size) = resource.size {
            self.text("size", &size.to_string())?;
        }
        self.optional("uri", resource.uri.as_deref())?;
        self.optional("derefUri", resource.deref_uri.as_deref())?;
        self.optional("digest", resource.digest.as_deref())?;
        self.end("resource")
    }

    fn area(&mut self, area: &Area) -> Result<(), CodecError> {
        self.start("area")?;
        self.required("areaDesc", &area.area_desc)?;
        for polygon in &area.polygon {
            self.text("polygon", &polygon.to_string())?;
        }
        for circle in &area.circle {
            self.text("circle", &circle.to_string())?;
        }
        for pair in &area.geocode {
            self.value_pair("geocode", pair)?;
        }
        if let Some(altitude) = area.altitude {
            self.text("altitude", &altitude.to_string())?;
        }
        if let Some(ceiling) = area.ceiling {
            self.text("ceiling", &ceiling.to_string())?;
        }
        self.end("area")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{Circle, Point, Polygon};
    use crate::enums::{Category, Certainty, MsgType, Scope, Severity, Status, Urgency};
    use crate::validate::parse_datetime;

    fn create_alert(version: CapVersion) -> Alert {
        let sent = parse_datetime("2024-01-15T10:30:00-05:00").unwrap();
        let mut alert = Alert::new(version);
        alert.identifier = "TEST-1".to_string();
        alert.sender = "ops@example.org".to_string();
        alert.sent = Some(sent);
        alert.status = Some(Status::Exercise);
        alert.msg_type = Some(MsgType::Alert);
        alert.scope = Some(Scope::Public);

        let mut info = Info::new("Wildfire");
        info.category.push(Category::Fire);
        info.urgency = Some(Urgency::Expected);
        info.severity = Some(Severity::Moderate);
        info.certainty = Some(Certainty::Likely);
        info.effective = Some(sent);
        info.parameter.push(ValuePair::new("EAS-ORG", "CIV"));

        let mut area = Area::new("Ridge & canyon");
        area.circle.push(Circle::new(Point::new(34.1, -118.2), 5.0));
        area.polygon.push(Polygon::new(vec![
            Point::new(34.0, -118.0),
            Point::new(34.5, -118.0),
            Point::new(34.5, -118.5),
            Point::new(34.0, -118.0),
        ]));
        info.area.push(area);
        alert.info.push(info);
        alert
    }

    #[test]
    fn test_encode_minimal() {
        let xml = encode_strict(&create_alert(CapVersion::V1_2), CapVersion::V1_2)
            .expect("Failed to encode CAP");

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<alert xmlns="urn:oasis:names:tc:emergency:cap:1.2">"#));
        assert!(xml.contains("<identifier>TEST-1</identifier>"));
        assert!(xml.contains("<sent>2024-01-15T10:30:00-05:00</sent>"));
        assert!(xml.contains("<areaDesc>Ridge &amp; canyon</areaDesc>"));
        assert!(xml.contains("<circle>34.1,-118.2 5</circle>"));
        assert!(xml.contains("<valueName>EAS-ORG</valueName>"));
        // Absent optional fields are omitted, never emitted empty
        assert!(!xml.contains("<note"));
        assert!(!xml.contains("<password"));
    }

    #[test]
    fn test_encode_1_0_value_pairs() {
        let mut alert = create_alert(CapVersion::V1_0);
        alert.password = Some("legacy".to_string());
        let encoded = encode(&alert, CapVersion::V1_0);
        let xml = encoded.xml.expect("Failed to encode CAP 1.0");

        assert!(xml.contains(r#"xmlns="http://www.incident.com/cap/1.0""#));
        assert!(xml.contains("<parameter>EAS-ORG=CIV</parameter>"));
        assert!(xml.contains("<password>legacy</password>"));
        assert_eq!(encoded.diagnostics.len(), 1);
        assert!(!encoded.diagnostics.has_errors());
    }

    #[test]
    fn test_encode_rejects_enum_missing_from_target() {
        let mut alert = create_alert(CapVersion::V1_2);
        alert.info[0].category.push(Category::Cbrne);

        let encoded = encode(&alert, CapVersion::V1_0);
        assert!(encoded.xml.is_none());
        let d = encoded.diagnostics.find("enum.unsupported-in-version").unwrap();
        assert_eq!(d.path, "alert.info[0].category[1]");
    }

    #[test]
    fn test_encode_compact() {
        let xml = encode_with(
            &create_alert(CapVersion::V1_1),
            CapVersion::V1_1,
            EncodeOptions { pretty: false },
        )
        .into_result()
        .unwrap();
        assert!(!xml.contains('\n'));
        assert!(xml.contains("<info><language>en-US</language><category>Fire</category>"));
    }

    #[test]
    fn test_round_trip() {
        for version in CapVersion::ALL {
            let alert = create_alert(version);
            let xml = encode_strict(&alert, version).unwrap();
            let decoded = decode(&xml);
            assert!(decoded.diagnostics.is_empty(), "{}", decoded.diagnostics);
            assert_eq!(decoded.alert, Some(alert));
        }
    }

    #[test]
    fn test_convert_between_versions() {
        let xml = encode_strict(&create_alert(CapVersion::V1_0), CapVersion::V1_0).unwrap();
        let converted = convert(&xml, CapVersion::V1_2, EncodeOptions::default());
        let out = converted.xml.expect("Failed to convert to CAP 1.2");
        assert!(out.contains("urn:oasis:names:tc:emergency:cap:1.2"));
        assert!(out.contains("<valueName>EAS-ORG</valueName>"));

        let converted = convert("<alert/>", CapVersion::V1_2, EncodeOptions::default());
        assert!(converted.xml.is_none());
    }
}
