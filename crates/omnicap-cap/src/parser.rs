//! CAP XML decoding
//!
//! The document is read into a small element tree with quick-xml, the root
//! namespace selects the version profile, and the tree is mapped onto the
//! alert model. Field-level problems are recorded as diagnostics and the walk
//! continues; only unreadable XML and unknown namespaces abort.

use crate::alert::{Alert, Area, CapDateTime, Circle, Info, Point, Polygon, Resource, ValuePair};
use crate::diagnostic::{DiagnosticKind, DiagnosticList};
use crate::enums::{self, CapEnum, Category, EnumError, ResponseType};
use crate::error::CodecError;
use crate::group::Group;
use crate::profile::{CapVersion, ValuePairStyle};
use crate::validate;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;
use std::str::FromStr;
use tracing::debug;

/// Result of decoding one document.
///
/// `alert` is present only when no `ERROR` diagnostic was raised.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub alert: Option<Alert>,
    pub diagnostics: DiagnosticList,
}

impl Decoded {
    /// Convert into a `Result`, failing unless an alert was produced
    pub fn into_result(self) -> Result<Alert, CodecError> {
        match self.alert {
            Some(alert) => Ok(alert),
            None => Err(CodecError::Invalid(self.diagnostics)),
        }
    }
}

/// Decode a CAP document from XML text
pub fn decode(xml: &str) -> Decoded {
    decode_document(xml).unwrap_or_else(|e| Decoded {
        alert: None,
        diagnostics: e.into_diagnostics(),
    })
}

/// Decode a CAP document from UTF-8 bytes
pub fn decode_bytes(xml: &[u8]) -> Decoded {
    match std::str::from_utf8(xml) {
        Ok(text) => decode(text),
        Err(e) => Decoded {
            alert: None,
            diagnostics: CodecError::malformed(format!("invalid UTF-8: {}", e)).into_diagnostics(),
        },
    }
}

/// Decode a CAP document, failing on fatal errors or any `ERROR` diagnostic
pub fn decode_strict(xml: &str) -> Result<Alert, CodecError> {
    decode_document(xml)?.into_result()
}

fn decode_document(xml: &str) -> Result<Decoded, CodecError> {
    let (root, namespace) = read_tree(xml)?;
    if root.name != "alert" {
        return Err(CodecError::malformed(format!(
            "root element is <{}>, expected <alert>",
            root.name
        )));
    }

    let version = CapVersion::from_namespace(&namespace)
        .ok_or(CodecError::UnknownVersion { namespace })?;
    debug!(%version, "detected CAP version");

    let mut decoder = Decoder {
        version,
        diagnostics: DiagnosticList::new(),
    };
    let alert = decoder.alert(&root).normalized();
    let mut diagnostics = decoder.diagnostics;
    validate::validate_into(&alert, version, &mut diagnostics);

    debug!(
        identifier = %alert.identifier,
        errors = diagnostics.errors().count(),
        warnings = diagnostics.warnings().count(),
        "decoded CAP alert"
    );

    let alert = (!diagnostics.has_errors()).then_some(alert);
    Ok(Decoded { alert, diagnostics })
}

/// Element with its local name, verbatim text and child elements
#[derive(Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

/// Deepest element nesting accepted. A CAP document needs five levels
/// (`alert/info/area/geocode/value`); the rest is headroom for extensions.
const MAX_DEPTH: usize = 32;

/// Read the document into a tree. Also returns the namespace bound to the
/// root element's prefix (or the default namespace).
fn read_tree(xml: &str) -> Result<(Node, String), CodecError> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;
    let mut namespace = String::new();

    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) => {
                if stack.is_empty() && root.is_none() {
                    namespace = root_namespace(&e)?;
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(CodecError::malformed(format!(
                        "elements nested deeper than {} levels",
                        MAX_DEPTH
                    )));
                }
                stack.push(open(&e));
            }
            Ok(XmlEvent::Empty(e)) => {
                if stack.is_empty() && root.is_none() {
                    namespace = root_namespace(&e)?;
                }
                close(open(&e), &mut stack, &mut root)?;
            }
            Ok(XmlEvent::End(_)) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| CodecError::malformed("unexpected closing tag"))?;
                close(node, &mut stack, &mut root)?;
            }
            Ok(XmlEvent::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| CodecError::malformed(e.to_string()))?;
                append_text(&mut stack, &text)?;
            }
            Ok(XmlEvent::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                append_text(&mut stack, &text)?;
            }
            Ok(XmlEvent::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(CodecError::malformed(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(CodecError::malformed(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    let root = root.ok_or_else(|| CodecError::malformed("document has no root element"))?;
    Ok((root, namespace))
}

fn open(element: &BytesStart) -> Node {
    Node {
        name: String::from_utf8_lossy(element.local_name().as_ref()).into_owned(),
        ..Node::default()
    }
}

fn close(mut node: Node, stack: &mut [Node], root: &mut Option<Node>) -> Result<(), CodecError> {
    // Indentation between child elements is not content
    if !node.children.is_empty() && node.text.trim().is_empty() {
        node.text.clear();
    }
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_some() => {
            return Err(CodecError::malformed(format!(
                "second root element <{}>",
                node.name
            )))
        }
        None => *root = Some(node),
    }
    Ok(())
}

fn append_text(stack: &mut [Node], text: &str) -> Result<(), CodecError> {
    match stack.last_mut() {
        Some(node) => node.text.push_str(text),
        None if text.trim().is_empty() => {}
        None => return Err(CodecError::malformed("text outside the root element")),
    }
    Ok(())
}

/// Namespace bound to the root element: `xmlns` for an unprefixed root,
/// `xmlns:<prefix>` for a prefixed one.
fn root_namespace(element: &BytesStart) -> Result<String, CodecError> {
    let name = element.name();
    let binding = match name.as_ref().iter().position(|b| *b == b':') {
        Some(colon) => [b"xmlns:".as_slice(), &name.as_ref()[..colon]].concat(),
        None => b"xmlns".to_vec(),
    };

    for attr in element.attributes() {
        let attr = attr.map_err(|e| CodecError::malformed(format!("invalid attribute: {}", e)))?;
        if attr.key.as_ref() == binding.as_slice() {
            let value = attr
                .unescape_value()
                .map_err(|e| CodecError::malformed(e.to_string()))?;
            return Ok(value.into_owned());
        }
    }
    Ok(String::new())
}

struct Decoder {
    version: CapVersion,
    diagnostics: DiagnosticList,
}

impl Decoder {
    fn alert(&mut self, root: &Node) -> Alert {
        let mut alert = Alert::new(self.version);

        for node in &root.children {
            let path = format!("alert.{}", node.name);
            match node.name.as_str() {
                "identifier" => alert.identifier = node.text.clone(),
                "sender" => alert.sender = node.text.clone(),
                "password" => alert.password = Some(node.text.clone()),
                "sent" => alert.sent = self.datetime(node, &path),
                "status" => alert.status = self.enum_value(node, &path),
                "msgType" => alert.msg_type = self.enum_value(node, &path),
                "source" => alert.source = Some(node.text.clone()),
                "scope" => alert.scope = self.enum_value(node, &path),
                "restriction" => alert.restriction = Some(node.text.clone()),
                "addresses" => alert.addresses = Group::parse(&node.text),
                "code" => alert.code.extend(Group::parse(&node.text)),
                "note" => alert.note = Some(node.text.clone()),
                "references" => alert.references = Group::parse(&node.text),
                "incidents" => alert.incidents = Group::parse(&node.text),
                "info" => {
                    let path = format!("alert.info[{}]", alert.info.len());
                    let info = self.info(node, &path);
                    alert.info.push(info);
                }
                _ => self.unknown(node, "alert"),
            }
        }

        alert
    }

    fn info(&mut self, parent: &Node, base: &str) -> Info {
        let mut info = Info::new(String::new());
        let mut categories = 0;
        let mut responses = 0;

        for node in &parent.children {
            let path = format!("{}.{}", base, node.name);
            match node.name.as_str() {
                "language" => info.language = node.text.clone(),
                "category" => {
                    let path = format!("{}[{}]", path, categories);
                    categories += 1;
                    info.category
                        .extend(self.enum_value::<Category>(node, &path));
                }
                "event" => info.event = node.text.clone(),
                "responseType" => {
                    let path = format!("{}[{}]", path, responses);
                    responses += 1;
                    info.response_type
                        .extend(self.enum_value::<ResponseType>(node, &path));
                }
                "urgency" => info.urgency = self.enum_value(node, &path),
                "severity" => info.severity = self.enum_value(node, &path),
                "certainty" => info.certainty = self.enum_value(node, &path),
                "audience" => info.audience = Some(node.text.clone()),
                "eventCode" => {
                    let path = format!("{}[{}]", path, info.event_code.len());
                    info.event_code.extend(self.value_pair(node, &path));
                }
                "effective" => info.effective = self.datetime(node, &path),
                "onset" => info.onset = self.datetime(node, &path),
                "expires" => info.expires = self.datetime(node, &path),
                "senderName" => info.sender_name = Some(node.text.clone()),
                "headline" => info.headline = Some(node.text.clone()),
                "description" => info.description = Some(node.text.clone()),
                "instruction" => info.instruction = Some(node.text.clone()),
                "web" => info.web = Some(node.text.clone()),
                "contact" => info.contact = Some(node.text.clone()),
                "parameter" => {
                    let path = format!("{}[{}]", path, info.parameter.len());
                    info.parameter.extend(self.value_pair(node, &path));
                }
                "resource" => {
                    let path = format!("{}[{}]", path, info.resource.len());
                    let resource = self.resource(node, &path);
                    info.resource.push(resource);
                }
                "area" => {
                    let path = format!("{}[{}]", path, info.area.len());
                    let area = self.area(node, &path);
                    info.area.push(area);
                }
                _ => self.unknown(node, base),
            }
        }

        info
    }

    fn resource(&mut self, parent: &Node, base: &str) -> Resource {
        let mut resource = Resource::default();

        for node in &parent.children {
            let path = format!("{}.{}", base, node.name);
            match node.name.as_str() {
                "resourceDesc" => resource.resource_desc = node.text.clone(),
                "mimeType" => resource.mime_type = Some(node.text.clone()),
                "size" => resource.size = self.number(node, &path),
                "uri" => resource.uri = Some(node.text.clone()),
                "derefUri" => resource.deref_uri = Some(node.text.clone()),
                "digest" => resource.digest = Some(node.text.clone()),
                _ => self.unknown(node, base),
            }
        }

        resource
    }

    fn area(&mut self, parent: &Node, base: &str) -> Area {
        let mut area = Area::default();
        let mut polygons = 0;
        let mut circles = 0;

        for node in &parent.children {
            let path = format!("{}.{}", base, node.name);
            match node.name.as_str() {
                "areaDesc" => area.area_desc = node.text.clone(),
                "polygon" => {
                    let path = format!("{}[{}]", path, polygons);
                    polygons += 1;
                    area.polygon.extend(self.polygon(node, &path));
                }
                "circle" => {
                    let path = format!("{}[{}]", path, circles);
                    circles += 1;
                    area.circle.extend(self.circle(node, &path));
                }
                "geocode" => {
                    let path = format!("{}[{}]", path, area.geocode.len());
                    area.geocode.extend(self.value_pair(node, &path));
                }
                "altitude" => area.altitude = self.number(node, &path),
                "ceiling" => area.ceiling = self.number(node, &path),
                _ => self.unknown(node, base),
            }
        }

        area
    }

    fn enum_value<T: CapEnum>(&mut self, node: &Node, path: &str) -> Option<T> {
        match enums::decode::<T>(node.text.trim(), self.version) {
            Ok(value) => Some(value),
            Err(e) => {
                let rule_id = match e {
                    EnumError::UnknownToken { .. } => "enum.unknown-token",
                    EnumError::NotInVersion { .. } => "enum.unsupported-in-version",
                };
                self.diagnostics
                    .error(DiagnosticKind::InvalidEnumValue, rule_id, path, e.to_string());
                None
            }
        }
    }

    fn datetime(&mut self, node: &Node, path: &str) -> Option<CapDateTime> {
        match validate::parse_datetime(node.text.trim()) {
            Ok(value) => Some(value),
            Err(message) => {
                self.diagnostics
                    .error(DiagnosticKind::InvalidFormat, "datetime.format", path, message);
                None
            }
        }
    }

    fn number<T: FromStr>(&mut self, node: &Node, path: &str) -> Option<T> {
        match node.text.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.diagnostics.error(
                    DiagnosticKind::InvalidFormat,
                    "number.format",
                    path,
                    format!("'{}' is not a valid number", node.text),
                );
                None
            }
        }
    }

    fn value_pair(&mut self, node: &Node, path: &str) -> Option<ValuePair> {
        match self.version.profile().value_pair_style {
            ValuePairStyle::Elements => {
                let child = |name: &str| {
                    node.children
                        .iter()
                        .find(|c| c.name == name)
                        .map(|c| c.text.clone())
                        .unwrap_or_default()
                };
                Some(ValuePair::new(child("valueName"), child("value")))
            }
            ValuePairStyle::InlineText => match node.text.split_once('=') {
                Some((name, value)) => Some(ValuePair::new(name, value)),
                None => {
                    self.diagnostics.error(
                        DiagnosticKind::InvalidFormat,
                        "value-pair.format",
                        path,
                        format!("'{}' is not of the form valueName=value", node.text),
                    );
                    None
                }
            },
        }
    }

    fn polygon(&mut self, node: &Node, path: &str) -> Option<Polygon> {
        let points: Option<Vec<Point>> = node.text.split_whitespace().map(parse_point).collect();
        match points {
            Some(points) => Some(Polygon::new(points)),
            None => {
                self.diagnostics.error(
                    DiagnosticKind::InvalidFormat,
                    "polygon.format",
                    path,
                    "polygon must be a space-separated list of lat,lon pairs",
                );
                None
            }
        }
    }

    fn circle(&mut self, node: &Node, path: &str) -> Option<Circle> {
        let circle = parse_circle(&node.text);
        if circle.is_none() {
            self.diagnostics.error(
                DiagnosticKind::InvalidFormat,
                "circle.format",
                path,
                format!("'{}' is not of the form 'lat,lon radius'", node.text),
            );
        }
        circle
    }

    fn unknown(&mut self, node: &Node, parent: &str) {
        self.diagnostics.warning(
            DiagnosticKind::InvalidStructure,
            "xml.unknown-element",
            format!("{}.{}", parent, node.name),
            format!("unknown element <{}> ignored", node.name),
        );
    }
}

fn parse_point(text: &str) -> Option<Point> {
    let (lat, lon) = text.split_once(',')?;
    Some(Point::new(lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

fn parse_circle(text: &str) -> Option<Circle> {
    let mut parts = text.split_whitespace();
    let center = parse_point(parts.next()?)?;
    let radius = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Circle::new(center, radius))
}
