//! Response decoding for search results.
//!
//! Both wire formats are normalised here into one shape, a list of [`Status`]
//! records, so callers never branch on the configured format.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;

/// Wire format of search responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Xml,
}

impl Format {
    /// Extension appended to the endpoint URL.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Xml => "xml",
        }
    }

    /// Whether this build can decode the format. XML needs the `xml` feature.
    pub fn is_supported(self) -> bool {
        match self {
            Format::Json => true,
            Format::Xml => cfg!(feature = "xml"),
        }
    }

    /// Returns the format, or a configuration error when this build cannot decode it.
    pub fn ensure_supported(self) -> Result<Self, SearchError> {
        if self.is_supported() {
            Ok(self)
        } else {
            Err(SearchError::Configuration(format!(
                "{} responses need the `{}` feature, which this build does not include",
                self, self
            )))
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "xml" => Ok(Format::Xml),
            other => Err(SearchError::Configuration(format!(
                "unsupported response format '{}'",
                other
            ))),
        }
    }
}

/// One search result.
///
/// The commonly used fields are typed; everything else the API returned is kept
/// in `extra`. Fields from XML responses arrive as strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<u64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub from_user: Option<String>,
    #[serde(default)]
    pub to_user: Option<String>,
    #[serde(default)]
    pub iso_language_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Status {
    /// `created_at` as UTC. The search API uses RFC 2822 dates; Atom/XML uses RFC 3339.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        DateTime::parse_from_rfc2822(raw)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| warn!("Failed to parse created_at '{}': {}", raw, e))
            .ok()
    }

    /// Any field by name, typed or not.
    pub fn get(&self, field: &str) -> Option<Value> {
        match field {
            "id" => self.id.map(Value::from),
            "text" => self.text.clone().map(Value::from),
            "from_user" => self.from_user.clone().map(Value::from),
            "to_user" => self.to_user.clone().map(Value::from),
            "iso_language_code" => self.iso_language_code.clone().map(Value::from),
            "created_at" => self.created_at.clone().map(Value::from),
            "profile_image_url" => self.profile_image_url.clone().map(Value::from),
            _ => self.extra.get(field).cloned(),
        }
    }
}

/// Accepts ids as JSON numbers or numeric strings.
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("status id {} is not a u64", n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| D::Error::custom(format!("status id '{}': {}", s, e))),
        Some(other) => Err(D::Error::custom(format!(
            "status id has unexpected type: {}",
            other
        ))),
    }
}

/// Turns response bodies into results.
pub trait ResponseDecoder: Send + Sync + fmt::Debug {
    /// Decodes a search response into its list of statuses.
    fn decode_statuses(&self, format: Format, body: &str) -> Result<Vec<Status>, SearchError>;

    /// Decodes a JSON document as a whole (used for trends).
    fn decode_document(&self, body: &str) -> Result<Value, SearchError>;
}

/// Default decoder: JSON via `serde_json`, XML via `roxmltree`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatDecoder;

impl ResponseDecoder for FormatDecoder {
    fn decode_statuses(&self, format: Format, body: &str) -> Result<Vec<Status>, SearchError> {
        let statuses = match format {
            Format::Json => decode_json_statuses(body)?,
            Format::Xml => decode_xml_statuses(body)?,
        };
        debug!("Decoded {} statuses from {} response", statuses.len(), format);
        Ok(statuses)
    }

    fn decode_document(&self, body: &str) -> Result<Value, SearchError> {
        serde_json::from_str(body).map_err(|e| SearchError::decode(Format::Json, e.to_string()))
    }
}

fn decode_json_statuses(body: &str) -> Result<Vec<Status>, SearchError> {
    let document: Value =
        serde_json::from_str(body).map_err(|e| SearchError::decode(Format::Json, e.to_string()))?;

    let results = match document.get("results") {
        Some(Value::Array(results)) => results,
        Some(_) => return Err(SearchError::decode(Format::Json, "`results` is not an array")),
        None => return Err(SearchError::decode(Format::Json, "response has no `results` field")),
    };

    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            Status::deserialize(result).map_err(|e| {
                SearchError::decode(Format::Json, format!("result {}: {}", i, e))
            })
        })
        .collect()
}

#[cfg(feature = "xml")]
fn decode_xml_statuses(body: &str) -> Result<Vec<Status>, SearchError> {
    let document = roxmltree::Document::parse(body)
        .map_err(|e| SearchError::decode(Format::Xml, e.to_string()))?;

    document
        .root_element()
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "status")
        .enumerate()
        .map(|(i, node)| match xml_element_to_value(node) {
            Value::Object(fields) => serde_json::from_value(Value::Object(fields))
                .map_err(|e| SearchError::decode(Format::Xml, format!("status {}: {}", i, e))),
            _ => Err(SearchError::decode(Format::Xml, format!("status {} has no fields", i))),
        })
        .collect()
}

#[cfg(not(feature = "xml"))]
fn decode_xml_statuses(_body: &str) -> Result<Vec<Status>, SearchError> {
    Format::Xml.ensure_supported().map(|_| Vec::new())
}

/// Leaf elements become strings; elements with children become objects, and
/// repeated child names collect into arrays.
#[cfg(feature = "xml")]
fn xml_element_to_value(node: roxmltree::Node<'_, '_>) -> Value {
    let mut children = node.children().filter(|n| n.is_element()).peekable();
    if children.peek().is_none() {
        let text: String = node
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect();
        return Value::String(text.trim().to_string());
    }

    let mut fields = Map::new();
    for child in children {
        let name = child.tag_name().name().to_string();
        let value = xml_element_to_value(child);
        match fields.get_mut(&name) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                fields.insert(name, value);
            }
        }
    }
    Value::Object(fields)
}
