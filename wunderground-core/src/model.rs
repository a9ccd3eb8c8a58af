use serde_json::Value;
use xmltree::{Element, EmitterConfig};

use crate::{Error, ResponseFormat, Result};

/// A decoded API response.
///
/// The whole document is kept, not just the sub-tree of the requested
/// feature, so callers can read every sibling the API sends back.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Xml(Element),
}

impl ResponseBody {
    /// Parse a raw response body and surface any error the API reports in it.
    pub fn parse(format: ResponseFormat, body: &str) -> Result<Self> {
        let parsed = match format {
            ResponseFormat::Json => {
                let value: Value = serde_json::from_str(body)
                    .map_err(|e| Error::MalformedResponse(format!("invalid JSON: {e}")))?;
                ResponseBody::Json(value)
            }
            ResponseFormat::Xml => {
                let root = Element::parse(body.as_bytes())
                    .map_err(|e| Error::MalformedResponse(format!("invalid XML: {e}")))?;
                ResponseBody::Xml(root)
            }
        };

        match parsed.api_error() {
            Some(description) => Err(Error::Api(description)),
            None => Ok(parsed),
        }
    }

    /// The description of an error reported in the payload, if any.
    ///
    /// JSON carries it at `response.error.description`, XML as
    /// `<error><description>` directly under the document root. An error
    /// block without a description is not treated as an error.
    pub fn api_error(&self) -> Option<String> {
        match self {
            ResponseBody::Json(value) => {
                let description = value.get("response")?.get("error")?.get("description")?;
                match description {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                }
            }
            ResponseBody::Xml(root) => root
                .get_child("error")?
                .get_child("description")?
                .get_text()
                .map(|text| text.into_owned()),
        }
    }

    pub fn format(&self) -> ResponseFormat {
        match self {
            ResponseBody::Json(_) => ResponseFormat::Json,
            ResponseBody::Xml(_) => ResponseFormat::Xml,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Xml(_) => None,
        }
    }

    pub fn as_xml(&self) -> Option<&Element> {
        match self {
            ResponseBody::Json(_) => None,
            ResponseBody::Xml(root) => Some(root),
        }
    }

    /// Render the body for humans: indented JSON or indented XML.
    pub fn to_pretty_string(&self) -> Result<String> {
        match self {
            ResponseBody::Json(value) => serde_json::to_string_pretty(value)
                .map_err(|e| Error::MalformedResponse(format!("cannot render JSON: {e}"))),
            ResponseBody::Xml(root) => {
                let mut out = Vec::new();
                let config = EmitterConfig::new().perform_indent(true);
                root.write_with_config(&mut out, config)
                    .map_err(|e| Error::MalformedResponse(format!("cannot render XML: {e}")))?;
                String::from_utf8(out)
                    .map_err(|e| Error::MalformedResponse(format!("cannot render XML: {e}")))
            }
        }
    }
}
