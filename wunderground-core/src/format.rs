use crate::Error;
use std::convert::TryFrom;

/// Response format requested from the API; doubles as the URI suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::Xml => "xml",
        }
    }

    pub const fn all() -> &'static [ResponseFormat] {
        &[ResponseFormat::Json, ResponseFormat::Xml]
    }
}

impl std::fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ResponseFormat {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "json" => Ok(ResponseFormat::Json),
            "xml" => Ok(ResponseFormat::Xml),
            _ => Err(Error::InvalidConfiguration(format!(
                "API response format must be 'json' or 'xml', got '{value}'"
            ))),
        }
    }
}
