use reqwest::StatusCode;

/// Errors produced by the Weather Underground client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rejected at client construction, e.g. an unsupported response format.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The feature is neither a simple feature nor served by a dedicated method.
    #[error("unknown feature '{0}'")]
    UnknownFeature(String),

    /// The remote service reported an error in its payload.
    #[error("{0}")]
    Api(String),

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
