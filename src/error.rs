use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Failures talking to the Messenger send API.
#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("send API returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Failures talking to the search index. The `Display` text is what callers
/// see in the error envelope.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search service unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("search service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid search response: {0}")]
    InvalidResponse(String),
}
