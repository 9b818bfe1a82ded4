use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes delivered in [`RequestError::code`] for failures that are not
/// HTTP statuses. Values follow the platform URL-loading error domain.
pub mod codes {
    pub const UNKNOWN: i64 = -1;
    pub const CANCELLED: i64 = -999;
    pub const BAD_URL: i64 = -1000;
    pub const TIMED_OUT: i64 = -1001;
    pub const CANNOT_CONNECT_TO_HOST: i64 = -1004;
    pub const CANNOT_PARSE_RESPONSE: i64 = -1017;
    pub const FILE_DOES_NOT_EXIST: i64 = -1100;
}

/// Faults raised while setting up a client. Per-request failures are never
/// returned this way; they arrive as a [`RequestError`] in the completion.
#[derive(Debug, Error)]
pub enum NetworkingError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("No tokio runtime available: {0}")]
    NoRuntime(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, NetworkingError>;

/// Failures while reading a file-backed fake response.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Fixture not found: {0}")]
    NotFound(String),

    #[error("Failed to read fixture {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Fixture {name} is not valid JSON: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FixtureError {
    /// Code reported to the caller when this fixture backs a fake response.
    pub fn code(&self) -> i64 {
        match self {
            FixtureError::NotFound(_) => codes::FILE_DOES_NOT_EXIST,
            FixtureError::Io { .. } => codes::UNKNOWN,
            FixtureError::Parse { .. } => codes::CANNOT_PARSE_RESPONSE,
        }
    }
}

/// Error delivered to a completion. `code` is either an HTTP status
/// (401, 404, 500...) or one of the negative constants in [`codes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestError {
    pub code: i64,
    pub message: String,
}

impl RequestError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(codes::CANCELLED, "cancelled")
    }

    /// Error for a non-2xx HTTP status, using the canonical reason phrase
    /// when one is known.
    pub fn from_status(status: u16) -> Self {
        let message = match reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
        {
            Some(reason) => reason.to_lowercase(),
            None => format!("HTTP status {}", status),
        };
        Self::new(i64::from(status), message)
    }

    pub fn is_cancelled(&self) -> bool {
        self.code == codes::CANCELLED
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for RequestError {}

impl From<FixtureError> for RequestError {
    fn from(err: FixtureError) -> Self {
        RequestError::new(err.code(), err.to_string())
    }
}
