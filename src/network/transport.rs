use super::cancel::CancellationToken;
use crate::error::{codes, RequestError};
use crate::request::{Headers, Verb};
use crate::response::CompletionResult;
use reqwest::Url;
use thiserror::Error;

/// A fully composed request handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub verb: Verb,
    pub url: Url,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

/// Raw HTTP exchange result, before any JSON decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

/// Failures that happen below HTTP, where no status was received.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    #[error("request was cancelled")]
    Cancelled,

    #[error("request timed out")]
    TimedOut,

    #[error("could not connect: {0}")]
    Connect(String),

    #[error("transport failure: {0}")]
    Other(String),
}

impl TransportError {
    pub fn code(&self) -> i64 {
        match self {
            TransportError::Cancelled => codes::CANCELLED,
            TransportError::TimedOut => codes::TIMED_OUT,
            TransportError::Connect(_) => codes::CANNOT_CONNECT_TO_HOST,
            TransportError::Other(_) => codes::UNKNOWN,
        }
    }
}

impl From<TransportError> for RequestError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Cancelled => RequestError::cancelled(),
            other => RequestError::new(other.code(), other.to_string()),
        }
    }
}

pub type TransportOutcome = Result<TransportResponse, TransportError>;

/// Callback a transport invokes once when the exchange ends.
pub type TransportCallback = Box<dyn FnOnce(TransportOutcome) + Send + 'static>;

/// Performs the actual network exchange. Implementations choose the
/// execution context `on_complete` runs on; `send` itself must not block
/// waiting for the response.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: TransportRequest,
        cancellation: CancellationToken,
        on_complete: TransportCallback,
    );
}

/// Map a transport outcome to what the caller's completion receives.
pub fn into_completion(outcome: TransportOutcome) -> CompletionResult {
    match outcome {
        Ok(response) => {
            CompletionResult::from_http(response.status, response.headers, &response.body)
        }
        Err(err) => CompletionResult::failure(err.into(), Headers::new(), None),
    }
}
