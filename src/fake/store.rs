use super::fixture::FixtureLocator;
use crate::error::RequestError;
use crate::request::{normalize_path, Headers, Verb};
use crate::response::CompletionResult;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Body of a programmed response.
#[derive(Debug, Clone, PartialEq)]
pub enum FakePayload {
    Value(Value),
    /// Read and parsed each time the fake is used, so a missing or broken
    /// file surfaces as an error result rather than at registration.
    Fixture { name: String, locator: FixtureLocator },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeResponse {
    pub verb: Verb,
    pub path: String,
    pub payload: FakePayload,
    pub status_code: u16,
    pub headers: Headers,
}

impl FakeResponse {
    pub fn new(verb: Verb, path: &str, payload: FakePayload) -> Self {
        Self {
            verb,
            path: normalize_path(path),
            payload,
            status_code: 200,
            headers: Headers::new(),
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Turn the programmed entry into the result a completion receives.
    pub fn resolve(&self) -> CompletionResult {
        let status = self.status_code;
        if !(200..300).contains(&status) {
            return CompletionResult::failure(
                RequestError::from_status(status),
                self.headers.clone(),
                Some(status),
            );
        }

        match &self.payload {
            FakePayload::Value(value) => {
                CompletionResult::success(value.clone(), self.headers.clone(), status)
            }
            FakePayload::Fixture { name, locator } => match locator.load_json(name) {
                Ok(value) => CompletionResult::success(value, self.headers.clone(), status),
                Err(e) => {
                    warn!("Fake {} {} could not load fixture: {}", self.verb, self.path, e);
                    CompletionResult::failure(e.into(), self.headers.clone(), None)
                }
            },
        }
    }
}

/// Programmed responses keyed by verb and normalized path.
#[derive(Debug, Default)]
pub struct ResponseStore {
    entries: HashMap<(Verb, String), FakeResponse>,
}

impl ResponseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fake, replacing any earlier one for the same verb and path.
    pub fn register(&mut self, response: FakeResponse) {
        let key = (response.verb, response.path.clone());
        if self.entries.insert(key, response).is_some() {
            debug!("Replaced existing fake response");
        }
    }

    pub fn lookup(&self, verb: Verb, path: &str) -> Option<&FakeResponse> {
        self.entries.get(&(verb, normalize_path(path)))
    }

    /// Returns whether an entry was removed.
    pub fn clear(&mut self, verb: Verb, path: &str) -> bool {
        self.entries.remove(&(verb, normalize_path(path))).is_some()
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
