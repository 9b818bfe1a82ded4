use crate::error::{codes, RequestError};
use crate::request::Headers;
use serde_json::Value;

/// What a completion receives. Exactly one of payload or error is
/// meaningful: `payload()` is `None` on error, `error()` is `None` on success.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResult {
    pub headers: Headers,
    /// HTTP status, or `None` when the request never produced one
    /// (cancellation, connection failure).
    pub status: Option<u16>,
    pub result: Result<Value, RequestError>,
}

impl CompletionResult {
    pub fn success(payload: Value, headers: Headers, status: u16) -> Self {
        Self {
            headers,
            status: Some(status),
            result: Ok(payload),
        }
    }

    pub fn failure(error: RequestError, headers: Headers, status: Option<u16>) -> Self {
        Self {
            headers,
            status,
            result: Err(error),
        }
    }

    pub fn cancelled() -> Self {
        Self::failure(RequestError::cancelled(), Headers::new(), None)
    }

    /// Build the result for a finished HTTP exchange: 2xx bodies are decoded
    /// as JSON, anything else becomes an error carrying the status code.
    pub fn from_http(status: u16, headers: Headers, body: &[u8]) -> Self {
        if !(200..300).contains(&status) {
            return Self::failure(RequestError::from_status(status), headers, Some(status));
        }
        match decode_body(body) {
            Ok(payload) => Self::success(payload, headers, status),
            Err(error) => Self::failure(error, headers, Some(status)),
        }
    }

    /// Decoded payload, absent on error or when the body was empty.
    pub fn payload(&self) -> Option<&Value> {
        match &self.result {
            Ok(Value::Null) | Err(_) => None,
            Ok(value) => Some(value),
        }
    }

    pub fn error(&self) -> Option<&RequestError> {
        self.result.as_ref().err()
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Decode a response body. Empty bodies decode to `Value::Null`.
pub fn decode_body(body: &[u8]) -> Result<Value, RequestError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| {
        RequestError::new(
            codes::CANNOT_PARSE_RESPONSE,
            format!("response body is not valid JSON: {}", e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_payload() {
        let result = CompletionResult::from_http(200, Headers::new(), br#"{"name":"Elvis"}"#);
        assert_eq!(result.payload(), Some(&json!({"name": "Elvis"})));
        assert!(result.error().is_none());
    }

    #[test]
    fn test_error_status_has_no_payload() {
        let result = CompletionResult::from_http(404, Headers::new(), br#"{"detail":"missing"}"#);
        assert!(result.payload().is_none());
        assert_eq!(result.error().map(|e| e.code), Some(404));
        assert_eq!(result.status, Some(404));
    }

    #[test]
    fn test_empty_body_is_absent_payload() {
        let result = CompletionResult::from_http(204, Headers::new(), b"");
        assert!(result.is_success());
        assert!(result.payload().is_none());
    }

    #[test]
    fn test_invalid_json_body() {
        let result = CompletionResult::from_http(200, Headers::new(), b"<html>");
        assert_eq!(result.error().map(|e| e.code), Some(codes::CANNOT_PARSE_RESPONSE));
    }

    #[test]
    fn test_cancelled_result() {
        let result = CompletionResult::cancelled();
        assert!(result.payload().is_none());
        assert!(result.error().map(RequestError::is_cancelled).unwrap_or(false));
        assert_eq!(result.status, None);
    }
}
