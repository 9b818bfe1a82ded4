use super::types::Parameters;
use crate::error::{codes, RequestError};
use reqwest::Url;
use serde_json::Value;
use tracing::trace;

/// Canonical form of a path for fake lookup and cancel-by-path matching.
/// Query strings never take part in matching.
pub fn normalize_path(path: &str) -> String {
    let without_query = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = without_query.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Join the base URL and a path with exactly one slash. Absolute URLs
/// passed as the path are taken verbatim.
pub fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// Render a parameter value the way it appears in a query string.
pub fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Build the URL a request goes to. When `encode_parameters` is set the
/// parameters are appended as a query, in key order.
pub fn compose_url(
    base_url: &str,
    path: &str,
    parameters: &Parameters,
    encode_parameters: bool,
) -> std::result::Result<Url, RequestError> {
    let joined = join_url(base_url, path);
    let mut url = Url::parse(&joined)
        .map_err(|e| RequestError::new(codes::BAD_URL, format!("invalid URL '{}': {}", joined, e)))?;

    if encode_parameters && !parameters.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in parameters {
            pairs.append_pair(key, &query_value(value));
        }
    }

    trace!("Composed URL {}", url);
    Ok(url)
}
