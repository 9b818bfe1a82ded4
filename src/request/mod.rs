pub mod types;
pub mod url;

pub use types::{Headers, Parameters, RequestId, Verb};
pub use url::{compose_url, join_url, normalize_path, query_value};
