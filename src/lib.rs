pub mod cli;
pub mod error;
pub mod fake;
pub mod network;
pub mod request;
pub mod response;

// Re-export key types for easy testing
pub use error::{codes, FixtureError, NetworkingError, RequestError};
pub use fake::{FakePayload, FakeResponse, FixtureLocator};
pub use network::{CancellationToken, HttpTransport, Networking, Transport};
pub use request::{Headers, Parameters, RequestId, Verb};
pub use response::CompletionResult;
