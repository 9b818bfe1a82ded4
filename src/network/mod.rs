pub mod cancel;
pub mod client;
pub mod http;
pub mod registry;
pub mod transport;
pub mod verbs;

pub use cancel::CancellationToken;
pub use client::Networking;
pub use http::{HttpTransport, DEFAULT_TIMEOUT};
pub use registry::{Completion, RequestRegistry};
pub use transport::{
    into_completion, Transport, TransportCallback, TransportError, TransportOutcome,
    TransportRequest, TransportResponse,
};
