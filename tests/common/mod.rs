//! Common test utilities shared by the integration tests

#![allow(dead_code)]

pub mod mock_transport;

use networking::{CompletionResult, FixtureLocator, Networking};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

pub use mock_transport::{json_response, Delivery, MockTransport};

pub const BASE_URL: &str = "http://httpbin.org";

/// Upper bound for waiting on completions delivered from other threads
pub const WAIT: Duration = Duration::from_secs(5);

pub fn client(transport: Arc<MockTransport>) -> Networking {
    Networking::new(BASE_URL, transport).expect("base URL is valid")
}

/// Client whose live requests block until their completion has run
pub fn testing_client(transport: Arc<MockTransport>) -> Networking {
    Networking::for_testing(BASE_URL, transport).expect("base URL is valid")
}

pub fn fixtures() -> FixtureLocator {
    FixtureLocator::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures"))
}

/// Completion that forwards its result to the returned receiver
pub fn channel_completion() -> (
    impl FnOnce(CompletionResult) + Send + 'static,
    Receiver<CompletionResult>,
) {
    let (tx, rx) = mpsc::channel();
    let completion = move |result: CompletionResult| {
        let _ = tx.send(result);
    };
    (completion, rx)
}
