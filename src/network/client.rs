use super::http::HttpTransport;
use super::registry::{Completion, RequestRegistry};
use super::transport::{into_completion, Transport, TransportOutcome, TransportRequest};
use crate::error::{codes, NetworkingError, RequestError, Result};
use crate::fake::{FakePayload, FakeResponse, FixtureLocator, ResponseStore};
use crate::request::{compose_url, Headers, Parameters, RequestId, Verb};
use crate::response::CompletionResult;
use parking_lot::Mutex;
use reqwest::Url;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// HTTP client that issues verb-based requests against a base URL.
///
/// Requests whose verb and path match a programmed fake complete
/// synchronously, before `request` returns, and never touch the transport.
/// All other requests are registered as pending and handed to the transport;
/// their completion fires exactly once, when the transport reports back. A
/// request cancelled before that still waits for the report and then
/// receives a [`codes::CANCELLED`] error. A transport that discards a request
/// without reporting completes it with [`codes::UNKNOWN`].
///
/// In testing mode live requests also block the caller until their
/// completion has run. Testing mode starts off for clients built with
/// [`new`](Self::new) or [`with_http`](Self::with_http); use
/// [`for_testing`](Self::for_testing) or [`set_testing_mode`](Self::set_testing_mode)
/// to turn it on. Blocking mode must not be used from a tokio worker thread
/// that the transport itself needs.
pub struct Networking {
    base_url: String,
    transport: Arc<dyn Transport>,
    registry: Arc<RequestRegistry>,
    fakes: Mutex<ResponseStore>,
    header_fields: Mutex<Headers>,
    testing_mode: AtomicBool,
}

impl Networking {
    /// Create a client that sends live requests through `transport`.
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Result<Self> {
        let base_url = base_url.into();
        Url::parse(&base_url).map_err(|e| NetworkingError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            base_url,
            transport,
            registry: Arc::new(RequestRegistry::new()),
            fakes: Mutex::new(ResponseStore::new()),
            header_fields: Mutex::new(Headers::new()),
            testing_mode: AtomicBool::new(false),
        })
    }

    /// Create a client that starts in testing mode, so live requests return
    /// only after their completion has run.
    pub fn for_testing(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Result<Self> {
        let networking = Self::new(base_url, transport)?;
        networking.set_testing_mode(true);
        Ok(networking)
    }

    /// Create a client backed by [`HttpTransport`] on the given runtime.
    pub fn with_http(base_url: impl Into<String>, runtime: Handle, timeout: Duration) -> Result<Self> {
        let transport = HttpTransport::new(runtime, timeout)?;
        Self::new(base_url, Arc::new(transport))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_testing_mode(&self, enabled: bool) {
        self.testing_mode.store(enabled, Ordering::SeqCst);
    }

    /// Make live requests fire-and-forget again.
    pub fn disable_testing_mode(&self) {
        self.set_testing_mode(false);
    }

    pub fn is_testing_mode(&self) -> bool {
        self.testing_mode.load(Ordering::SeqCst)
    }

    /// Add a header sent with every live request.
    pub fn set_header_field(&self, name: impl Into<String>, value: impl Into<String>) {
        self.header_fields.lock().insert(name, value);
    }

    pub fn header_fields(&self) -> Headers {
        self.header_fields.lock().clone()
    }

    /// URL a request for `path` with `parameters` is sent to.
    pub fn url(&self, verb: Verb, path: &str, parameters: &Parameters) -> std::result::Result<Url, RequestError> {
        compose_url(&self.base_url, path, parameters, !verb.sends_body())
    }

    /// Issue a request. The returned identifier can be passed to
    /// [`cancel`](Self::cancel) at any time.
    pub fn request<F>(&self, verb: Verb, path: &str, parameters: &Parameters, completion: F) -> RequestId
    where
        F: FnOnce(CompletionResult) + Send + 'static,
    {
        let block = self.is_testing_mode();
        self.dispatch(verb, path, parameters, Box::new(completion), block)
    }

    /// Issue a request whose result is delivered on a channel instead of a
    /// callback. Never blocks, regardless of testing mode.
    pub fn request_with_channel(
        &self,
        verb: Verb,
        path: &str,
        parameters: &Parameters,
    ) -> (RequestId, oneshot::Receiver<CompletionResult>) {
        let (tx, rx) = oneshot::channel();
        let id = self.dispatch(
            verb,
            path,
            parameters,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
            false,
        );
        (id, rx)
    }

    /// Issue a request and wait for its result.
    pub async fn fetch(&self, verb: Verb, path: &str, parameters: &Parameters) -> CompletionResult {
        let (_, rx) = self.request_with_channel(verb, path, parameters);
        rx.await.unwrap_or_else(|_| CompletionResult::cancelled())
    }

    fn dispatch(
        &self,
        verb: Verb,
        path: &str,
        parameters: &Parameters,
        completion: Completion,
        block: bool,
    ) -> RequestId {
        let fake = self.fakes.lock().lookup(verb, path).cloned();
        if let Some(fake) = fake {
            let id = RequestId::new();
            debug!("Answering {} {} from fake response (request {})", verb, path, id);
            completion(fake.resolve());
            return id;
        }

        let request = match self.build_request(verb, path, parameters) {
            Ok(request) => request,
            Err(error) => {
                let id = RequestId::new();
                warn!("Could not build {} {}: {}", verb, path, error);
                completion(CompletionResult::failure(error, Headers::new(), None));
                return id;
            }
        };

        let (completion, done) = if block {
            let (tx, rx) = std::sync::mpsc::channel();
            let wrapped: Completion = Box::new(move |result| {
                completion(result);
                let _ = tx.send(());
            });
            (wrapped, Some(rx))
        } else {
            (completion, None)
        };

        let (id, token) = self.registry.register(verb, path, completion);
        debug!("Sending {} {} as request {}", verb, request.url, id);

        let report = TransportReport {
            registry: Arc::clone(&self.registry),
            id,
            delivered: false,
        };
        self.transport
            .send(request, token, Box::new(move |outcome| report.deliver(outcome)));

        if let Some(done) = done {
            let _ = done.recv();
        }
        id
    }

    fn build_request(
        &self,
        verb: Verb,
        path: &str,
        parameters: &Parameters,
    ) -> std::result::Result<TransportRequest, RequestError> {
        let url = self.url(verb, path, parameters)?;
        let mut headers = self.header_fields();

        let body = if verb.sends_body() && !parameters.is_empty() {
            let body = serde_json::to_vec(parameters).map_err(|e| {
                RequestError::new(codes::UNKNOWN, format!("failed to encode parameters: {}", e))
            })?;
            headers.insert("Content-Type", "application/json");
            Some(body)
        } else {
            None
        };

        Ok(TransportRequest {
            verb,
            url,
            headers,
            body,
        })
    }

    /// Cancel a pending request. The completion fires with a cancellation
    /// error once the transport reports, never inside this call. Unknown or
    /// finished identifiers are ignored.
    pub fn cancel(&self, id: &RequestId) -> bool {
        self.registry.cancel(id)
    }

    /// Cancel every pending `verb` request to `path`. Query strings are not
    /// considered when matching.
    pub fn cancel_path(&self, verb: Verb, path: &str) -> usize {
        self.registry.cancel_path(verb, path)
    }

    pub fn cancel_all(&self) -> usize {
        self.registry.cancel_all()
    }

    pub fn pending_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.registry.contains(id)
    }

    /// Program a response. A later fake for the same verb and path replaces it.
    pub fn register_fake(&self, response: FakeResponse) {
        info!(
            "Faking {} {} with status {}",
            response.verb, response.path, response.status_code
        );
        self.fakes.lock().register(response);
    }

    pub fn fake(&self, verb: Verb, path: &str, response: Value, status_code: u16) {
        self.register_fake(FakeResponse::new(verb, path, FakePayload::Value(response)).with_status(status_code));
    }

    pub fn fake_with_headers(&self, verb: Verb, path: &str, response: Value, status_code: u16, headers: Headers) {
        self.register_fake(
            FakeResponse::new(verb, path, FakePayload::Value(response))
                .with_status(status_code)
                .with_headers(headers),
        );
    }

    /// Program a response read from `file_name` under `locator` each time it
    /// is used.
    pub fn fake_from_file(&self, verb: Verb, path: &str, file_name: &str, locator: &FixtureLocator) {
        self.register_fake(FakeResponse::new(
            verb,
            path,
            FakePayload::Fixture {
                name: file_name.to_string(),
                locator: locator.clone(),
            },
        ));
    }

    pub fn clear_fake(&self, verb: Verb, path: &str) -> bool {
        self.fakes.lock().clear(verb, path)
    }

    pub fn clear_fakes(&self) {
        self.fakes.lock().clear_all();
    }
}

impl Drop for Networking {
    fn drop(&mut self) {
        let cancelled = self.registry.cancel_all();
        if cancelled > 0 {
            debug!("Cancelled {} pending request(s) on drop", cancelled);
        }
    }
}

/// Hands the transport's outcome to the registry. If the transport drops the
/// callback without calling it, the request is completed with an error so it
/// never stays pending.
struct TransportReport {
    registry: Arc<RequestRegistry>,
    id: RequestId,
    delivered: bool,
}

impl TransportReport {
    fn deliver(mut self, outcome: TransportOutcome) {
        self.delivered = true;
        self.registry.complete(&self.id, into_completion(outcome));
    }
}

impl Drop for TransportReport {
    fn drop(&mut self) {
        if self.delivered {
            return;
        }
        warn!("Transport dropped request {} without reporting", self.id);
        self.registry.complete(
            &self.id,
            CompletionResult::failure(
                RequestError::new(codes::UNKNOWN, "transport dropped request"),
                Headers::new(),
                None,
            ),
        );
    }
}
