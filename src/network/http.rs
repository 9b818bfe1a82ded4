use super::cancel::CancellationToken;
use super::transport::{
    Transport, TransportCallback, TransportError, TransportOutcome, TransportRequest,
    TransportResponse,
};
use crate::error::{NetworkingError, Result};
use crate::request::{Headers, Verb};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, instrument, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Live transport: runs each exchange with `reqwest` as a task on a tokio
/// runtime, racing it against the request's cancellation token.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    runtime: Handle,
}

impl HttpTransport {
    pub fn new(runtime: Handle, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, runtime })
    }

    /// Build a transport on the runtime the caller is currently inside.
    pub fn from_current(timeout: Duration) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| NetworkingError::NoRuntime(e.to_string()))?;
        Self::new(runtime, timeout)
    }

    fn method(verb: Verb) -> reqwest::Method {
        match verb {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Put => reqwest::Method::PUT,
            Verb::Patch => reqwest::Method::PATCH,
            Verb::Delete => reqwest::Method::DELETE,
        }
    }

    fn classify(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::TimedOut
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }

    #[instrument(skip(client, request), fields(verb = %request.verb, url = %request.url))]
    async fn execute(client: reqwest::Client, request: TransportRequest) -> TransportOutcome {
        let mut builder = client.request(Self::method(request.verb), request.url.clone());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(Self::classify)?;
        let status = response.status().as_u16();
        let headers: Headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await.map_err(Self::classify)?.to_vec();

        debug!("Received status {} with {} byte body", status, body.len());
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: TransportRequest,
        cancellation: CancellationToken,
        on_complete: TransportCallback,
    ) {
        let client = self.client.clone();
        self.runtime.spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancellation.cancelled() => Err(TransportError::Cancelled),
                outcome = Self::execute(client, request) => outcome,
            };
            if let Err(e) = &outcome {
                if *e != TransportError::Cancelled {
                    warn!("HTTP request failed: {}", e);
                }
            }
            on_complete(outcome);
        });
    }
}
