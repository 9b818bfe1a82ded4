//! Scriptable transport used in place of the real network
//!
//! Responses are produced by a responder closure; delivery can happen
//! inline inside `send`, later on a background thread, only when the
//! test releases it, or never.

use networking::network::{
    CancellationToken, Transport, TransportCallback, TransportError, TransportOutcome,
    TransportRequest, TransportResponse,
};
use networking::Headers;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

type Responder = Box<dyn Fn(&TransportRequest) -> TransportResponse + Send + Sync>;

/// When the mock hands its response back
#[derive(Debug, Clone, Copy)]
pub enum Delivery {
    /// Call back before `send` returns
    Inline,
    /// Call back from a new thread after the delay, or earlier with
    /// `Cancelled` if the token fires first
    Thread(Duration),
    /// Keep the callback until `release_all` is called
    Hold,
    /// Discard the callback without calling it
    Drop,
}

struct Held {
    request: TransportRequest,
    token: CancellationToken,
    callback: TransportCallback,
}

pub struct MockTransport {
    responder: Responder,
    delivery: Delivery,
    sent: Mutex<Vec<TransportRequest>>,
    held: Mutex<Vec<Held>>,
}

impl MockTransport {
    pub fn new<F>(delivery: Delivery, responder: F) -> Arc<Self>
    where
        F: Fn(&TransportRequest) -> TransportResponse + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            delivery,
            sent: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
        })
    }

    /// Behaves like httpbin.org: known endpoints echo the request as JSON,
    /// anything else is a 404.
    pub fn httpbin(delivery: Delivery) -> Arc<Self> {
        Self::new(delivery, httpbin_response)
    }

    pub fn sent(&self) -> Vec<TransportRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn held_count(&self) -> usize {
        self.held.lock().unwrap().len()
    }

    /// Deliver every held request, reporting `Cancelled` for any whose
    /// token has fired. Returns how many callbacks ran.
    pub fn release_all(&self) -> usize {
        let held: Vec<Held> = self.held.lock().unwrap().drain(..).collect();
        let count = held.len();
        for entry in held {
            let outcome = if entry.token.is_cancelled() {
                Err(TransportError::Cancelled)
            } else {
                Ok((self.responder)(&entry.request))
            };
            (entry.callback)(outcome);
        }
        count
    }

    /// Deliver every held request with the same outcome, ignoring tokens.
    pub fn release_all_with(&self, outcome: TransportOutcome) -> usize {
        let held: Vec<Held> = self.held.lock().unwrap().drain(..).collect();
        let count = held.len();
        for entry in held {
            (entry.callback)(outcome.clone());
        }
        count
    }
}

impl Transport for MockTransport {
    fn send(
        &self,
        request: TransportRequest,
        cancellation: CancellationToken,
        on_complete: TransportCallback,
    ) {
        self.sent.lock().unwrap().push(request.clone());
        match self.delivery {
            Delivery::Inline => on_complete(Ok((self.responder)(&request))),
            Delivery::Thread(delay) => {
                let response = (self.responder)(&request);
                thread::spawn(move || {
                    let step = Duration::from_millis(1);
                    let mut waited = Duration::ZERO;
                    while waited < delay {
                        if cancellation.is_cancelled() {
                            on_complete(Err(TransportError::Cancelled));
                            return;
                        }
                        thread::sleep(step);
                        waited += step;
                    }
                    on_complete(Ok(response));
                });
            }
            Delivery::Hold => self.held.lock().unwrap().push(Held {
                request,
                token: cancellation,
                callback: on_complete,
            }),
            Delivery::Drop => drop(on_complete),
        }
    }
}

pub fn json_response(status: u16, body: Value) -> TransportResponse {
    let mut headers = Headers::new();
    headers.insert("Content-Type", "application/json");
    headers.insert("Connection", "keep-alive");
    TransportResponse {
        status,
        headers,
        body: body.to_string().into_bytes(),
    }
}

fn httpbin_response(request: &TransportRequest) -> TransportResponse {
    let endpoint = request.url.path().trim_start_matches('/');
    let known = ["get", "post", "put", "patch", "delete"];
    if !known.contains(&endpoint) {
        return json_response(404, json!({}));
    }

    let args: Map<String, Value> = request
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect();
    let headers: Map<String, Value> = request
        .headers
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    let body = request
        .body
        .as_ref()
        .and_then(|b| serde_json::from_slice::<Value>(b).ok())
        .unwrap_or(Value::Null);

    json_response(
        200,
        json!({
            "url": request.url.as_str(),
            "args": args,
            "headers": headers,
            "json": body,
        }),
    )
}
