use super::cancel::CancellationToken;
use crate::request::{normalize_path, RequestId, Verb};
use crate::response::CompletionResult;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info};

/// Callback invoked with the outcome of a request.
pub type Completion = Box<dyn FnOnce(CompletionResult) + Send + 'static>;

struct PendingRequest {
    verb: Verb,
    path: String,
    token: CancellationToken,
    completion: Completion,
    cancelled: bool,
}

/// Tracks in-flight requests. Removal from the map is the single point that
/// decides what a completion receives; whoever removes the entry fires it,
/// any later delivery is a no-op.
///
/// Cancelling only marks the entry and signals its token. The completion
/// fires when the transport next reports for that request, always with a
/// cancellation error, so it never runs inside the `cancel` call.
#[derive(Default)]
pub struct RequestRegistry {
    pending: Mutex<HashMap<RequestId, PendingRequest>>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a pending request. The identifier is usable for cancellation
    /// as soon as this returns.
    pub fn register(
        &self,
        verb: Verb,
        path: &str,
        completion: Completion,
    ) -> (RequestId, CancellationToken) {
        let id = RequestId::new();
        let token = CancellationToken::new();
        let entry = PendingRequest {
            verb,
            path: normalize_path(path),
            token: token.clone(),
            completion,
            cancelled: false,
        };
        debug!("Registered {} {} as request {}", verb, entry.path, id);
        self.pending.lock().insert(id, entry);
        (id, token)
    }

    /// Deliver a result. A request cancelled earlier receives a cancellation
    /// error instead of `result`. Returns false if the request was already
    /// completed.
    pub fn complete(&self, id: &RequestId, result: CompletionResult) -> bool {
        let entry = self.pending.lock().remove(id);
        match entry {
            Some(entry) => {
                let result = if entry.cancelled {
                    debug!("Request {} ({} {}) finished as cancelled", id, entry.verb, entry.path);
                    CompletionResult::cancelled()
                } else {
                    debug!("Completing request {} ({} {})", id, entry.verb, entry.path);
                    result
                };
                // Runs outside the lock so a completion may issue or cancel requests.
                (entry.completion)(result);
                true
            }
            None => {
                debug!("Ignoring completion for request {}: no longer pending", id);
                false
            }
        }
    }

    /// Cancel one request: mark it and signal its token. Unknown, finished
    /// or already cancelled identifiers are ignored.
    pub fn cancel(&self, id: &RequestId) -> bool {
        let token = {
            let mut pending = self.pending.lock();
            match pending.get_mut(id) {
                Some(entry) if !entry.cancelled => {
                    entry.cancelled = true;
                    info!("Cancelled request {} ({} {})", id, entry.verb, entry.path);
                    entry.token.clone()
                }
                _ => return false,
            }
        };
        token.cancel();
        true
    }

    /// Cancel every pending request for `verb` on `path`, ignoring any query
    /// string. Returns the number of requests newly cancelled.
    pub fn cancel_path(&self, verb: Verb, path: &str) -> usize {
        let path = normalize_path(path);
        let tokens = self.mark_cancelled(|entry| entry.verb == verb && entry.path == path);
        if !tokens.is_empty() {
            info!("Cancelled {} pending {} request(s) to {}", tokens.len(), verb, path);
        }
        Self::signal(tokens)
    }

    /// Cancel everything still pending.
    pub fn cancel_all(&self) -> usize {
        Self::signal(self.mark_cancelled(|_| true))
    }

    fn mark_cancelled<F>(&self, matches: F) -> Vec<CancellationToken>
    where
        F: Fn(&PendingRequest) -> bool,
    {
        let mut pending = self.pending.lock();
        let tokens = pending
            .values_mut()
            .filter(|entry| !entry.cancelled && matches(entry))
            .map(|entry| {
                entry.cancelled = true;
                entry.token.clone()
            })
            .collect();
        tokens
    }

    fn signal(tokens: Vec<CancellationToken>) -> usize {
        for token in &tokens {
            token.cancel();
        }
        tokens.len()
    }

    pub fn is_cancelled(&self, id: &RequestId) -> bool {
        self.pending
            .lock()
            .get(id)
            .map(|entry| entry.cancelled)
            .unwrap_or(false)
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.pending.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Headers;
    use serde_json::json;
    use std::sync::{Arc, Mutex as StdMutex};

    fn recording() -> (Arc<StdMutex<Vec<CompletionResult>>>, Completion) {
        let results = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&results);
        let completion: Completion = Box::new(move |result| sink.lock().unwrap().push(result));
        (results, completion)
    }

    #[test]
    fn test_complete_fires_once() {
        let registry = RequestRegistry::new();
        let (results, completion) = recording();
        let (id, _token) = registry.register(Verb::Get, "/get", completion);
        assert!(registry.contains(&id));

        let ok = CompletionResult::success(json!({"ok": true}), Headers::new(), 200);
        assert!(registry.complete(&id, ok.clone()));
        assert!(!registry.complete(&id, ok));
        assert!(!registry.cancel(&id));

        assert_eq!(results.lock().unwrap().len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_cancel_defers_completion_until_reported() {
        let registry = RequestRegistry::new();
        let (results, completion) = recording();
        let (id, token) = registry.register(Verb::Delete, "/delete", completion);

        assert!(registry.cancel(&id));
        assert!(token.is_cancelled());
        assert!(registry.is_cancelled(&id));
        assert!(results.lock().unwrap().is_empty());
        assert!(!registry.cancel(&id));

        // Whatever the transport reports afterwards, the caller sees a cancellation.
        assert!(registry.complete(
            &id,
            CompletionResult::success(json!(null), Headers::new(), 200)
        ));
        assert!(!registry.complete(&id, CompletionResult::cancelled()));

        let results = results.lock().unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].error().unwrap().is_cancelled());
    }

    #[test]
    fn test_cancel_unknown_is_noop() {
        let registry = RequestRegistry::new();
        assert!(!registry.cancel(&RequestId::new()));
    }

    #[test]
    fn test_cancel_path_matches_verb_and_path_only() {
        let registry = RequestRegistry::new();
        let (_, a) = registry.register(Verb::Delete, "/delete", Box::new(|_| {}));
        let (_, b) = registry.register(Verb::Delete, "/delete?userId=25", Box::new(|_| {}));
        let (get_id, c) = registry.register(Verb::Get, "/delete", Box::new(|_| {}));

        assert_eq!(registry.cancel_path(Verb::Delete, "/delete"), 2);
        assert_eq!(registry.cancel_path(Verb::Delete, "/delete"), 0);
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
        assert!(!c.is_cancelled());
        assert!(!registry.is_cancelled(&get_id));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_cancel_while_holding_lock_used_by_completion() {
        let registry = RequestRegistry::new();
        let shared = Arc::new(StdMutex::new(0));
        let inner = Arc::clone(&shared);
        let (id, _) = registry.register(
            Verb::Get,
            "/locked",
            Box::new(move |_| {
                *inner.lock().unwrap() += 1;
            }),
        );

        {
            let _guard = shared.lock().unwrap();
            assert!(registry.cancel(&id));
        }
        registry.complete(&id, CompletionResult::cancelled());
        assert_eq!(*shared.lock().unwrap(), 1);
    }

    #[test]
    fn test_completion_may_reenter_registry() {
        let registry = Arc::new(RequestRegistry::new());
        let inner = Arc::clone(&registry);
        let (id, _) = registry.register(
            Verb::Get,
            "/outer",
            Box::new(move |_| {
                inner.register(Verb::Get, "/inner", Box::new(|_| {}));
            }),
        );

        assert!(registry.cancel(&id));
        assert!(registry.complete(&id, CompletionResult::cancelled()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_racing_completion_and_cancel_fire_once() {
        for _ in 0..100 {
            let registry = Arc::new(RequestRegistry::new());
            let (results, completion) = recording();
            let (id, _) = registry.register(Verb::Get, "/race", completion);

            let completer = {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry.complete(&id, CompletionResult::success(json!(1), Headers::new(), 200))
                })
            };
            let canceller = {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.cancel(&id))
            };

            assert!(completer.join().unwrap());
            let cancelled = canceller.join().unwrap();

            let results = results.lock().unwrap();
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].is_success(), !cancelled);
        }
    }
}
