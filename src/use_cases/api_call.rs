use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info};

use crate::domain::errors::ApiFailure;

// Tracker state for one named operation.
#[derive(Debug)]
struct CallState<T> {
    payload: Option<T>,
    is_loading: bool,
    error_message: Option<String>,
}

// Generic tracked request: one instance per named operation, created once
// and reused across invocations. State is shared behind a mutex so
// independent observers can read it while a call is in flight.
pub struct ApiCall<T> {
    name: &'static str,
    state: Arc<Mutex<CallState<T>>>,
}

impl<T: Clone> ApiCall<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Arc::new(Mutex::new(CallState {
                payload: None,
                is_loading: false,
                error_message: None,
            })),
        }
    }

    // Performs exactly one external call, tracking pending/settled state
    // around it. Returns the payload on success and None on failure.
    // Re-invocation while a call is in flight is allowed; there is no
    // de-duplication, and the latest settlement overwrites the tracker.
    pub async fn execute<Fut>(&self, call: Fut) -> Option<T>
    where
        Fut: Future<Output = Result<T, ApiFailure>>,
    {
        {
            let mut state = self.state.lock().expect("call state mutex poisoned");
            state.is_loading = true;
            state.error_message = None;
        }
        debug!(operation = self.name, "sending request");

        let outcome = call.await;

        let mut state = self.state.lock().expect("call state mutex poisoned");
        match outcome {
            Ok(payload) => {
                info!(operation = self.name, "request succeeded");
                state.payload = Some(payload.clone());
                state.error_message = None;
                state.is_loading = false;
                Some(payload)
            }
            Err(failure) => {
                let message = failure.extracted_message();
                error!(operation = self.name, error = %failure, "request failed");
                state.payload = None;
                state.error_message = Some(message);
                state.is_loading = false;
                None
            }
        }
    }

    // Forces the tracker back to idle, discarding payload and error.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("call state mutex poisoned");
        state.payload = None;
        state.error_message = None;
        state.is_loading = false;
        debug!(operation = self.name, "tracker state has been reset");
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().expect("call state mutex poisoned").is_loading
    }

    pub fn payload(&self) -> Option<T> {
        self.state
            .lock()
            .expect("call state mutex poisoned")
            .payload
            .clone()
    }

    pub fn error_message(&self) -> Option<String> {
        self.state
            .lock()
            .expect("call state mutex poisoned")
            .error_message
            .clone()
    }
}

// OR-aggregation across independent trackers. Recomputed on every
// observation, never cached.
pub fn is_any_loading(flags: &[bool]) -> bool {
    flags.iter().any(|flag| *flag)
}
