//! A scripted [`RestTransport`] that records what it was asked.

use crate::core::NamingError;
use crate::rest::{RestResponse, RestTransport};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One request seen by [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub uri: String,
    pub body: Option<Value>,
}

/// Answers requests with queued responses, in order.
///
/// Once the queue is empty every request gets a 500, which makes unexpected
/// calls fail loudly.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    responses: Mutex<VecDeque<RestResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingTransport {
    pub fn new(responses: impl IntoIterator<Item = RestResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::default(),
        })
    }

    /// Requests made so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn answer(&self, method: &'static str, uri: &str, body: Option<&Value>) -> RestResponse {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                method,
                uri: uri.to_string(),
                body: body.cloned(),
            });
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front())
            .unwrap_or_else(|| RestResponse::new(500, "unexpected call"))
    }
}

impl RestTransport for RecordingTransport {
    fn get(&self, uri: &str) -> Result<RestResponse, NamingError> {
        Ok(self.answer("GET", uri, None))
    }

    fn post(&self, uri: &str, body: &Value) -> Result<RestResponse, NamingError> {
        Ok(self.answer("POST", uri, Some(body)))
    }
}
