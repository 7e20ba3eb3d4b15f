//! Canned [`Transport`] for exercising services without a live sheet.

use crate::{ApiError, SheetClient, SheetRequest, Transport};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

enum Canned {
    Reply(Value),
    Fail(String),
}

// do not add #[cfg(test)] here because it hides this module from the other crates' tests.
#[derive(Default)]
pub struct StubTransport {
    responses: Mutex<HashMap<String, Canned>>,
    requests: Mutex<Vec<SheetRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every call to `action` with `value`.
    pub fn respond(self, action: &str, value: Value) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(action.to_string(), Canned::Reply(value));
        self
    }

    /// Fails every call to `action` as if the network dropped.
    pub fn fail(self, action: &str, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(action.to_string(), Canned::Fail(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<SheetRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn requests_for(&self, action: &str) -> Vec<SheetRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.action == action)
            .collect()
    }
}

impl Transport for StubTransport {
    async fn send(&self, request: SheetRequest) -> Result<Value, ApiError> {
        let action = request.action.clone();
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        match responses.get(&action) {
            Some(Canned::Reply(value)) => Ok(value.clone()),
            Some(Canned::Fail(message)) => Err(ApiError::Network(message.clone())),
            None => Err(ApiError::Status(404, format!("no canned response for {}", action))),
        }
    }
}

pub fn stub_client(transport: StubTransport) -> SheetClient<StubTransport> {
    SheetClient::with_transport(transport, "https://sheets.test/exec", "test-sheet", None)
        .expect("stub URL is valid")
}
