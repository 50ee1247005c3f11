//! Deterministic in-memory provider for tests
//!
//! Responses are scripted FIFO; every request is recorded so tests can
//! assert on prompt contents and call ordering.

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResult};
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Default)]
pub struct MockProvider {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next response text.
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().unwrap().push_back(response.into());
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Prompts in the order they were issued.
    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|r| r.prompt.clone()).collect()
    }

    pub fn remaining_responses(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: LlmRequest) -> LlmResult<String> {
        self.calls.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::RequestFailed("mock provider has no scripted response".to_string()))
    }
}
