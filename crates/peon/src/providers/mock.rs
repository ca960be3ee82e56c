use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;

use crate::errors::{ProviderError, ProviderResult};
use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::{Provider, Response};

/// A mock provider that returns pre-configured responses for testing
pub struct MockProvider {
    responses: Arc<Mutex<Vec<ProviderResult<Response>>>>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<Response>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    /// Create a mock provider whose round-trips may also fail
    pub fn with_results(responses: Vec<ProviderResult<Response>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The conversations received so far, one per round-trip
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn model(&self) -> &str {
        "mock"
    }

    async fn chat(&self, messages: &[Message], _tools: &[Tool]) -> ProviderResult<Response> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Return empty response if no more pre-configured responses
            Ok(Response::default())
        } else {
            responses.remove(0)
        }
    }
}

/// Shorthand for a failed round-trip in scripted responses
pub fn transport_failure(message: &str) -> ProviderResult<Response> {
    Err(ProviderError::Api(message.to_string()))
}
