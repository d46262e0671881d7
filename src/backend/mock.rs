//! Mock backend for testing without a live model.
//!
//! [`MockBackend`] returns pre-configured responses in order, allowing
//! downstream consumers to write deterministic tests against the pipeline.
//! A response can also be an error, to exercise stage-failure paths.
//!
//! # Example
//!
//! ```
//! use postforge::backend::MockBackend;
//!
//! let mock = MockBackend::fixed("a concise context summary");
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::Client;

use super::{ModelRequest, ModelResponse, TextBackend};
use crate::error::Result;
use crate::PipelineError;

/// One scripted mock response: canned text or a simulated failure.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this text with status 200.
    Text(String),
    /// Fail the call with this error message.
    Fail(String),
}

/// A test backend that returns canned responses in order.
///
/// Cycles back to the beginning when all responses have been consumed.
#[derive(Debug)]
pub struct MockBackend {
    responses: Vec<MockResponse>,
    index: AtomicUsize,
}

impl MockBackend {
    /// Create a mock backend with the given scripted responses.
    ///
    /// Responses are returned in order. When exhausted, cycles from the beginning.
    pub fn new(responses: Vec<MockResponse>) -> Self {
        assert!(
            !responses.is_empty(),
            "MockBackend requires at least one response"
        );
        Self {
            responses,
            index: AtomicUsize::new(0),
        }
    }

    /// Create a mock from plain text responses.
    pub fn texts(responses: Vec<String>) -> Self {
        Self::new(responses.into_iter().map(MockResponse::Text).collect())
    }

    /// Create a mock that always returns the same response.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::texts(vec![response.into()])
    }

    /// Create a mock that always fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(vec![MockResponse::Fail(message.into())])
    }

    fn next_response(&self) -> MockResponse {
        let idx = self.index.fetch_add(1, Ordering::Relaxed) % self.responses.len();
        self.responses[idx].clone()
    }
}

#[async_trait]
impl TextBackend for MockBackend {
    async fn complete(
        &self,
        _client: &Client,
        _base_url: &str,
        _request: &ModelRequest,
    ) -> Result<ModelResponse> {
        match self.next_response() {
            MockResponse::Text(text) => Ok(ModelResponse {
                text,
                status: 200,
                metadata: None,
            }),
            MockResponse::Fail(message) => Err(PipelineError::Other(message)),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ModelRequest {
        ModelRequest::text("test", "test")
    }

    #[tokio::test]
    async fn test_mock_fixed_response() {
        let mock = MockBackend::fixed("Hello!");
        let client = Client::new();
        let resp = mock
            .complete(&client, "http://unused", &request())
            .await
            .unwrap();
        assert_eq!(resp.text, "Hello!");
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn test_mock_cycles_responses() {
        let mock = MockBackend::texts(vec!["first".into(), "second".into()]);
        let client = Client::new();
        let r1 = mock
            .complete(&client, "http://unused", &request())
            .await
            .unwrap();
        let r2 = mock
            .complete(&client, "http://unused", &request())
            .await
            .unwrap();
        let r3 = mock
            .complete(&client, "http://unused", &request())
            .await
            .unwrap();
        assert_eq!(r1.text, "first");
        assert_eq!(r2.text, "second");
        assert_eq!(r3.text, "first"); // cycles
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let mock = MockBackend::failing("quota exceeded");
        let client = Client::new();
        let err = mock
            .complete(&client, "http://unused", &request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }
}
