//! Backend trait and normalized request/response types.
//!
//! The [`TextBackend`] trait abstracts over text/vision model providers,
//! translating between normalized [`ModelRequest`]/[`ModelResponse`] types
//! and provider-specific HTTP APIs. Built-in implementations:
//! [`GeminiBackend`] (production), [`MockBackend`] (tests).
//!
//! ## Architecture
//!
//! ```text
//! stage fn ──► ModelRequest ──► TextBackend::complete() ──► ModelResponse
//!                                        │
//!                             ┌──────────┴──────────┐
//!                        GeminiBackend          MockBackend
//!                        :generateContent       canned responses
//! ```

pub mod gemini;
pub mod mock;

pub use gemini::GeminiBackend;
pub use mock::{MockBackend, MockResponse};

use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;

/// Image bytes attached to a vision request.
#[derive(Debug, Clone)]
pub struct ImagePart {
    /// MIME type as uploaded (e.g. `"image/png"`, `"image/jpeg"`).
    pub mime_type: String,
    /// Raw image bytes.
    pub data: Vec<u8>,
}

/// A normalized model request — provider-agnostic.
///
/// Stage functions build this; the [`TextBackend`] translates it into the
/// provider-specific HTTP request.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Model identifier (e.g. `"gemini-2.5-flash"`).
    pub model: String,

    /// The user prompt text.
    pub prompt: String,

    /// Optional inline image for vision-capable calls.
    pub image: Option<ImagePart>,

    /// Generation parameters.
    pub config: ModelConfig,
}

impl ModelRequest {
    /// Text-only request with default generation parameters.
    pub fn text(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            image: None,
            config: ModelConfig::default(),
        }
    }

    /// Attach inline image bytes (switches the call to vision mode).
    pub fn with_image(mut self, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        self.image = Some(ImagePart {
            mime_type: mime_type.into(),
            data,
        });
        self
    }
}

/// Generation parameters for model requests.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f64,

    /// Maximum tokens to generate.
    pub max_output_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }
}

/// A normalized model response.
#[derive(Debug)]
pub struct ModelResponse {
    /// The generated text content.
    pub text: String,

    /// HTTP status code (for diagnostics/logging).
    pub status: u16,

    /// Provider-specific metadata (token counts, model info).
    /// Stored as raw JSON — each provider returns different fields.
    pub metadata: Option<serde_json::Value>,
}

/// Abstraction over text/vision model providers.
///
/// Implementors translate between the normalized
/// [`ModelRequest`]/[`ModelResponse`] and the provider's HTTP API. A request
/// carrying an [`ImagePart`] is a vision call; providers that cannot handle
/// images should return an error rather than silently dropping them.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn TextBackend>`.
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Execute a model call and return the generated text.
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &ModelRequest,
    ) -> Result<ModelResponse>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}
