//! Execution context shared across pipeline runs.
//!
//! [`ExecCtx`] carries the HTTP client, text backend, optional image
//! renderer, model names, cancellation handle, and optional event handler.
//! It is constructed once at startup and shared by every pipeline run; each
//! run keeps its own [`PipelineState`](crate::types::PipelineState).

use crate::backend::TextBackend;
use crate::events::EventHandler;
use crate::render::ImageRenderer;
use reqwest::Client;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

/// Model identifiers used by the stages.
#[derive(Debug, Clone)]
pub struct ModelNames {
    /// Text analysis and generation model.
    pub text: String,
    /// Vision-capable model for image context extraction.
    pub vision: String,
    /// Image-generation model.
    pub image: String,
}

impl Default for ModelNames {
    fn default() -> Self {
        Self {
            text: "gemini-2.5-flash".to_string(),
            vision: "gemini-2.5-flash".to_string(),
            image: "imagen-4.0-generate-001".to_string(),
        }
    }
}

/// Shared execution context for pipeline runs.
///
/// Carries everything the stages need from the runtime environment. The
/// backend and renderer are injected dependencies, so tests can substitute
/// mocks without touching any stage code.
///
/// # Example
///
/// ```
/// use postforge::ExecCtx;
/// use postforge::backend::MockBackend;
/// use std::sync::Arc;
///
/// let ctx = ExecCtx::builder("https://generativelanguage.googleapis.com")
///     .backend(Arc::new(MockBackend::fixed("canned")))
///     .build();
/// ```
pub struct ExecCtx {
    /// HTTP client (cheap to clone -- uses `Arc` internally).
    pub client: Client,
    /// Base URL for the model provider.
    pub base_url: String,
    /// Text/vision model backend.
    pub backend: Arc<dyn TextBackend>,
    /// Image renderer; `None` disables rendering (visual prompts only).
    pub renderer: Option<Arc<dyn ImageRenderer>>,
    /// Model identifiers used by the stages.
    pub models: ModelNames,
    /// Optional cancellation flag; the pipeline checks it between stages.
    pub cancellation: Option<Arc<AtomicBool>>,
    /// Optional event handler for stage lifecycle and fallback events.
    pub event_handler: Option<Arc<dyn EventHandler>>,
}

impl ExecCtx {
    /// Create a new builder.
    pub fn builder(base_url: impl Into<String>) -> ExecCtxBuilder {
        ExecCtxBuilder {
            client: None,
            base_url: base_url.into(),
            backend: None,
            renderer: None,
            models: ModelNames::default(),
            cancellation: None,
            event_handler: None,
            timeout: None,
        }
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }

    /// Return an error if cancellation has been requested.
    pub fn check_cancelled(&self) -> crate::error::Result<()> {
        if self.is_cancelled() {
            return Err(crate::PipelineError::Cancelled);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ExecCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecCtx")
            .field("base_url", &self.base_url)
            .field("backend", &self.backend.name())
            .field("renderer", &self.renderer.as_ref().map(|r| r.name()))
            .field("models", &self.models)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

/// Builder for [`ExecCtx`].
pub struct ExecCtxBuilder {
    client: Option<Client>,
    base_url: String,
    backend: Option<Arc<dyn TextBackend>>,
    renderer: Option<Arc<dyn ImageRenderer>>,
    models: ModelNames,
    cancellation: Option<Arc<AtomicBool>>,
    event_handler: Option<Arc<dyn EventHandler>>,
    timeout: Option<Duration>,
}

impl ExecCtxBuilder {
    /// Set the HTTP client. If not set, a default client is created.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the text/vision backend. Required for any meaningful use;
    /// defaults to a backend that fails every call.
    pub fn backend(mut self, backend: Arc<dyn TextBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the image renderer. Without one, visuals carry prompts only.
    pub fn renderer(mut self, renderer: Arc<dyn ImageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Override the model identifiers.
    pub fn models(mut self, models: ModelNames) -> Self {
        self.models = models;
        self
    }

    /// Set the cancellation flag.
    pub fn cancellation(mut self, cancel: Option<Arc<AtomicBool>>) -> Self {
        self.cancellation = cancel;
        self
    }

    /// Set the event handler.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Set the request timeout for the default client. Default: 60 seconds.
    ///
    /// Ignored when a custom `Client` is provided via `.client()` (the
    /// custom client's own timeout applies).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the execution context.
    pub fn build(self) -> ExecCtx {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(60));
        let client = self.client.unwrap_or_else(|| {
            Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client")
        });
        ExecCtx {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            backend: self
                .backend
                .unwrap_or_else(|| Arc::new(UnconfiguredBackend)),
            renderer: self.renderer,
            models: self.models,
            cancellation: self.cancellation,
            event_handler: self.event_handler,
        }
    }
}

/// Placeholder backend used when no backend was configured.
struct UnconfiguredBackend;

#[async_trait::async_trait]
impl TextBackend for UnconfiguredBackend {
    async fn complete(
        &self,
        _client: &Client,
        _base_url: &str,
        _request: &crate::backend::ModelRequest,
    ) -> crate::error::Result<crate::backend::ModelResponse> {
        Err(crate::PipelineError::InvalidConfig(
            "No text backend configured".to_string(),
        ))
    }

    fn name(&self) -> &'static str {
        "unconfigured"
    }
}
