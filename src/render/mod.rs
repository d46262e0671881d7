//! Image rendering behind a substitutable interface.
//!
//! The [`ImageRenderer`] trait isolates the one place true binary
//! generation lives, so a real generator ([`ImagenRenderer`]) or the
//! deterministic placeholder ([`PlaceholderRenderer`]) can be swapped
//! without changing callers. [`render_or_placeholder`] is the only entry
//! point the pipeline uses: it never fails, substituting the placeholder on
//! every error path.

pub mod font;
pub mod imagen;
pub mod placeholder;

pub use imagen::ImagenRenderer;
pub use placeholder::{placeholder_png, PlaceholderRenderer, PLACEHOLDER_SIZE};

use crate::error::Result;
use crate::events::{emit, Event};
use crate::exec_ctx::ExecCtx;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use tracing::warn;

/// Abstraction over image-generation providers.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn ImageRenderer>`.
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    /// Render an image for the prompt, returning encoded image bytes.
    async fn render(
        &self,
        client: &Client,
        base_url: &str,
        model: &str,
        prompt: &str,
    ) -> Result<Vec<u8>>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}

/// Render an image for the prompt, falling back to the placeholder.
///
/// Never fails: any renderer error (transport, HTTP, missing image payload)
/// is swallowed, an [`Event::ImageFallback`] is emitted, and the
/// deterministic placeholder is returned instead.
pub async fn render_or_placeholder(ctx: &ExecCtx, prompt: &str) -> Option<Vec<u8>> {
    let renderer = ctx.renderer.as_ref()?;

    match renderer
        .render(&ctx.client, &ctx.base_url, &ctx.models.image, prompt)
        .await
    {
        Ok(bytes) if !bytes.is_empty() => Some(bytes),
        Ok(_) => {
            let reason = "renderer returned empty image payload".to_string();
            warn!(renderer = renderer.name(), %reason, "image fallback");
            emit(&ctx.event_handler, Event::ImageFallback { reason });
            Some(placeholder_png(prompt))
        }
        Err(e) => {
            let reason = e.to_string();
            warn!(renderer = renderer.name(), %reason, "image fallback");
            emit(&ctx.event_handler, Event::ImageFallback { reason });
            Some(placeholder_png(prompt))
        }
    }
}

/// Encode PNG bytes as a `data:image/png;base64,...` URL.
pub fn to_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}

/// Decode a `data:image/png;base64,...` URL back to raw bytes.
pub fn from_data_url(url: &str) -> Option<Vec<u8>> {
    let payload = url.strip_prefix("data:image/png;base64,")?;
    BASE64.decode(payload).ok()
}
