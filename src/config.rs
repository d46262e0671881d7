//! Environment configuration.
//!
//! Read once at startup; [`Config::build_ctx`] turns the configuration into
//! a production [`ExecCtx`] wired to the Gemini backend and, when an image
//! key is present, the Imagen renderer.

use crate::backend::GeminiBackend;
use crate::error::{PipelineError, Result};
use crate::exec_ctx::{ExecCtx, ModelNames};
use crate::render::ImagenRenderer;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Runtime configuration read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the text/vision model. Required.
    pub api_key: String,
    /// API key for the image model; rendering is disabled without it.
    pub image_api_key: Option<String>,
    /// Base URL of the model provider.
    pub base_url: String,
    /// Model identifiers, overridable per concern.
    pub models: ModelNames,
    /// Request timeout for model calls.
    pub timeout: Duration,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// `GEMINI_API_KEY` is required. `GEMINI_IMAGE_API_KEY`,
    /// `GEMINI_BASE_URL`, `GEMINI_TEXT_MODEL`, `GEMINI_VISION_MODEL`,
    /// `GEMINI_IMAGE_MODEL`, and `REQUEST_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self> {
        let api_key = env_var("GEMINI_API_KEY").ok_or_else(|| {
            PipelineError::InvalidConfig("GEMINI_API_KEY is not set".to_string())
        })?;

        let mut models = ModelNames::default();
        if let Some(text) = env_var("GEMINI_TEXT_MODEL") {
            models.text = text;
        }
        if let Some(vision) = env_var("GEMINI_VISION_MODEL") {
            models.vision = vision;
        }
        if let Some(image) = env_var("GEMINI_IMAGE_MODEL") {
            models.image = image;
        }

        let timeout = match env_var("REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    PipelineError::InvalidConfig(format!(
                        "REQUEST_TIMEOUT_SECS is not a valid number: {}",
                        raw
                    ))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Config {
            api_key,
            image_api_key: env_var("GEMINI_IMAGE_API_KEY"),
            base_url: env_var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            models,
            timeout,
        })
    }

    /// Build the production execution context.
    pub fn build_ctx(&self) -> ExecCtx {
        let mut builder = ExecCtx::builder(&self.base_url)
            .backend(Arc::new(GeminiBackend::new(&self.api_key)))
            .models(self.models.clone())
            .timeout(self.timeout);
        if let Some(ref image_key) = self.image_api_key {
            builder = builder.renderer(Arc::new(ImagenRenderer::new(image_key)));
        }
        builder.build()
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config(image_key: Option<&str>) -> Config {
        Config {
            api_key: "test-key".to_string(),
            image_api_key: image_key.map(String::from),
            base_url: DEFAULT_BASE_URL.to_string(),
            models: ModelNames::default(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_ctx_without_image_key_has_no_renderer() {
        let ctx = sample_config(None).build_ctx();
        assert_eq!(ctx.backend.name(), "gemini");
        assert!(ctx.renderer.is_none());
    }

    #[test]
    fn test_ctx_with_image_key_has_renderer() {
        let ctx = sample_config(Some("image-key")).build_ctx();
        assert_eq!(ctx.renderer.as_ref().map(|r| r.name()), Some("imagen"));
    }
}
