//! Renderer for the Imagen `predict` API.
//!
//! [`ImagenRenderer`] calls `POST {base}/v1beta/models/{model}:predict` and
//! decodes the first prediction's base64 image bytes. A successful call
//! with no image payload is an error here; the pipeline's
//! [`render_or_placeholder`](super::render_or_placeholder) turns every
//! error into the placeholder.

use super::ImageRenderer;
use crate::error::Result;
use crate::PipelineError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde_json::{json, Value};

/// Renderer for Imagen-style `predict` endpoints.
#[derive(Debug, Clone)]
pub struct ImagenRenderer {
    api_key: String,
}

impl ImagenRenderer {
    /// Create a renderer with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Build the `predict` JSON body.
    fn build_body(prompt: &str) -> Value {
        json!({
            "instances": [{"prompt": prompt}],
            "parameters": {"sampleCount": 1},
        })
    }

    /// Pull the first prediction's base64 payload out of the response.
    fn extract_image(json_resp: &Value) -> Result<Vec<u8>> {
        let encoded = json_resp
            .get("predictions")
            .and_then(|p| p.get(0))
            .and_then(|p| p.get("bytesBase64Encoded"))
            .and_then(|b| b.as_str())
            .ok_or_else(|| {
                PipelineError::Other("no image payload in predict response".to_string())
            })?;

        BASE64
            .decode(encoded)
            .map_err(|e| PipelineError::Other(format!("invalid base64 image payload: {}", e)))
    }
}

#[async_trait]
impl ImageRenderer for ImagenRenderer {
    async fn render(
        &self,
        client: &Client,
        base_url: &str,
        model: &str,
        prompt: &str,
    ) -> Result<Vec<u8>> {
        let base = base_url.trim_end_matches('/');
        let url = format!("{}/v1beta/models/{}:predict", base, model);
        let body = Self::build_body(prompt);

        let resp = client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                PipelineError::Other(format!("Failed to connect to renderer at {}: {}", url, e))
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::HttpError { status, body: text });
        }

        let json_resp: Value = resp.json().await?;
        Self::extract_image(&json_resp)
    }

    fn name(&self) -> &'static str {
        "imagen"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_body() {
        let body = ImagenRenderer::build_body("a sunset");
        assert_eq!(body["instances"][0]["prompt"], "a sunset");
        assert_eq!(body["parameters"]["sampleCount"], 1);
    }

    #[test]
    fn test_extract_image_decodes_base64() {
        let resp = json!({
            "predictions": [{"bytesBase64Encoded": BASE64.encode([1u8, 2, 3])}]
        });
        let bytes = ImagenRenderer::extract_image(&resp).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_extract_image_missing_payload() {
        let err = ImagenRenderer::extract_image(&json!({"predictions": []})).unwrap_err();
        assert!(err.to_string().contains("no image payload"));
    }

    #[test]
    fn test_extract_image_bad_base64() {
        let resp = json!({"predictions": [{"bytesBase64Encoded": "not base64!!"}]});
        let err = ImagenRenderer::extract_image(&resp).unwrap_err();
        assert!(err.to_string().contains("invalid base64"));
    }
}
