//! Backend for the Gemini `generateContent` API.
//!
//! [`GeminiBackend`] translates normalized [`ModelRequest`]s into
//! `POST {base}/v1beta/models/{model}:generateContent` calls. A request
//! carrying an [`ImagePart`](super::ImagePart) becomes a vision call with
//! the image attached as an `inline_data` part next to the prompt text.

use super::{ModelRequest, ModelResponse, TextBackend};
use crate::error::Result;
use crate::PipelineError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde_json::{json, Value};

/// Backend for Gemini's `generateContent` endpoint.
///
/// The API key is sent as the `x-goog-api-key` header. One backend instance
/// is constructed at startup and shared across all requests.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    api_key: String,
}

impl GeminiBackend {
    /// Create a backend with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Build the `generateContent` JSON body.
    fn build_body(request: &ModelRequest) -> Value {
        let mut parts = vec![json!({"text": request.prompt})];
        if let Some(ref image) = request.image {
            parts.push(json!({
                "inline_data": {
                    "mime_type": image.mime_type,
                    "data": BASE64.encode(&image.data),
                }
            }));
        }

        json!({
            "contents": [{"parts": parts}],
            "generationConfig": {
                "temperature": request.config.temperature,
                "maxOutputTokens": request.config.max_output_tokens,
            },
        })
    }

    /// Send the request and return the parsed JSON response plus status.
    async fn send_request(&self, client: &Client, url: &str, body: &Value) -> Result<(Value, u16)> {
        let resp = client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                PipelineError::Other(format!("Failed to connect to model at {}: {}", url, e))
            })?;

        let status = resp.status().as_u16();

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::HttpError { status, body: text });
        }

        let json_resp: Value = resp.json().await?;
        Ok((json_resp, status))
    }

    /// Extract the generated text from the first candidate's parts.
    fn extract_text(json_resp: &Value) -> String {
        json_resp
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }

    /// Extract usage metadata, if present.
    fn extract_metadata(json_resp: &Value) -> Option<Value> {
        let mut meta = serde_json::Map::new();
        if let Some(v) = json_resp.get("usageMetadata") {
            meta.insert("usage".into(), v.clone());
        }
        if let Some(v) = json_resp.get("modelVersion") {
            meta.insert("model_version".into(), v.clone());
        }
        if meta.is_empty() {
            None
        } else {
            Some(Value::Object(meta))
        }
    }
}

#[async_trait]
impl TextBackend for GeminiBackend {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &ModelRequest,
    ) -> Result<ModelResponse> {
        let base = base_url.trim_end_matches('/');
        let url = format!("{}/v1beta/models/{}:generateContent", base, request.model);
        let body = Self::build_body(request);

        let (json_resp, status) = self.send_request(client, &url, &body).await?;

        Ok(ModelResponse {
            text: Self::extract_text(&json_resp),
            status,
            metadata: Self::extract_metadata(&json_resp),
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_body_text_only() {
        let request = ModelRequest::text("gemini-2.5-flash", "hello");
        let body = GeminiBackend::build_body(&request);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn test_build_body_with_image() {
        let request =
            ModelRequest::text("gemini-2.5-flash", "describe").with_image("image/png", vec![0xFF]);
        let body = GeminiBackend::build_body(&request);
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["data"], BASE64.encode([0xFFu8]));
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let resp = json!({
            "candidates": [{
                "content": {"parts": [{"text": "Hello "}, {"text": "world"}]}
            }]
        });
        assert_eq!(GeminiBackend::extract_text(&resp), "Hello world");
    }

    #[test]
    fn test_extract_text_empty_on_missing_candidates() {
        assert_eq!(GeminiBackend::extract_text(&json!({})), "");
    }

    #[test]
    fn test_extract_metadata() {
        let resp = json!({"usageMetadata": {"totalTokenCount": 12}});
        let meta = GeminiBackend::extract_metadata(&resp).unwrap();
        assert_eq!(meta["usage"]["totalTokenCount"], 12);
        assert!(GeminiBackend::extract_metadata(&json!({})).is_none());
    }
}
