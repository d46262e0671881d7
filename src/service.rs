//! Request-level service layer.
//!
//! Implements the generate-content contract over already-parsed request
//! fields, so any web framework can be bolted on top as thin plumbing:
//! validate the input combination, extract context, run the pipeline, and
//! assemble the JSON response or an [`ApiError`] with an HTTP status code.

use crate::error::PipelineError;
use crate::exec_ctx::ExecCtx;
use crate::extract::{extract_context, ContextSource};
use crate::pipeline::ContentPipeline;
use crate::render::to_data_url;
use crate::types::{ContentResponse, GuidedAnswers, PipelineState, VisualPromptOut};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

/// One generate-content request, fields as a multipart layer delivers them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    pub input_type: String,
    /// Raw text or URL, depending on `input_type`.
    pub content: Option<String>,
    /// JSON-encoded object with optional niche/objective/tone keys.
    pub guided_answers: Option<String>,
    /// Uploaded image bytes plus their mime type.
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageUpload {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Error surface of the service layer, carrying the HTTP status a web
/// framework should answer with.
///
/// Serializes to `{"detail": ...}` only; the status belongs on the HTTP
/// status line, not in the body.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{status}: {detail}")]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    pub detail: String,
}

impl ApiError {
    fn bad_request() -> Self {
        ApiError {
            status: 400,
            detail: "Invalid input type or missing content".to_string(),
        }
    }

    fn internal(detail: String) -> Self {
        ApiError { status: 500, detail }
    }
}

/// Validate the request and turn it into a context source.
fn context_source(request: GenerateRequest) -> Result<ContextSource, ApiError> {
    match request.input_type.as_str() {
        "text" => match request.content {
            Some(text) if !text.trim().is_empty() => Ok(ContextSource::Text(text)),
            _ => Err(ApiError::bad_request()),
        },
        "url" => match request.content {
            Some(url) if !url.trim().is_empty() => Ok(ContextSource::Url(url)),
            _ => Err(ApiError::bad_request()),
        },
        "image" => match request.image {
            Some(upload) => Ok(ContextSource::Image {
                data: upload.data,
                mime_type: upload.mime_type,
            }),
            None => Err(ApiError::bad_request()),
        },
        "guided" => match request.guided_answers {
            Some(raw) => {
                let answers: GuidedAnswers = serde_json::from_str(&raw).map_err(|e| {
                    ApiError::internal(format!("Error generating content: {}", e))
                })?;
                Ok(ContextSource::Guided(answers))
            }
            None => Err(ApiError::bad_request()),
        },
        _ => Err(ApiError::bad_request()),
    }
}

/// Handle one generate-content request end to end.
pub async fn generate_content(
    ctx: &ExecCtx,
    request: GenerateRequest,
) -> Result<ContentResponse, ApiError> {
    let source = context_source(request)?;
    info!(source = source.kind(), "generate request accepted");

    let context = extract_context(ctx, source).await;
    let state = ContentPipeline::new()
        .run(ctx, PipelineState::new(context))
        .await
        .map_err(|e| match e {
            PipelineError::Cancelled => ApiError::internal("Request cancelled".to_string()),
            other => ApiError::internal(format!("Error generating content: {}", other)),
        })?;

    if let Some(detail) = state.error {
        error!(%detail, "pipeline run failed");
        return Err(ApiError::internal(detail));
    }

    let visual_prompts = state
        .visuals
        .into_iter()
        .map(|visual| VisualPromptOut {
            description: visual.description,
            image_url: visual.image.as_deref().map(to_data_url),
        })
        .collect();

    Ok(ContentResponse {
        ideas: state.ideas,
        posts: state.posts,
        visual_prompts,
        context_summary: state.context,
    })
}

/// The static guided questionnaire: three questions, fixed options.
pub fn guided_questions() -> Value {
    json!({
        "questions": [
            {
                "id": "niche",
                "question": "What is your niche or industry?",
                "type": "text",
                "placeholder": "E.g.: fitness, cooking, technology, fashion..."
            },
            {
                "id": "objective",
                "question": "What is the main objective of your posts?",
                "type": "select",
                "options": ["entertain", "educate", "sell", "inspire", "inform"]
            },
            {
                "id": "tone",
                "question": "What tone of voice do you prefer?",
                "type": "select",
                "options": ["fun", "professional", "inspirational", "casual", "educational"]
            }
        ]
    })
}
