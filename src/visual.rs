//! Visual prompt stage: one image-generation prompt per idea.
//!
//! Unlike the JSON stages, the model answers in free text, so there is no
//! parse fallback here. The trimmed response is used as-is; transport
//! failures propagate to the orchestrator.

use crate::backend::ModelRequest;
use crate::error::Result;
use crate::exec_ctx::ExecCtx;
use crate::types::Idea;

/// Generate an image-generation prompt describing the visual for one idea.
pub async fn generate_visual_prompt(ctx: &ExecCtx, idea: &Idea, context: &str) -> Result<String> {
    let prompt = format!(
        "Create a detailed prompt for generating an Instagram image for this post:\n\n\
         Title: {}\n\
         Description: {}\n\
         Context: {}\n\n\
         The prompt must describe:\n\
         - Visual style (photography, illustration, minimalist design, etc.)\n\
         - Main elements of the image\n\
         - Colors and atmosphere\n\
         - Composition suited to Instagram (square format)\n\n\
         Respond only with the image prompt, at most 100 words, no additional text.",
        idea.title, idea.description, context
    );

    let request = ModelRequest::text(&ctx.models.text, prompt);
    let response = ctx
        .backend
        .complete(&ctx.client, &ctx.base_url, &request)
        .await?;

    Ok(response.text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use std::sync::Arc;

    fn ctx_with(backend: MockBackend) -> ExecCtx {
        ExecCtx::builder("http://test")
            .backend(Arc::new(backend))
            .build()
    }

    fn sample_idea() -> Idea {
        Idea {
            title: "Sunrise runs".to_string(),
            description: "Why early miles feel different".to_string(),
        }
    }

    #[tokio::test]
    async fn test_response_is_trimmed() {
        let ctx = ctx_with(MockBackend::fixed(
            "  Warm golden-hour photograph of a runner on an empty road.  \n",
        ));
        let prompt = generate_visual_prompt(&ctx, &sample_idea(), "running")
            .await
            .unwrap();
        assert_eq!(
            prompt,
            "Warm golden-hour photograph of a runner on an empty road."
        );
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let ctx = ctx_with(MockBackend::failing("timeout"));
        assert!(generate_visual_prompt(&ctx, &sample_idea(), "running")
            .await
            .is_err());
    }
}
