//! Idea generation stage: exactly five ideas per run.
//!
//! One model call returning a JSON array of five `{title, description}`
//! objects. Malformed output (bad JSON, wrong count, missing keys) routes
//! through a deterministic template fallback built from the context's first
//! word, so the stage always yields exactly five well-formed ideas.
//! Transport failures are NOT recovered here; they propagate to the
//! orchestrator as a stage error.

use crate::backend::ModelRequest;
use crate::error::Result;
use crate::events::{emit, Event};
use crate::exec_ctx::ExecCtx;
use crate::parsing::{parse_as, word_tokens};
use crate::types::Idea;
use tracing::debug;

/// Number of ideas every run must produce.
pub const IDEA_COUNT: usize = 5;

/// Generate exactly five ideas for the given context.
pub async fn generate_ideas(ctx: &ExecCtx, context: &str) -> Result<Vec<Idea>> {
    let prompt = format!(
        "Based on the following context, generate exactly 5 creative and engaging \
         Instagram post ideas.\n\n\
         Context: {}\n\n\
         For each idea provide:\n\
         - A catchy title (at most 8 words)\n\
         - A brief description (at most 25 words)\n\n\
         Respond ONLY with a valid JSON array, no additional text:\n\
         [\n\
             {{\"title\": \"Idea 1 title\", \"description\": \"Brief description of the first idea\"}},\n\
             {{\"title\": \"Idea 2 title\", \"description\": \"Brief description of the second idea\"}},\n\
             {{\"title\": \"Idea 3 title\", \"description\": \"Brief description of the third idea\"}},\n\
             {{\"title\": \"Idea 4 title\", \"description\": \"Brief description of the fourth idea\"}},\n\
             {{\"title\": \"Idea 5 title\", \"description\": \"Brief description of the fifth idea\"}}\n\
         ]",
        context
    );

    let request = ModelRequest::text(&ctx.models.text, prompt);
    let response = ctx
        .backend
        .complete(&ctx.client, &ctx.base_url, &request)
        .await?;

    match parse_ideas(&response.text) {
        Ok(ideas) => {
            debug!(count = ideas.len(), "idea generation parsed model output");
            Ok(ideas)
        }
        Err(reason) => {
            emit(
                &ctx.event_handler,
                Event::FallbackUsed {
                    stage: "generate_ideas",
                    reason: reason.clone(),
                },
            );
            debug!(%reason, "idea generation fell back to templates");
            Ok(fallback_ideas(context))
        }
    }
}

/// Parse and validate the model response into exactly five ideas.
fn parse_ideas(raw: &str) -> std::result::Result<Vec<Idea>, String> {
    let ideas: Vec<Idea> = parse_as(raw).map_err(|e| e.to_string())?;
    if ideas.len() != IDEA_COUNT {
        return Err(format!(
            "expected exactly {} ideas, got {}",
            IDEA_COUNT,
            ideas.len()
        ));
    }
    Ok(ideas)
}

/// Deterministic fallback: five fixed templates around the context's topic.
///
/// Never fails and always yields exactly five well-formed ideas.
pub fn fallback_ideas(context: &str) -> Vec<Idea> {
    let words = word_tokens(context);
    let main_topic = words.first().map(String::as_str).unwrap_or("content");

    let templates: [(&str, &str); IDEA_COUNT] = [
        (
            "Complete guide to {t}",
            "Everything you need to know about {t}",
        ),
        (
            "Essential tips for {t}",
            "Practical and useful advice for {t}",
        ),
        ("Secrets of {t}", "Little-known tricks about {t}"),
        ("Common mistakes in {t}", "What to avoid when working on {t}"),
        ("Inspiration for {t}", "Creative ideas related to {t}"),
    ];

    templates
        .iter()
        .map(|(title, description)| Idea {
            title: title.replace("{t}", main_topic),
            description: description.replace("{t}", main_topic),
        })
        .collect()
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

    fn five_ideas_json() -> String {
        serde_json::to_string(
            &(1..=5)
                .map(|i| Idea {
                    title: format!("Idea {}", i),
                    description: format!("Description {}", i),
                })
                .collect::<Vec<_>>(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_valid_response_is_used() {
        let ctx = ctx_with(MockBackend::fixed(five_ideas_json()));
        let ideas = generate_ideas(&ctx, "fitness tips").await.unwrap();
        assert_eq!(ideas.len(), 5);
        assert_eq!(ideas[0].title, "Idea 1");
    }

    #[tokio::test]
    async fn test_fenced_response_is_parsed() {
        let fenced = format!("```json\n{}\n```", five_ideas_json());
        let ctx = ctx_with(MockBackend::fixed(fenced));
        let ideas = generate_ideas(&ctx, "fitness tips").await.unwrap();
        assert_eq!(ideas.len(), 5);
    }

    #[tokio::test]
    async fn test_non_json_triggers_fallback() {
        let ctx = ctx_with(MockBackend::fixed("I'm sorry, I can't produce JSON."));
        let ideas = generate_ideas(&ctx, "Fitness for beginners").await.unwrap();
        assert_eq!(ideas.len(), 5);
        for idea in &ideas {
            assert!(idea.title.contains("fitness"), "title: {}", idea.title);
        }
    }

    #[tokio::test]
    async fn test_wrong_count_triggers_fallback() {
        let three = serde_json::json!([
            {"title": "a", "description": "x"},
            {"title": "b", "description": "y"},
            {"title": "c", "description": "z"},
        ]);
        let ctx = ctx_with(MockBackend::fixed(three.to_string()));
        let ideas = generate_ideas(&ctx, "cooking at home").await.unwrap();
        assert_eq!(ideas.len(), 5);
        assert!(ideas[0].title.contains("cooking"));
    }

    #[tokio::test]
    async fn test_missing_keys_trigger_fallback() {
        let bad = serde_json::json!([
            {"title": "a"}, {"title": "b"}, {"title": "c"},
            {"title": "d"}, {"title": "e"},
        ]);
        let ctx = ctx_with(MockBackend::fixed(bad.to_string()));
        let ideas = generate_ideas(&ctx, "travel hacks").await.unwrap();
        assert_eq!(ideas.len(), 5);
        assert!(ideas[0].description.contains("travel"));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let ctx = ctx_with(MockBackend::failing("quota exceeded"));
        let result = generate_ideas(&ctx, "anything").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_fallback_empty_context_uses_content() {
        let ideas = fallback_ideas("");
        assert_eq!(ideas.len(), 5);
        for idea in &ideas {
            assert!(idea.title.contains("content"));
        }
    }

    #[test]
    fn test_fallback_is_deterministic() {
        assert_eq!(
            serde_json::to_string(&fallback_ideas("gardening tips")).unwrap(),
            serde_json::to_string(&fallback_ideas("gardening tips")).unwrap()
        );
    }
}
