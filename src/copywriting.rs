//! Copy generation stage: one complete post per idea.
//!
//! Each call returns a `{hook, body, cta, hashtags}` JSON object for a
//! single idea. Malformed output falls back to a deterministic post built
//! from the idea itself, with hashtags ranked out of the context words.
//! Transport failures propagate to the orchestrator.

use crate::backend::ModelRequest;
use crate::error::Result;
use crate::events::{emit, Event};
use crate::exec_ctx::ExecCtx;
use crate::parsing::{parse_as, word_tokens};
use crate::types::{Idea, Post};
use std::collections::HashMap;
use tracing::debug;

/// Maximum number of hashtags a post carries.
const MAX_HASHTAGS: usize = 5;

/// Context-derived hashtags kept before the fixed fillers are appended.
const CONTEXT_HASHTAGS: usize = 3;

/// Generate the full copy for one idea.
pub async fn generate_copy(ctx: &ExecCtx, idea: &Idea, context: &str) -> Result<Post> {
    let prompt = format!(
        "Write a complete Instagram post for this idea:\n\n\
         Title: {}\n\
         Description: {}\n\
         Context: {}\n\n\
         The post must include:\n\
         - An attention-grabbing hook (at most 15 words)\n\
         - A body that delivers value (at most 150 words)\n\
         - A clear call to action\n\
         - Between 3 and 5 relevant hashtags\n\n\
         Respond ONLY with a valid JSON object, no additional text:\n\
         {{\n\
             \"hook\": \"The opening hook\",\n\
             \"body\": \"The body of the post\",\n\
             \"cta\": \"The call to action\",\n\
             \"hashtags\": [\"#tag1\", \"#tag2\", \"#tag3\"]\n\
         }}",
        idea.title, idea.description, context
    );

    let request = ModelRequest::text(&ctx.models.text, prompt);
    let response = ctx
        .backend
        .complete(&ctx.client, &ctx.base_url, &request)
        .await?;

    match parse_as::<Post>(&response.text) {
        Ok(post) => {
            debug!(title = %idea.title, "copy generation parsed model output");
            Ok(post)
        }
        Err(e) => {
            emit(
                &ctx.event_handler,
                Event::FallbackUsed {
                    stage: "generate_copy",
                    reason: e.to_string(),
                },
            );
            debug!(title = %idea.title, error = %e, "copy generation fell back to template");
            Ok(fallback_post(idea, context))
        }
    }
}

/// Deterministic fallback post built out of the idea and context.
pub fn fallback_post(idea: &Idea, context: &str) -> Post {
    Post {
        hook: format!("Did you know this about {}?", idea.title),
        body: format!(
            "{}\n\nThis topic deserves your attention. Save this post so you \
             don't lose it and come back to it whenever you need a reminder.",
            idea.description
        ),
        cta: "What do you think? Tell me in the comments!".to_string(),
        hashtags: fallback_hashtags(context),
    }
}

/// Rank context words into hashtags: frequency first, then length, then
/// first occurrence. Words of three characters or less are dropped. Three
/// fixed fillers are appended and the list is capped at five.
fn fallback_hashtags(context: &str) -> Vec<String> {
    let words = word_tokens(context);
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (position, word) in words.iter().enumerate() {
        if word.len() <= 3 {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
        first_seen.entry(word).or_insert(position);
    }

    let mut ranked: Vec<&str> = counts.keys().copied().collect();
    ranked.sort_by(|a, b| {
        counts[b]
            .cmp(&counts[a])
            .then(b.len().cmp(&a.len()))
            .then(first_seen[a].cmp(&first_seen[b]))
    });

    let mut hashtags: Vec<String> = ranked
        .into_iter()
        .take(CONTEXT_HASHTAGS)
        .map(|word| format!("#{}", capitalize(word)))
        .collect();
    for filler in ["#Instagram", "#Content", "#Tips"] {
        hashtags.push(filler.to_string());
    }
    hashtags.truncate(MAX_HASHTAGS);
    hashtags
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
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
            title: "Morning routines".to_string(),
            description: "Simple habits that set the tone for your day".to_string(),
        }
    }

    #[tokio::test]
    async fn test_valid_response_is_used() {
        let json = serde_json::json!({
            "hook": "Stop scrolling!",
            "body": "Here is the value.",
            "cta": "Follow for more.",
            "hashtags": ["#a", "#b", "#c"],
        });
        let ctx = ctx_with(MockBackend::fixed(json.to_string()));
        let post = generate_copy(&ctx, &sample_idea(), "wellness").await.unwrap();
        assert_eq!(post.hook, "Stop scrolling!");
        assert_eq!(post.hashtags.len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back() {
        let ctx = ctx_with(MockBackend::fixed("not json at all"));
        let post = generate_copy(&ctx, &sample_idea(), "wellness routines for busy people")
            .await
            .unwrap();
        assert!(post.hook.contains("Morning routines"));
        assert_eq!(post.cta, "What do you think? Tell me in the comments!");
        assert!(post.hashtags.len() >= 3 && post.hashtags.len() <= 5);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let ctx = ctx_with(MockBackend::failing("backend down"));
        assert!(generate_copy(&ctx, &sample_idea(), "wellness").await.is_err());
    }

    #[test]
    fn test_fallback_hashtags_rank_by_frequency() {
        let tags = fallback_hashtags("coffee coffee beans roasting beans coffee");
        assert_eq!(tags[0], "#Coffee");
        assert_eq!(tags[1], "#Beans");
        assert_eq!(tags[2], "#Roasting");
        assert_eq!(tags.len(), 5);
    }

    #[test]
    fn test_fallback_hashtags_skip_short_words() {
        let tags = fallback_hashtags("the cat sat on a mat");
        assert!(!tags.iter().any(|t| t == "#The" || t == "#Cat"));
        assert!(tags.contains(&"#Instagram".to_string()));
    }

    #[test]
    fn test_fallback_hashtags_empty_context() {
        let tags = fallback_hashtags("");
        assert_eq!(tags, vec!["#Instagram", "#Content", "#Tips"]);
    }

    #[test]
    fn test_fallback_post_uses_idea_fields() {
        let post = fallback_post(&sample_idea(), "morning wellness habits");
        assert!(post.body.contains("Simple habits"));
        assert!(!post.hashtags.is_empty());
    }
}
