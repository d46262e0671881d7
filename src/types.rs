use serde::{Deserialize, Serialize};

/// A short post idea: title plus one-line description.
///
/// The idea stage always yields exactly five of these; the copy and visual
/// stages each run once per idea, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    /// Catchy title (intent: at most 8 words, not enforced).
    pub title: String,
    /// One-line description (intent: at most 25 words, not enforced).
    pub description: String,
}

/// Publishable Instagram copy for one idea.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Opening line.
    pub hook: String,
    /// Main message body.
    pub body: String,
    /// Call to action.
    pub cta: String,
    /// 3 to 5 hashtag strings.
    pub hashtags: Vec<String>,
}

/// An image-generation prompt plus optionally rendered image bytes.
#[derive(Debug, Clone)]
pub struct Visual {
    /// The image-generation prompt.
    pub description: String,
    /// PNG bytes, when a renderer was configured. `None` otherwise.
    pub image: Option<Vec<u8>>,
}

/// Mutable state threaded through the pipeline stages.
///
/// One state per request; stages populate it in order. When `error` is set,
/// lists past the failing stage may be incomplete and must not be trusted.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    /// Normalized textual summary of user intent, input to every stage.
    pub context: String,
    /// Exactly 5 after the idea stage completes.
    pub ideas: Vec<Idea>,
    /// Parallel to `ideas`.
    pub posts: Vec<Post>,
    /// Parallel to `ideas`.
    pub visuals: Vec<Visual>,
    /// First stage failure, annotated with the stage name.
    pub error: Option<String>,
}

impl PipelineState {
    /// Create a fresh state seeded with a context string.
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            ..Default::default()
        }
    }
}

/// Answers from the guided questionnaire. Every field is optional; the
/// context extractor substitutes defaults for missing answers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuidedAnswers {
    pub niche: Option<String>,
    pub objective: Option<String>,
    pub tone: Option<String>,
}

/// One visual prompt in the response, with an optional rendered image as a
/// `data:image/png;base64,...` URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualPromptOut {
    pub description: String,
    pub image_url: Option<String>,
}

/// Successful response payload for a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentResponse {
    pub ideas: Vec<Idea>,
    pub posts: Vec<Post>,
    pub visual_prompts: Vec<VisualPromptOut>,
    pub context_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_new_seeds_context() {
        let state = PipelineState::new("fitness for beginners");
        assert_eq!(state.context, "fitness for beginners");
        assert!(state.ideas.is_empty());
        assert!(state.posts.is_empty());
        assert!(state.visuals.is_empty());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_guided_answers_deserializes_partial() {
        let answers: GuidedAnswers =
            serde_json::from_str(r#"{"niche": "vegan cooking"}"#).unwrap();
        assert_eq!(answers.niche.as_deref(), Some("vegan cooking"));
        assert!(answers.objective.is_none());
        assert!(answers.tone.is_none());
    }

    #[test]
    fn test_visual_prompt_serializes_null_image() {
        let out = VisualPromptOut {
            description: "a sunset".into(),
            image_url: None,
        };
        let json = serde_json::to_value(&out).unwrap();
        assert!(json["image_url"].is_null());
    }
}
