//! Context extraction: turning raw user input into one plain-text context.
//!
//! Four input variants (free text, URL, uploaded image, guided
//! questionnaire) all reduce to a single context string that every
//! downstream stage consumes. Extraction fails closed: model or network
//! failures produce a diagnostic string with a generic fallback phrase, and
//! the pipeline continues with it.

use crate::backend::ModelRequest;
use crate::exec_ctx::ExecCtx;
use crate::parsing::scrub_markdown;
use crate::types::GuidedAnswers;
use std::time::Duration;
use tracing::{debug, warn};

/// Browser-like user agent for page fetches; some sites refuse the default.
const FETCH_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Fixed timeout for URL fetches.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Max characters of page text forwarded to the model.
const PAGE_TEXT_LIMIT: usize = 2000;

/// One of the four raw input forms a request can carry.
#[derive(Debug, Clone)]
pub enum ContextSource {
    /// Free-form text describing the desired content.
    Text(String),
    /// A webpage or profile URL to imitate.
    Url(String),
    /// An uploaded image to build content around.
    Image {
        /// Raw image bytes as uploaded.
        data: Vec<u8>,
        /// MIME type as uploaded.
        mime_type: String,
    },
    /// Answers from the guided questionnaire.
    Guided(GuidedAnswers),
}

impl ContextSource {
    /// Stable name of the variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ContextSource::Text(_) => "text",
            ContextSource::Url(_) => "url",
            ContextSource::Image { .. } => "image",
            ContextSource::Guided(_) => "guided",
        }
    }
}

/// Extract a context string from a raw input. Never fails.
///
/// Model-bound variants return a diagnostic string with a generic fallback
/// phrase on failure; the `guided` variant is deterministic and cannot fail.
pub async fn extract_context(ctx: &ExecCtx, source: ContextSource) -> String {
    match source {
        ContextSource::Text(text) => extract_from_text(ctx, &text).await,
        ContextSource::Url(url) => extract_from_url(ctx, &url).await,
        ContextSource::Image { data, mime_type } => {
            extract_from_image(ctx, data, &mime_type).await
        }
        ContextSource::Guided(answers) => extract_from_guided(&answers),
    }
}

async fn extract_from_text(ctx: &ExecCtx, text: &str) -> String {
    let prompt = format!(
        "Analyze the following text and extract the main themes, tone, and relevant \
         context for creating Instagram social media content:\n\n\
         Text: {}\n\n\
         Provide a concise context summary covering:\n\
         - Main topic\n\
         - Target audience\n\
         - Suggested tone\n\
         - Important keywords",
        text
    );

    match complete_text(ctx, &ctx.models.text, prompt).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(error = %e, "text context extraction failed");
            format!("Error processing text: {}. Using generic context.", e)
        }
    }
}

async fn extract_from_url(ctx: &ExecCtx, url: &str) -> String {
    match fetch_page_text(ctx, url).await {
        Ok(page_text) => {
            let prompt = format!(
                "Analyze the content of this webpage and extract relevant information \
                 for creating similar Instagram content:\n\n\
                 URL: {}\n\
                 Content: {}\n\n\
                 Provide an analysis of:\n\
                 - Content style\n\
                 - Target audience\n\
                 - Main topics\n\
                 - Communication tone",
                url, page_text
            );
            match complete_text(ctx, &ctx.models.text, prompt).await {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(error = %e, url, "url context analysis failed");
                    format!("Error processing URL: {}. Using generic context.", e)
                }
            }
        }
        Err(e) => {
            warn!(error = %e, url, "url fetch failed");
            format!("Error processing URL: {}. Using generic context.", e)
        }
    }
}

async fn extract_from_image(ctx: &ExecCtx, data: Vec<u8>, mime_type: &str) -> String {
    let prompt = "Analyze this image and describe in detail what you see, to create \
                  related Instagram content. Include:\n\
                  - Detailed visual description\n\
                  - Likely target audience\n\
                  - Topics or concepts the image suggests\n\
                  - Emotions it conveys\n\
                  - Related content ideas";

    let request =
        ModelRequest::text(&ctx.models.vision, prompt).with_image(mime_type, data);

    match ctx
        .backend
        .complete(&ctx.client, &ctx.base_url, &request)
        .await
    {
        Ok(response) => scrub_markdown(&response.text),
        Err(e) => {
            warn!(error = %e, "image context extraction failed");
            format!("Error processing image: {}. Using generic description.", e)
        }
    }
}

/// Deterministic context template over the questionnaire answers.
fn extract_from_guided(answers: &GuidedAnswers) -> String {
    let niche = answers.niche.as_deref().unwrap_or("general");
    let objective = answers.objective.as_deref().unwrap_or("entertain");
    let tone = answers.tone.as_deref().unwrap_or("friendly");

    format!(
        "User context:\n\
         - Niche/Industry: {}\n\
         - Post objective: {}\n\
         - Preferred tone of voice: {}\n\n\
         Create Instagram content optimized for this audience and these goals.",
        niche, objective, tone
    )
}

/// Run a text-model call and scrub the result for downstream prompts.
async fn complete_text(
    ctx: &ExecCtx,
    model: &str,
    prompt: String,
) -> crate::error::Result<String> {
    let request = ModelRequest::text(model, prompt);
    let response = ctx
        .backend
        .complete(&ctx.client, &ctx.base_url, &request)
        .await?;
    debug!(status = response.status, "context model call completed");
    Ok(scrub_markdown(&response.text))
}

/// Fetch a page and reduce it to visible text, truncated for the prompt.
async fn fetch_page_text(ctx: &ExecCtx, url: &str) -> crate::error::Result<String> {
    let resp = ctx
        .client
        .get(url)
        .header(reqwest::header::USER_AGENT, FETCH_USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await?;
    let html = resp.text().await?;

    let text = visible_text(&html);
    Ok(text.chars().take(PAGE_TEXT_LIMIT).collect())
}

/// Reduce HTML to its visible text.
///
/// Small state machine: strips tags, skips `script`/`style` content, and
/// collapses whitespace. Good enough for feeding a model; not a parser.
fn visible_text(html: &str) -> String {
    let mut out = String::new();
    let mut rest = html;
    let mut skip_until: Option<String> = None;

    while let Some(open) = rest.find('<') {
        let (before, after) = rest.split_at(open);
        if skip_until.is_none() {
            out.push_str(before);
        }
        let Some(close) = after.find('>') else { break };
        let tag_body = &after[1..close];
        let tag_name: String = tag_body
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        if let Some(ref waiting_for) = skip_until {
            if tag_body.starts_with('/') && tag_name == *waiting_for {
                skip_until = None;
            }
        } else if tag_name == "script" || tag_name == "style" {
            skip_until = Some(tag_name);
        } else {
            // Tag boundary; keep adjacent words separated.
            out.push(' ');
        }

        rest = &after[close + 1..];
    }
    if skip_until.is_none() {
        out.push_str(rest);
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
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

    #[tokio::test]
    async fn test_text_context_is_scrubbed() {
        let ctx = ctx_with(MockBackend::fixed(
            "**Main topic:** fitness\n- audience: beginners",
        ));
        let context = extract_context(&ctx, ContextSource::Text("gym tips".into())).await;
        assert_eq!(context, "Main topic: fitness audience: beginners");
    }

    #[tokio::test]
    async fn test_text_context_fails_closed() {
        let ctx = ctx_with(MockBackend::failing("quota exhausted"));
        let context = extract_context(&ctx, ContextSource::Text("gym tips".into())).await;
        assert!(context.starts_with("Error processing text:"));
        assert!(context.contains("quota exhausted"));
        assert!(context.ends_with("Using generic context."));
    }

    #[tokio::test]
    async fn test_url_fetch_failure_fails_closed() {
        let ctx = ctx_with(MockBackend::fixed("unused"));
        let context = extract_context(
            &ctx,
            ContextSource::Url("http://127.0.0.1:1/nothing-here".into()),
        )
        .await;
        assert!(context.starts_with("Error processing URL:"));
        assert!(context.ends_with("Using generic context."));
    }

    #[tokio::test]
    async fn test_image_context_failure_message() {
        let ctx = ctx_with(MockBackend::failing("vision unavailable"));
        let context = extract_context(
            &ctx,
            ContextSource::Image {
                data: vec![0u8; 8],
                mime_type: "image/png".into(),
            },
        )
        .await;
        assert!(context.starts_with("Error processing image:"));
        assert!(context.ends_with("Using generic description."));
    }

    #[tokio::test]
    async fn test_guided_context_embeds_answers() {
        let ctx = ctx_with(MockBackend::fixed("unused"));
        let answers = GuidedAnswers {
            niche: Some("vegan cooking".into()),
            objective: Some("educate".into()),
            tone: Some("professional".into()),
        };
        let context = extract_context(&ctx, ContextSource::Guided(answers)).await;
        assert!(context.contains("vegan cooking"));
        assert!(context.contains("educate"));
        assert!(context.contains("professional"));
    }

    #[tokio::test]
    async fn test_guided_context_defaults() {
        let ctx = ctx_with(MockBackend::fixed("unused"));
        let context =
            extract_context(&ctx, ContextSource::Guided(GuidedAnswers::default())).await;
        assert!(context.contains("general"));
        assert!(context.contains("entertain"));
        assert!(context.contains("friendly"));
    }

    #[test]
    fn test_visible_text_strips_tags() {
        let html = "<html><body><h1>Hello</h1><p>world &amp; more</p></body></html>";
        let text = visible_text(html);
        assert!(text.contains("Hello"));
        assert!(text.contains("world"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_visible_text_skips_script_and_style() {
        let html =
            "<p>keep</p><script>var hidden = 1;</script><style>.x{color:red}</style><p>also</p>";
        let text = visible_text(html);
        assert!(text.contains("keep"));
        assert!(text.contains("also"));
        assert!(!text.contains("hidden"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_visible_text_collapses_whitespace() {
        let text = visible_text("<div>a</div>\n\n<div>b</div>");
        assert_eq!(text, "a b");
    }
}
