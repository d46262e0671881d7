//! Pipeline orchestration.
//!
//! Runs the four stages in a fixed order: context processing, idea
//! generation, copy generation, visual prompts. Each stage reads the
//! accumulated [`PipelineState`] and appends its output. A stage failure is
//! captured into `state.error` and halts the run without tearing down the
//! state built so far; cancellation is checked between stages and aborts
//! with [`PipelineError::Cancelled`].

use crate::copywriting::generate_copy;
use crate::error::Result;
use crate::events::{emit, Event};
use crate::exec_ctx::ExecCtx;
use crate::ideas::generate_ideas;
use crate::render::render_or_placeholder;
use crate::types::{PipelineState, Visual};
use crate::visual::generate_visual_prompt;
use tracing::{info, warn};

/// The content generation pipeline.
///
/// Stateless by itself; all run state lives in the [`PipelineState`] that
/// flows through the stages.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentPipeline;

impl ContentPipeline {
    pub fn new() -> Self {
        ContentPipeline
    }

    /// Run all stages over an initial state seeded with the context.
    ///
    /// Returns `Err` only for cancellation; stage failures are reported
    /// through `state.error` on the returned state.
    pub async fn run(&self, ctx: &ExecCtx, mut state: PipelineState) -> Result<PipelineState> {
        ctx.check_cancelled()?;
        self.process_context(&mut state);

        ctx.check_cancelled()?;
        if !self.run_ideas(ctx, &mut state).await {
            return Ok(state);
        }

        ctx.check_cancelled()?;
        if !self.run_posts(ctx, &mut state).await {
            return Ok(state);
        }

        ctx.check_cancelled()?;
        self.run_visuals(ctx, &mut state).await;
        Ok(state)
    }

    /// Context is extracted before the pipeline starts; this stage exists
    /// as the seam where context enrichment would slot in.
    fn process_context(&self, state: &mut PipelineState) {
        info!(context_len = state.context.len(), "processing context");
    }

    /// Returns false when the stage failed and the run must halt.
    async fn run_ideas(&self, ctx: &ExecCtx, state: &mut PipelineState) -> bool {
        emit(&ctx.event_handler, Event::StageStart { stage: "generate_ideas" });
        match generate_ideas(ctx, &state.context).await {
            Ok(ideas) => {
                info!(count = ideas.len(), "ideas generated");
                state.ideas = ideas;
                emit(
                    &ctx.event_handler,
                    Event::StageEnd { stage: "generate_ideas", ok: true },
                );
                true
            }
            Err(e) => {
                warn!(error = %e, "idea generation failed");
                state.error = Some(format!("Error generating ideas: {}", e));
                emit(
                    &ctx.event_handler,
                    Event::StageEnd { stage: "generate_ideas", ok: false },
                );
                false
            }
        }
    }

    async fn run_posts(&self, ctx: &ExecCtx, state: &mut PipelineState) -> bool {
        emit(&ctx.event_handler, Event::StageStart { stage: "generate_posts" });
        let mut posts = Vec::with_capacity(state.ideas.len());
        for idea in &state.ideas {
            match generate_copy(ctx, idea, &state.context).await {
                Ok(post) => posts.push(post),
                Err(e) => {
                    warn!(title = %idea.title, error = %e, "copy generation failed");
                    state.error = Some(format!("Error generating posts: {}", e));
                    emit(
                        &ctx.event_handler,
                        Event::StageEnd { stage: "generate_posts", ok: false },
                    );
                    return false;
                }
            }
        }
        info!(count = posts.len(), "posts generated");
        state.posts = posts;
        emit(
            &ctx.event_handler,
            Event::StageEnd { stage: "generate_posts", ok: true },
        );
        true
    }

    /// Last stage; failure is recorded in `state.error` with nothing left
    /// to halt, so there is no success flag to return.
    async fn run_visuals(&self, ctx: &ExecCtx, state: &mut PipelineState) {
        emit(&ctx.event_handler, Event::StageStart { stage: "generate_visuals" });
        let mut visuals = Vec::with_capacity(state.ideas.len());
        for idea in &state.ideas {
            let description = match generate_visual_prompt(ctx, idea, &state.context).await {
                Ok(description) => description,
                Err(e) => {
                    warn!(title = %idea.title, error = %e, "visual prompt generation failed");
                    state.error = Some(format!("Error generating visual prompts: {}", e));
                    emit(
                        &ctx.event_handler,
                        Event::StageEnd { stage: "generate_visuals", ok: false },
                    );
                    return;
                }
            };
            let image = render_or_placeholder(ctx, &description).await;
            visuals.push(Visual { description, image });
        }
        info!(count = visuals.len(), "visuals generated");
        state.visuals = visuals;
        emit(
            &ctx.event_handler,
            Event::StageEnd { stage: "generate_visuals", ok: true },
        );
    }
}
