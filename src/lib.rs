//! # Postforge
//!
//! Instagram content generation pipeline: context extraction, ideas, copy,
//! and visuals with deterministic fallbacks.
//!
//! This crate turns heterogeneous user input (free text, a URL, an uploaded
//! image, or a guided questionnaire) into a full content package: exactly
//! five post ideas, a complete post per idea, and an image prompt per idea,
//! optionally rendered to PNG bytes. Malformed model output never fails a
//! request; every JSON stage carries a deterministic fallback.
//!
//! ## Core Concepts
//!
//! - **[`ExecCtx`]** — shared execution context (HTTP client, backend,
//!   optional image renderer, model names, cancellation, event handler).
//! - **[`TextBackend`](backend::TextBackend)** — object-safe trait over the
//!   text/vision model; [`GeminiBackend`](backend::GeminiBackend) in
//!   production, [`MockBackend`](backend::MockBackend) in tests.
//! - **[`ContentPipeline`]** — the fixed four-stage orchestrator over a
//!   per-request [`PipelineState`].
//! - **[`service`]** — the request-level contract: validation, pipeline
//!   invocation, response assembly, the guided questionnaire.
//!
//! ## Quick Start
//!
//! ```no_run
//! use postforge::{Config, GenerateRequest};
//! use postforge::service::generate_content;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = Config::from_env()?.build_ctx();
//!
//!     let request = GenerateRequest {
//!         input_type: "text".to_string(),
//!         content: Some("Specialty coffee roasting for home brewers".to_string()),
//!         ..Default::default()
//!     };
//!
//!     let response = generate_content(&ctx, request).await?;
//!     for (idea, post) in response.ideas.iter().zip(&response.posts) {
//!         println!("{}: {}", idea.title, post.hook);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod copywriting;
pub mod error;
pub mod events;
pub mod exec_ctx;
pub mod extract;
pub mod ideas;
pub mod parsing;
pub mod pipeline;
pub mod render;
pub mod service;
pub mod types;
pub mod visual;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use events::{Event, EventHandler, FnEventHandler};
pub use exec_ctx::{ExecCtx, ExecCtxBuilder, ModelNames};
pub use extract::ContextSource;
pub use pipeline::ContentPipeline;
pub use service::{ApiError, GenerateRequest};
pub use types::{ContentResponse, GuidedAnswers, Idea, PipelineState, Post, Visual};
