//! Event system for pipeline lifecycle hooks.
//!
//! Provides an optional, non-intrusive way to observe pipeline execution.
//! Stages emit events when they start, finish, and when a deterministic
//! fallback replaces model output. Users can implement [`EventHandler`]
//! to receive these events for logging or progress UIs.

use std::sync::Arc;

/// Events emitted during pipeline execution.
#[derive(Debug, Clone)]
pub enum Event {
    /// A stage has started executing.
    StageStart {
        /// Stage name (e.g. `"generate_ideas"`).
        stage: &'static str,
    },
    /// A stage has finished executing.
    StageEnd {
        /// Stage name.
        stage: &'static str,
        /// Whether the stage succeeded.
        ok: bool,
    },
    /// Malformed model output was replaced by a deterministic fallback.
    FallbackUsed {
        /// Stage name where the fallback fired.
        stage: &'static str,
        /// Why the model output was rejected.
        reason: String,
    },
    /// Image rendering failed and the placeholder was substituted.
    ImageFallback {
        /// Why rendering failed.
        reason: String,
    },
}

/// Handler for pipeline lifecycle events.
///
/// Entirely optional -- the pipeline works without an event handler.
///
/// # Example
///
/// ```
/// use postforge::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         match event {
///             Event::StageStart { stage } => println!("[start] {}", stage),
///             Event::StageEnd { stage, ok } => println!("[end] {} ok={}", stage, ok),
///             _ => {}
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Called when the pipeline emits an event.
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// # Example
///
/// ```
/// use postforge::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     if let Event::FallbackUsed { stage, reason } = event {
///         eprintln!("fallback in {}: {}", stage, reason);
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
