//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn AnnotationProgressCallback>`] via
//! [`crate::config::AnnotationConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves from one stage to the next. The CLI uses it
//! to drive a spinner; a server could forward the events to a websocket.
//!
//! # Example
//!
//! ```rust
//! use paper2abstract::{AnnotationConfig, AnnotationProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Logger;
//!
//! impl AnnotationProgressCallback for Logger {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("→ {}", stage);
//!     }
//! }
//!
//! let config = AnnotationConfig::builder()
//!     .progress_callback(Arc::new(Logger))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// A step of the annotation pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Reading the file, stdin, or URL.
    Resolve,
    /// Pulling the text layer out of a PDF.
    Extract,
    /// Running the cleaning pass.
    Clean,
    /// Waiting for the completion endpoint.
    Annotate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Resolve => "reading input",
            Stage::Extract => "extracting text",
            Stage::Clean => "cleaning text",
            Stage::Annotate => "generating annotation",
        };
        f.write_str(s)
    }
}

/// Called by the pipeline as it runs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait AnnotationProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    ///
    /// # Arguments
    /// * `stage` — the stage that finished
    /// * `chars` — character count of the stage's output (text length for
    ///   `Extract`/`Clean`/`Annotate`, input length for `Resolve`)
    fn on_stage_complete(&self, stage: Stage, chars: usize) {
        let _ = (stage, chars);
    }

    /// Called when a stage fails; the pipeline stops after this event.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnnotationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnnotationConfig`].
pub type ProgressCallback = Arc<dyn AnnotationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCallback {
        events: Mutex<Vec<String>>,
    }

    impl AnnotationProgressCallback for RecordingCallback {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start:{stage:?}"));
        }

        fn on_stage_complete(&self, stage: Stage, chars: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done:{stage:?}:{chars}"));
        }

        fn on_stage_error(&self, stage: Stage, error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error:{stage:?}:{error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Resolve);
        cb.on_stage_complete(Stage::Clean, 42);
        cb.on_stage_error(Stage::Annotate, "boom");
    }

    #[test]
    fn recording_callback_receives_events_in_order() {
        let cb = RecordingCallback::default();
        cb.on_stage_start(Stage::Clean);
        cb.on_stage_complete(Stage::Clean, 10);
        cb.on_stage_error(Stage::Annotate, "HTTP 500");

        let events = cb.events.lock().unwrap();
        assert_eq!(
            *events,
            vec!["start:Clean", "done:Clean:10", "error:Annotate:HTTP 500"]
        );
    }

    #[test]
    fn stage_display_is_human_readable() {
        assert_eq!(Stage::Annotate.to_string(), "generating annotation");
        assert_eq!(Stage::Extract.to_string(), "extracting text");
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::Extract);
    }
}
