//! Progress-callback trait for learning-session stage events.
//!
//! Inject an [`Arc<dyn SessionProgressCallback>`] via
//! [`crate::config::GuruConfigBuilder::progress_callback`] to be told as
//! [`crate::service::LearningService::process`] works through its stages.
//!
//! ```rust
//! use pdf_guru::{GuruConfig, SessionProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl SessionProgressCallback for Counter {
//!     fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage} done in {elapsed_ms}ms");
//!     }
//! }
//!
//! let config = GuruConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use uuid::Uuid;

/// One generation step of a learning session, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Summary,
    Questions,
    Concepts,
    Insights,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Summary,
        Stage::Questions,
        Stage::Concepts,
        Stage::Insights,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Summary => "summary",
            Stage::Questions => "questions",
            Stage::Concepts => "concepts",
            Stage::Insights => "insights",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Called by the session pipeline around each stage.
///
/// All methods default to no-ops so implementors override only what they
/// need. Stages run sequentially, but the callback may be shared between
/// concurrent sessions, hence `Send + Sync`.
pub trait SessionProgressCallback: Send + Sync {
    /// Called once, before the first stage.
    fn on_session_start(&self, total_stages: usize) {
        let _ = total_stages;
    }

    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when a stage fails; the session is abandoned after this.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once the session has been assembled and registered.
    fn on_session_complete(&self, session_id: Uuid) {
        let _ = session_id;
    }
}

/// Does nothing. Used when no callback is configured.
pub struct NoopProgressCallback;

impl SessionProgressCallback for NoopProgressCallback {}
