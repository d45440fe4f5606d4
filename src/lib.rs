//! # pdf-guru
//!
//! Turn a PDF into a learning session: a summary, multiple-choice questions,
//! a 3D concept map and study insights, generated by a local Ollama model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract   page text + metadata via pdfium (spawn_blocking)
//!  ├─ 2. Clean     strip extraction artifacts, count words
//!  ├─ 3. Prompt    bounded text prefix per artifact
//!  ├─ 4. Complete  Ollama /api/generate, one call per artifact
//!  ├─ 5. Normalize strict JSON decode, deterministic fallback otherwise
//!  └─ 6. Layout    concept nodes on a circle, height by importance
//! ```
//!
//! Model replies are untrusted: a reply that is not the JSON asked for is
//! replaced by a fixed placeholder rather than reported as an error. Only
//! document problems and an unreachable or failing model host are errors
//! (see [`GuruError`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_guru::{GuruConfig, LearningService};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = LearningService::new(GuruConfig::from_env()?)?;
//!     let upload = service.upload_path(Path::new("lecture.pdf")).await?;
//!     let session = service.process(upload.pdf_id).await?;
//!     println!("{}", session.summary);
//!     for q in &session.questions {
//!         println!("{} {}", q.id, q.question);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfguru` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ```toml
//! pdf-guru = { version = "2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod service;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GuruConfig, GuruConfigBuilder, ProgressCallback};
pub use error::GuruError;
pub use output::{
    ConceptEdge, ConceptMap, ConceptNode, ExtractedDocument, HealthStatus, Insights,
    LearningSession, Performance, Question, QuestionType, SessionStatus, SummaryReport,
    UploadRecord,
};
pub use pipeline::clean::{chunk_text, clean};
pub use pipeline::extract::{extract_document, PdfBackend, PdfiumBackend, RawPdf};
pub use pipeline::layout::{layout, Concept, Relationship};
pub use pipeline::llm::{CompletionProvider, OllamaClient};
pub use pipeline::normalize::{
    fallback_concepts, fallback_insights, fallback_questions, generate_concepts,
    generate_insights, generate_questions, generate_summary,
};
pub use progress::{NoopProgressCallback, SessionProgressCallback, Stage};
pub use service::LearningService;
pub use store::{MemoryStore, Store};
