//! Data model: the extracted document, the four generated artifacts and the
//! learning session that aggregates them.
//!
//! Every type serialises with snake_case field names, which is the wire shape
//! the learning front-end consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Cleaned text and metadata of one uploaded PDF.
///
/// Built once by [`crate::pipeline::extract`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Cleaned concatenation of all pages.
    pub full_text: String,
    /// Cleaned text of each page, in page order.
    pub page_texts: Vec<String>,
    pub page_count: usize,
    pub word_count: usize,
    pub title: String,
    pub author: String,
    pub subject: String,
    pub creator: String,
}

/// Question kind. Only multiple choice is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Mcq,
}

/// A generated multiple-choice question.
///
/// `answer` is whatever the model named as correct; it is not checked
/// against `options`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Positional id: `q1`, `q2`, …
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub question: String,
    /// At most four options.
    pub options: Vec<String>,
    pub answer: String,
    pub explanation: String,
}

/// A laid-out concept ready for 3D rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptNode {
    pub id: String,
    pub label: String,
    pub importance: f64,
    /// `[x, y, z]`
    pub position: [f64; 3],
    pub color: String,
    pub size: f64,
}

/// A relationship between two concepts. Endpoints may dangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptEdge {
    pub from: String,
    pub to: String,
    pub strength: f64,
}

/// Concept graph produced by [`crate::pipeline::layout::layout`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptMap {
    pub nodes: Vec<ConceptNode>,
    pub edges: Vec<ConceptEdge>,
}

/// Learning insights with fixed-shape scores and free-text lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub attention_score: u32,
    pub understanding_score: u32,
    /// Minutes; fractional values are kept.
    pub time_spent: f64,
    pub completion_rate: u32,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Quiz performance reported by the learner.
///
/// Every field is a plain JSON number, so `4`, `4.0` and `12.5` all decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Performance {
    pub questions_answered: f64,
    pub correct_answers: f64,
    /// Minutes.
    pub time_spent: f64,
}

impl Performance {
    /// Parse a performance JSON object, discarding it when malformed.
    pub fn from_json_lenient(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!("Ignoring malformed performance data: {}", e);
                None
            }
        }
    }

    /// `round(correct / answered * 100)`; fewer than one answered counts as one.
    pub fn understanding_score(&self) -> u32 {
        let answered = self.questions_answered.max(1.0);
        (self.correct_answers / answered * 100.0).round().max(0.0) as u32
    }
}

/// Lifecycle status of a learning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Completed,
}

/// Everything generated for one document, plus learner progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningSession {
    pub id: Uuid,
    pub pdf_id: Uuid,
    pub title: String,
    pub summary: String,
    pub questions: Vec<Question>,
    pub concept_map: ConceptMap,
    pub insights: Insights,
    /// 0–100.
    pub progress: u8,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A stored upload and the document extracted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub pdf_id: Uuid,
    /// Name the client supplied.
    pub filename: String,
    /// Where the bytes were stored.
    pub filepath: PathBuf,
    pub upload_time: DateTime<Utc>,
    pub document: ExtractedDocument,
}

/// Summary plus the document figures shown next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub pdf_id: Uuid,
    pub title: String,
    pub summary: String,
    pub word_count: usize,
    pub page_count: usize,
    /// Estimated minutes at 200 words per minute, at least 1.
    pub reading_time: usize,
    pub generated_at: DateTime<Utc>,
}

impl SummaryReport {
    pub fn reading_time_for(word_count: usize) -> usize {
        (word_count / 200).max(1)
    }
}

/// Result of a health probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub ollama_connected: bool,
    pub ollama_model: String,
}
