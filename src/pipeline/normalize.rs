//! Response normalization: coerce free-form model output into strict shapes.
//!
//! Every artifact goes through the same four steps, implemented once in
//! [`normalize`] and parameterized by an [`ArtifactShape`]:
//!
//! ```text
//! prompt(text prefix) ──▶ complete(prompt, budget) ──▶ decode ──┬─ Parsed(raw) ──▶ reshape
//!                                                              └─ Unparsed    ──▶ fallback
//! ```
//!
//! Decoding is strict structural JSON decoding into the shape's raw type,
//! after trimming and removing one outer Markdown code fence. A reply that
//! decodes but says little (an empty list, empty strings) is accepted as is;
//! only undecodable replies fall back. Fallbacks are pure functions of the
//! shape's parameters: no randomness and no second model call.
//!
//! Service errors from the completion call are *not* absorbed; they
//! propagate so callers can report "AI service unavailable".

use crate::error::GuruError;
use crate::output::{ConceptMap, Insights, Performance, Question, QuestionType};
use crate::pipeline::layout::{layout, Concept, Relationship};
use crate::pipeline::llm::CompletionProvider;
use crate::prompts;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

/// Outcome of decoding a completion as a shape's raw type.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Parsed(T),
    /// Decode failed; carries the decoder's message for logging.
    Unparsed(String),
}

/// Field decoders for scalars the model writes as either strings or numbers.
///
/// `"id": 1` and `"correct_answer": 4` are as common as their quoted forms;
/// both decode to the same string so one stray number cannot sink a reply.
pub mod scalar {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn to_text<E: Error>(value: Value) -> Result<Option<String>, E> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Bool(b) => Ok(Some(b.to_string())),
            other => Err(E::custom(format!("expected a string or number, got {other}"))),
        }
    }

    /// Required string; numbers and booleans are rendered as text.
    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        to_text(Value::deserialize(d)?)?
            .ok_or_else(|| D::Error::custom("expected a string, got null"))
    }

    /// Optional string; `null` is `None`.
    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        to_text(Value::deserialize(d)?)
    }

    /// Optional list of strings; each item may be a number.
    pub fn opt_string_list<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Vec<String>>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            Value::Array(items) => items
                .into_iter()
                .map(|item| {
                    to_text(item)?.ok_or_else(|| D::Error::custom("null in string list"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            other => Err(D::Error::custom(format!("expected a list, got {other}"))),
        }
    }
}

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```$").unwrap());

/// Remove one outer Markdown code fence, if the whole reply is fenced.
pub fn strip_code_fence(completion: &str) -> &str {
    let trimmed = completion.trim();
    match RE_OUTER_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

/// Strictly decode a completion as `T`.
pub fn decode_json<T: DeserializeOwned>(completion: &str) -> Decoded<T> {
    match serde_json::from_str(strip_code_fence(completion)) {
        Ok(v) => Decoded::Parsed(v),
        Err(e) => Decoded::Unparsed(e.to_string()),
    }
}

/// One generated artifact: how to ask for it, read it, and replace it.
pub trait ArtifactShape {
    /// What the reply is decoded into.
    type Raw: DeserializeOwned;
    /// The canonical artifact.
    type Output;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn max_tokens(&self) -> usize;

    fn prompt(&self, text: &str) -> String;

    fn decode(&self, completion: &str) -> Decoded<Self::Raw> {
        decode_json(completion)
    }

    fn reshape(&self, raw: Self::Raw) -> Self::Output;

    fn fallback(&self) -> Self::Output;
}

/// Run the prompt → complete → decode → reshape-or-fallback pipeline.
pub async fn normalize<S: ArtifactShape>(
    provider: &dyn CompletionProvider,
    shape: &S,
    text: &str,
) -> Result<S::Output, GuruError> {
    let prompt = shape.prompt(text);
    let completion = provider.complete(&prompt, shape.max_tokens()).await?;

    match shape.decode(&completion) {
        Decoded::Parsed(raw) => {
            debug!("{}: reply decoded ({} chars)", shape.name(), completion.len());
            Ok(shape.reshape(raw))
        }
        Decoded::Unparsed(reason) => {
            warn!(
                "{}: reply is not the expected JSON ({}); using fallback",
                shape.name(),
                reason
            );
            Ok(shape.fallback())
        }
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// The trimmed completion is the summary; it is never replaced.
#[derive(Debug, Clone)]
pub struct SummaryShape {
    pub max_tokens: usize,
}

impl Default for SummaryShape {
    fn default() -> Self {
        Self {
            max_tokens: prompts::SUMMARY_MAX_TOKENS,
        }
    }
}

impl ArtifactShape for SummaryShape {
    type Raw = String;
    type Output = String;

    fn name(&self) -> &'static str {
        "summary"
    }

    fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    fn prompt(&self, text: &str) -> String {
        prompts::summary_prompt(text)
    }

    fn decode(&self, completion: &str) -> Decoded<String> {
        Decoded::Parsed(completion.trim().to_string())
    }

    fn reshape(&self, raw: String) -> String {
        raw
    }

    fn fallback(&self) -> String {
        String::new()
    }
}

// ── Questions ────────────────────────────────────────────────────────────────

pub const FALLBACK_QUESTION: &str = "What is a key topic discussed in this document?";
pub const FALLBACK_OPTIONS: [&str; 4] = ["Topic A", "Topic B", "Topic C", "Topic D"];
pub const FALLBACK_EXPLANATION: &str = "Based on the document content analysis.";

/// Options kept per question.
pub const MAX_OPTIONS: usize = 4;

/// A question as the model wrote it. Every field may be missing or null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuestion {
    #[serde(default, deserialize_with = "scalar::opt_string")]
    pub question: Option<String>,
    #[serde(default, deserialize_with = "scalar::opt_string_list")]
    pub options: Option<Vec<String>>,
    #[serde(default, alias = "answer", deserialize_with = "scalar::opt_string")]
    pub correct_answer: Option<String>,
    #[serde(default, deserialize_with = "scalar::opt_string")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QuestionsShape {
    pub num_questions: usize,
}

impl ArtifactShape for QuestionsShape {
    type Raw = Vec<RawQuestion>;
    type Output = Vec<Question>;

    fn name(&self) -> &'static str {
        "questions"
    }

    fn max_tokens(&self) -> usize {
        prompts::QUESTIONS_MAX_TOKENS
    }

    fn prompt(&self, text: &str) -> String {
        prompts::questions_prompt(text, self.num_questions)
    }

    fn reshape(&self, raw: Vec<RawQuestion>) -> Vec<Question> {
        raw.into_iter()
            .take(self.num_questions)
            .enumerate()
            .map(|(i, q)| {
                let mut options = q.options.unwrap_or_default();
                options.truncate(MAX_OPTIONS);
                Question {
                    id: question_id(i),
                    kind: QuestionType::Mcq,
                    question: q.question.unwrap_or_default(),
                    options,
                    answer: q.correct_answer.unwrap_or_default(),
                    explanation: q.explanation.unwrap_or_default(),
                }
            })
            .collect()
    }

    fn fallback(&self) -> Vec<Question> {
        fallback_questions(self.num_questions)
    }
}

fn question_id(index: usize) -> String {
    format!("q{}", index + 1)
}

/// `n` generic placeholder questions with ids `q1..qn`.
pub fn fallback_questions(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| Question {
            id: question_id(i),
            kind: QuestionType::Mcq,
            question: FALLBACK_QUESTION.to_string(),
            options: FALLBACK_OPTIONS.iter().map(|s| s.to_string()).collect(),
            answer: FALLBACK_OPTIONS[0].to_string(),
            explanation: FALLBACK_EXPLANATION.to_string(),
        })
        .collect()
}

// ── Concepts ─────────────────────────────────────────────────────────────────

pub const FALLBACK_CONCEPTS: [&str; 4] = ["Learning", "Knowledge", "Understanding", "Education"];

/// The concept graph as the model wrote it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConceptGraph {
    #[serde(default)]
    pub concepts: Vec<Concept>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone)]
pub struct ConceptsShape {
    pub max_concepts: usize,
}

impl ArtifactShape for ConceptsShape {
    type Raw = RawConceptGraph;
    type Output = ConceptMap;

    fn name(&self) -> &'static str {
        "concepts"
    }

    fn max_tokens(&self) -> usize {
        prompts::CONCEPTS_MAX_TOKENS
    }

    fn prompt(&self, text: &str) -> String {
        prompts::concepts_prompt(text, self.max_concepts)
    }

    fn reshape(&self, raw: RawConceptGraph) -> ConceptMap {
        layout(&raw.concepts, &raw.relationships)
    }

    fn fallback(&self) -> ConceptMap {
        fallback_concepts()
    }
}

/// Fixed four-node placeholder graph, laid out like any model reply.
pub fn fallback_concepts() -> ConceptMap {
    let concepts: Vec<Concept> = FALLBACK_CONCEPTS
        .iter()
        .enumerate()
        .map(|(i, label)| Concept {
            id: format!("concept_{i}"),
            label: label.to_string(),
            importance: None,
        })
        .collect();
    let relationships = [Relationship {
        from: "concept_0".to_string(),
        to: "concept_1".to_string(),
        strength: Some(0.7),
    }];
    layout(&concepts, &relationships)
}

// ── Insights ─────────────────────────────────────────────────────────────────

pub const DEFAULT_ATTENTION_SCORE: u32 = 75;
pub const DEFAULT_UNDERSTANDING_SCORE: u32 = 70;
pub const DEFAULT_TIME_SPENT: f64 = 30.0;
pub const DEFAULT_COMPLETION_RATE: u32 = 80;

/// The insight lists as the model wrote them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInsights {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default, alias = "areasForImprovement")]
    pub areas_for_improvement: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InsightsShape {
    pub performance: Option<Performance>,
}

fn with_default_scores(raw: RawInsights) -> Insights {
    Insights {
        attention_score: DEFAULT_ATTENTION_SCORE,
        understanding_score: DEFAULT_UNDERSTANDING_SCORE,
        time_spent: DEFAULT_TIME_SPENT,
        completion_rate: DEFAULT_COMPLETION_RATE,
        strengths: raw.strengths,
        areas_for_improvement: raw.areas_for_improvement,
        recommendations: raw.recommendations,
    }
}

impl ArtifactShape for InsightsShape {
    type Raw = RawInsights;
    type Output = Insights;

    fn name(&self) -> &'static str {
        "insights"
    }

    fn max_tokens(&self) -> usize {
        prompts::INSIGHTS_MAX_TOKENS
    }

    fn prompt(&self, text: &str) -> String {
        prompts::insights_prompt(text, self.performance.as_ref())
    }

    /// Scores start from the defaults; performance, when given, replaces
    /// the understanding score and time spent.
    fn reshape(&self, raw: RawInsights) -> Insights {
        let mut insights = with_default_scores(raw);
        if let Some(p) = &self.performance {
            insights.understanding_score = p.understanding_score();
            insights.time_spent = p.time_spent;
        }
        insights
    }

    fn fallback(&self) -> Insights {
        fallback_insights()
    }
}

/// The fixed canned insight record. Performance never reaches it.
pub fn fallback_insights() -> Insights {
    with_default_scores(RawInsights {
        strengths: vec!["Good comprehension of main concepts".to_string()],
        areas_for_improvement: vec!["Could benefit from more detailed study".to_string()],
        recommendations: vec![
            "Review key concepts".to_string(),
            "Practice with examples".to_string(),
        ],
    })
}

// ── Entry points ─────────────────────────────────────────────────────────────

pub async fn generate_summary(
    provider: &dyn CompletionProvider,
    text: &str,
    max_tokens: usize,
) -> Result<String, GuruError> {
    normalize(provider, &SummaryShape { max_tokens }, text).await
}

pub async fn generate_questions(
    provider: &dyn CompletionProvider,
    text: &str,
    num_questions: usize,
) -> Result<Vec<Question>, GuruError> {
    normalize(provider, &QuestionsShape { num_questions }, text).await
}

pub async fn generate_concepts(
    provider: &dyn CompletionProvider,
    text: &str,
    max_concepts: usize,
) -> Result<ConceptMap, GuruError> {
    normalize(provider, &ConceptsShape { max_concepts }, text).await
}

pub async fn generate_insights(
    provider: &dyn CompletionProvider,
    text: &str,
    performance: Option<Performance>,
) -> Result<Insights, GuruError> {
    normalize(provider, &InsightsShape { performance }, text).await
}
