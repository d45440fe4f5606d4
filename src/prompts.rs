//! Prompt templates for the four generated artifacts.
//!
//! Every prompt embeds a bounded prefix of the document text so request size
//! stays predictable regardless of document length. The prefix lengths and
//! token budgets are the contract the normalizers rely on; the wording
//! around them can change freely.

use crate::output::Performance;
use crate::pipeline::clean::char_prefix;

/// Characters of document text embedded in the summary prompt.
pub const SUMMARY_TEXT_CHARS: usize = 3000;
/// Characters of document text embedded in the questions prompt.
pub const QUESTIONS_TEXT_CHARS: usize = 2500;
/// Characters of document text embedded in the concepts prompt.
pub const CONCEPTS_TEXT_CHARS: usize = 2000;
/// Characters of document text embedded in the insights prompt.
pub const INSIGHTS_TEXT_CHARS: usize = 1000;

/// Token budget for the summary completion.
pub const SUMMARY_MAX_TOKENS: usize = 500;
/// Token budget for the questions completion.
pub const QUESTIONS_MAX_TOKENS: usize = 800;
/// Token budget for the concepts completion.
pub const CONCEPTS_MAX_TOKENS: usize = 600;
/// Token budget for the insights completion.
pub const INSIGHTS_MAX_TOKENS: usize = 400;

pub fn summary_prompt(text: &str) -> String {
    format!(
        r#"Write a comprehensive summary of the document below for a student. Cover:
1. The main topics and themes
2. The key concepts and ideas
3. Important findings or conclusions
4. Practical applications or implications

Aim for 200-400 words of plain prose.

Document text:
{}...

Summary:"#,
        char_prefix(text, SUMMARY_TEXT_CHARS)
    )
}

pub fn questions_prompt(text: &str, num_questions: usize) -> String {
    format!(
        r#"Write {num_questions} multiple-choice questions that test understanding of the document below.
Each question needs the question text, exactly four options, the correct option, and a short explanation.

Reply with ONLY a JSON array in this shape:
[
  {{
    "question": "Question text?",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correct_answer": "Option A",
    "explanation": "Why Option A is correct"
  }}
]

Document text:
{}...

Questions (JSON):"#,
        char_prefix(text, QUESTIONS_TEXT_CHARS)
    )
}

pub fn concepts_prompt(text: &str, max_concepts: usize) -> String {
    format!(
        r#"Identify the key concepts in the document below and how they relate.
Reply with ONLY a JSON object in this shape:
{{
  "concepts": [
    {{"id": "concept1", "label": "Concept name", "importance": 0.9}},
    {{"id": "concept2", "label": "Another concept", "importance": 0.6}}
  ],
  "relationships": [
    {{"from": "concept1", "to": "concept2", "strength": 0.7, "type": "related_to"}}
  ]
}}

List at most {max_concepts} concepts. Importance and strength are numbers between 0.1 and 1.0.

Document text:
{}...

Concepts (JSON):"#,
        char_prefix(text, CONCEPTS_TEXT_CHARS)
    )
}

pub fn insights_prompt(text: &str, performance: Option<&Performance>) -> String {
    let performance_block = performance
        .map(|p| {
            format!(
                "\nLearner performance:\n- Questions answered: {}\n- Correct answers: {}\n- Time spent: {} minutes\n",
                p.questions_answered, p.correct_answers, p.time_spent
            )
        })
        .unwrap_or_default();

    format!(
        r#"Give learning insights and recommendations for a student studying the document below.
{performance_block}
Document excerpt: {}...

Address areas that need more attention, strengths to build on, next learning steps and study strategies.

Reply with ONLY a JSON object in this shape:
{{
  "strengths": ["strength 1", "strength 2"],
  "areas_for_improvement": ["area 1", "area 2"],
  "recommendations": ["step 1", "step 2", "step 3"]
}}

Insights (JSON):"#,
        char_prefix(text, INSIGHTS_TEXT_CHARS)
    )
}
