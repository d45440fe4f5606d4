//! Integration tests for `LearningService` with in-process fakes.
//!
//! The PDF backend and the completion provider are both scripted, so these
//! run without pdfium or Ollama.

use async_trait::async_trait;
use parking_lot::Mutex;
use pdf_guru::pipeline::extract::PdfInfo;
use pdf_guru::{
    fallback_concepts, GuruConfig, GuruError, LearningService, PdfBackend, Performance, RawPdf,
    SessionProgressCallback, Stage, CompletionProvider,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Returns the same pages for every file.
struct FakePdf {
    pages: Vec<String>,
    title: Option<String>,
}

impl FakePdf {
    fn words(n: usize) -> Self {
        let words: Vec<String> = (0..n).map(|i| format!("term{i}")).collect();
        let half = n / 2;
        Self {
            pages: vec![words[..half].join(" "), words[half..].join(" ")],
            title: Some("Thermodynamics Notes".into()),
        }
    }
}

impl PdfBackend for FakePdf {
    fn read(&self, _path: &Path) -> Result<RawPdf, GuruError> {
        Ok(RawPdf {
            pages: self.pages.clone(),
            info: PdfInfo {
                title: self.title.clone(),
                ..Default::default()
            },
        })
    }
}

/// Answers by recognising which artifact a prompt asks for.
struct Scripted {
    online: AtomicBool,
    summary: String,
    questions: String,
    concepts: String,
    insights: String,
    prompts: Mutex<Vec<String>>,
}

impl Scripted {
    fn well_behaved() -> Self {
        Self {
            online: AtomicBool::new(true),
            summary: "  Heat flows from hot to cold.  ".into(),
            questions: r#"[
                {"question": "What flows from hot to cold?", "options": ["Heat", "Mass", "Charge", "Time"], "correct_answer": "Heat", "explanation": "Second law."},
                {"question": "Which quantity is conserved?", "options": ["Energy", "Entropy"], "correct_answer": "Energy", "explanation": "First law."}
            ]"#
            .into(),
            concepts: r#"```json
{"concepts": [{"id": "c1", "label": "Heat", "importance": 0.9}, {"id": "c2", "label": "Entropy", "importance": 0.7}],
 "relationships": [{"from": "c1", "to": "c2", "strength": 0.8}]}
```"#
                .into(),
            insights: r#"{"strengths": ["Definitions"], "areas_for_improvement": ["Cycles"], "recommendations": ["Redo exercises"]}"#.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionProvider for Scripted {
    async fn complete(&self, prompt: &str, _max_tokens: usize) -> Result<String, GuruError> {
        self.prompts.lock().push(prompt.to_string());
        let reply = if prompt.ends_with("Summary:") {
            &self.summary
        } else if prompt.ends_with("Questions (JSON):") {
            &self.questions
        } else if prompt.ends_with("Concepts (JSON):") {
            &self.concepts
        } else if prompt.ends_with("Insights (JSON):") {
            &self.insights
        } else {
            panic!("unexpected prompt: {prompt}");
        };
        Ok(reply.trim().to_string())
    }

    async fn check_connection(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
struct StageLog {
    started: AtomicUsize,
    completed: Mutex<Vec<Stage>>,
    finished: Mutex<Option<Uuid>>,
}

impl SessionProgressCallback for StageLog {
    fn on_session_start(&self, total_stages: usize) {
        self.started.store(total_stages, Ordering::SeqCst);
    }

    fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
        self.completed.lock().push(stage);
    }

    fn on_session_complete(&self, session_id: Uuid) {
        *self.finished.lock() = Some(session_id);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

const PDF_BYTES: &[u8] = b"%PDF-1.7\n% fake body, the backend is scripted\n";

struct Harness {
    service: LearningService,
    provider: Arc<Scripted>,
    progress: Arc<StageLog>,
    dir: tempfile::TempDir,
}

fn harness(pdf: FakePdf, provider: Scripted) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(provider);
    let progress = Arc::new(StageLog::default());
    let config = GuruConfig::builder()
        .upload_dir(dir.path())
        .provider(provider.clone())
        .pdf_backend(Arc::new(pdf))
        .progress_callback(progress.clone())
        .build()
        .unwrap();
    Harness {
        service: LearningService::new(config).unwrap(),
        provider,
        progress,
        dir,
    }
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_registers_extracted_document() {
    let h = harness(FakePdf::words(250), Scripted::well_behaved());

    let record = h.service.upload("notes.pdf", PDF_BYTES).await.unwrap();
    assert_eq!(record.filename, "notes.pdf");
    assert_eq!(record.document.word_count, 250);
    assert_eq!(record.document.page_count, 2);
    assert_eq!(record.document.title, "Thermodynamics Notes");
    assert_eq!(record.document.author, "Unknown");
    assert!(record.filepath.starts_with(h.dir.path()));
    assert!(record.filepath.exists());

    let again = h.service.document(record.pdf_id).unwrap();
    assert_eq!(again, record);
}

#[tokio::test]
async fn summary_report_carries_document_figures() {
    let h = harness(FakePdf::words(250), Scripted::well_behaved());
    let record = h.service.upload("notes.pdf", PDF_BYTES).await.unwrap();

    let report = h.service.summary(record.pdf_id).await.unwrap();
    assert_eq!(report.summary, "Heat flows from hot to cold.");
    assert_eq!(report.word_count, 250);
    assert_eq!(report.page_count, 2);
    assert_eq!(report.reading_time, 1);
    assert_eq!(report.title, "Thermodynamics Notes");
}

#[tokio::test]
async fn process_builds_and_registers_session() {
    let h = harness(FakePdf::words(250), Scripted::well_behaved());
    let record = h.service.upload("notes.pdf", PDF_BYTES).await.unwrap();

    let session = h.service.process(record.pdf_id).await.unwrap();
    assert_eq!(session.pdf_id, record.pdf_id);
    assert_eq!(session.progress, 0);
    assert!(session.updated_at.is_none());
    assert_eq!(session.questions.len(), 2);
    assert_eq!(session.questions[1].id, "q2");
    assert_eq!(session.concept_map.nodes.len(), 2);
    assert_eq!(session.concept_map.edges[0].strength, 0.8);
    assert_eq!(session.insights.strengths, vec!["Definitions"]);
    assert_eq!(session.insights.understanding_score, 70);

    assert_eq!(h.service.session(session.id).unwrap(), session);
    assert_eq!(h.provider.prompts.lock().len(), 4);

    assert_eq!(h.progress.started.load(Ordering::SeqCst), 4);
    assert_eq!(*h.progress.completed.lock(), Stage::ALL.to_vec());
    assert_eq!(*h.progress.finished.lock(), Some(session.id));
}

#[tokio::test]
async fn session_json_uses_frontend_field_names() {
    let h = harness(FakePdf::words(250), Scripted::well_behaved());
    let record = h.service.upload("notes.pdf", PDF_BYTES).await.unwrap();
    let session = h.service.process(record.pdf_id).await.unwrap();

    let json = serde_json::to_value(&session).unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["questions"][0]["type"], "mcq");
    assert_eq!(json["questions"][0]["answer"], "Heat");
    assert!(json["concept_map"]["nodes"][0]["position"].is_array());
    assert!(json["insights"]["areas_for_improvement"].is_array());
    assert!(json.get("updated_at").is_none());
}

#[tokio::test]
async fn progress_update_is_clamped() {
    let h = harness(FakePdf::words(250), Scripted::well_behaved());
    let record = h.service.upload("notes.pdf", PDF_BYTES).await.unwrap();
    let session = h.service.process(record.pdf_id).await.unwrap();

    let updated = h.service.update_progress(session.id, 40).unwrap();
    assert_eq!(updated.progress, 40);
    assert!(updated.updated_at.is_some());

    let updated = h.service.update_progress(session.id, 150).unwrap();
    assert_eq!(updated.progress, 100);
    assert_eq!(h.service.session(session.id).unwrap().progress, 100);
}

#[tokio::test]
async fn service_down_is_unavailable() {
    let provider = Scripted::well_behaved();
    provider.online.store(false, Ordering::SeqCst);
    let h = harness(FakePdf::words(250), provider);
    let record = h.service.upload("notes.pdf", PDF_BYTES).await.unwrap();

    let err = h.service.process(record.pdf_id).await.unwrap_err();
    assert!(matches!(err, GuruError::ServiceUnavailable { .. }), "{err:?}");
    assert_eq!(err.http_status(), 503);
    assert!(err.to_string().contains("ollama serve"));
    assert!(h.provider.prompts.lock().is_empty());

    let health = h.service.health().await;
    assert!(!health.ollama_connected);
}

#[tokio::test]
async fn prose_concepts_reply_gives_fixed_graph() {
    let mut provider = Scripted::well_behaved();
    provider.concepts = "The main ideas are heat and entropy.".into();
    let h = harness(FakePdf::words(250), provider);
    let record = h.service.upload("notes.pdf", PDF_BYTES).await.unwrap();

    let map = h.service.concepts(record.pdf_id).await.unwrap();
    assert_eq!(map, fallback_concepts());
    assert_eq!(map.nodes.len(), 4);
    assert_eq!(map.nodes[0].label, "Learning");
}

#[tokio::test]
async fn prose_questions_reply_gives_placeholders() {
    let mut provider = Scripted::well_behaved();
    provider.questions = "Q1: What is heat?".into();
    let h = harness(FakePdf::words(250), provider);
    let record = h.service.upload("notes.pdf", PDF_BYTES).await.unwrap();

    let questions = h.service.questions(record.pdf_id).await.unwrap();
    let ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, ["q1", "q2", "q3", "q4", "q5"]);
}

#[tokio::test]
async fn insights_use_performance() {
    let h = harness(FakePdf::words(250), Scripted::well_behaved());
    let record = h.service.upload("notes.pdf", PDF_BYTES).await.unwrap();
    let perf = Performance::from_json_lenient(
        r#"{"questions_answered": 4, "correct_answers": 3, "time_spent": 25}"#,
    );

    let insights = h.service.insights(record.pdf_id, perf).await.unwrap();
    assert_eq!(insights.understanding_score, 75);
    assert_eq!(insights.time_spent, 25.0);
    assert_eq!(insights.attention_score, 75);
}

#[tokio::test]
async fn short_document_is_rejected_and_removed() {
    let pdf = FakePdf {
        pages: vec!["Too short to study.".into()],
        title: None,
    };
    let h = harness(pdf, Scripted::well_behaved());

    let err = h.service.upload("tiny.pdf", PDF_BYTES).await.unwrap_err();
    assert!(matches!(err, GuruError::InsufficientContent { .. }), "{err:?}");
    assert_eq!(err.http_status(), 400);
    assert_eq!(files_in(h.dir.path()), 0);
}

#[tokio::test]
async fn non_pdf_bytes_are_rejected() {
    let h = harness(FakePdf::words(250), Scripted::well_behaved());
    let err = h
        .service
        .upload("fake.pdf", b"GIF89a not a pdf at all")
        .await
        .unwrap_err();
    assert!(matches!(err, GuruError::NotAPdf { .. }), "{err:?}");
    assert_eq!(files_in(h.dir.path()), 0);
}

#[tokio::test]
async fn wrong_extension_is_rejected_before_storing() {
    let h = harness(FakePdf::words(250), Scripted::well_behaved());
    let err = h.service.upload("notes.docx", PDF_BYTES).await.unwrap_err();
    assert!(matches!(err, GuruError::InvalidUpload(_)));
    assert_eq!(files_in(h.dir.path()), 0);
}

#[tokio::test]
async fn upload_path_reads_local_file() {
    let h = harness(FakePdf::words(250), Scripted::well_behaved());
    let src = tempfile::tempdir().unwrap();
    let path = src.path().join("lecture.pdf");
    std::fs::write(&path, PDF_BYTES).unwrap();

    let record = h.service.upload_path(&path).await.unwrap();
    assert_eq!(record.filename, "lecture.pdf");

    let missing = h
        .service
        .upload_path(&src.path().join("missing.pdf"))
        .await
        .unwrap_err();
    assert!(matches!(missing, GuruError::FileNotFound { .. }));
}

#[test]
fn process_sync_outside_runtime() {
    let h = harness(FakePdf::words(250), Scripted::well_behaved());
    let rt = tokio::runtime::Runtime::new().unwrap();
    let record = rt
        .block_on(h.service.upload("notes.pdf", PDF_BYTES))
        .unwrap();
    drop(rt);

    let session = h.service.process_sync(record.pdf_id).unwrap();
    assert_eq!(session.pdf_id, record.pdf_id);
}
