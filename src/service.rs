//! Learning-session orchestration.
//!
//! [`LearningService`] ties the pipeline together: it stores uploads,
//! extracts them, asks the model for each artifact, and keeps the resulting
//! documents and sessions in two [`Store`]s. It is the surface a web layer
//! or the `pdfguru` CLI drives.
//!
//! Every model-backed operation first probes the service, so an unreachable
//! Ollama surfaces as [`GuruError::ServiceUnavailable`] before any prompt is
//! built.

use crate::config::{GuruConfig, ProgressCallback};
use crate::error::GuruError;
use crate::output::{
    ConceptMap, ExtractedDocument, HealthStatus, Insights, LearningSession, Performance, Question,
    SessionStatus, SummaryReport, UploadRecord,
};
use crate::pipeline::extract::{extract_document, PdfBackend, PdfiumBackend};
use crate::pipeline::llm::{CompletionProvider, OllamaClient};
use crate::pipeline::normalize;
use crate::progress::{NoopProgressCallback, Stage};
use crate::store::{MemoryStore, Store};
use chrono::Utc;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Highest value `progress` can hold.
pub const MAX_PROGRESS: u8 = 100;

/// Orchestrates uploads, artifact generation and session bookkeeping.
pub struct LearningService {
    config: GuruConfig,
    provider: Arc<dyn CompletionProvider>,
    backend: Arc<dyn PdfBackend>,
    progress: ProgressCallback,
    uploads: Arc<dyn Store<UploadRecord>>,
    sessions: Arc<dyn Store<LearningSession>>,
}

impl LearningService {
    /// Build a service with in-memory registries.
    pub fn new(config: GuruConfig) -> Result<Self, GuruError> {
        Self::with_stores(
            config,
            Arc::new(MemoryStore::<UploadRecord>::new()),
            Arc::new(MemoryStore::<LearningSession>::new()),
        )
    }

    /// Build a service over caller-supplied registries.
    pub fn with_stores(
        config: GuruConfig,
        uploads: Arc<dyn Store<UploadRecord>>,
        sessions: Arc<dyn Store<LearningSession>>,
    ) -> Result<Self, GuruError> {
        let provider = resolve_provider(&config)?;
        let backend = resolve_backend(&config);
        let progress = config
            .progress_callback
            .clone()
            .unwrap_or_else(|| Arc::new(NoopProgressCallback));

        Ok(Self {
            config,
            provider,
            backend,
            progress,
            uploads,
            sessions,
        })
    }

    pub fn config(&self) -> &GuruConfig {
        &self.config
    }

    /// Probe the model host. Never fails; `ollama_connected` carries the result.
    pub async fn health(&self) -> HealthStatus {
        let connected = self.provider.check_connection().await;
        debug!("Health probe: connected={}", connected);
        HealthStatus {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ollama_connected: connected,
            ollama_model: self.provider.model().to_string(),
        }
    }

    /// Extract a PDF in place, without storing or registering it.
    pub async fn inspect(&self, path: &Path) -> Result<ExtractedDocument, GuruError> {
        extract_document(Arc::clone(&self.backend), path, self.config.min_text_length).await
    }

    /// Store an uploaded PDF, extract it, and register it under a new id.
    ///
    /// The bytes land in `{upload_dir}/{pdf_id}.pdf`. If extraction fails
    /// the stored file is removed and nothing is registered.
    pub async fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadRecord, GuruError> {
        self.check_upload(filename, bytes.len())?;

        let pdf_id = Uuid::new_v4();
        let filepath = self.config.upload_dir.join(format!("{pdf_id}.pdf"));

        tokio::fs::create_dir_all(&self.config.upload_dir)
            .await
            .map_err(|source| GuruError::Io {
                path: self.config.upload_dir.clone(),
                source,
            })?;
        tokio::fs::write(&filepath, bytes)
            .await
            .map_err(|source| GuruError::Io {
                path: filepath.clone(),
                source,
            })?;
        info!("Stored upload '{}' as {}", filename, filepath.display());

        let document = match self.inspect(&filepath).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Extraction failed for '{}': {}", filename, e);
                if let Err(rm) = tokio::fs::remove_file(&filepath).await {
                    warn!("Could not remove {}: {}", filepath.display(), rm);
                }
                return Err(e);
            }
        };

        let record = UploadRecord {
            pdf_id,
            filename: filename.to_string(),
            filepath,
            upload_time: Utc::now(),
            document,
        };
        self.uploads.put(pdf_id, record.clone());
        info!(
            "Registered document {} ({} pages, {} words)",
            pdf_id, record.document.page_count, record.document.word_count
        );
        Ok(record)
    }

    /// Read a local file and [`upload`](Self::upload) it.
    pub async fn upload_path(&self, path: &Path) -> Result<UploadRecord, GuruError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => GuruError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => GuruError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => GuruError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.upload(&filename, &bytes).await
    }

    pub fn document(&self, pdf_id: Uuid) -> Result<UploadRecord, GuruError> {
        self.uploads
            .get(&pdf_id)
            .ok_or(GuruError::DocumentNotFound(pdf_id))
    }

    pub async fn summary(&self, pdf_id: Uuid) -> Result<SummaryReport, GuruError> {
        let doc = self.document(pdf_id)?.document;
        self.ensure_service().await?;

        let summary = normalize::generate_summary(
            self.provider.as_ref(),
            &doc.full_text,
            self.config.summary_max_tokens,
        )
        .await?;

        Ok(SummaryReport {
            pdf_id,
            title: doc.title,
            summary,
            word_count: doc.word_count,
            page_count: doc.page_count,
            reading_time: SummaryReport::reading_time_for(doc.word_count),
            generated_at: Utc::now(),
        })
    }

    pub async fn questions(&self, pdf_id: Uuid) -> Result<Vec<Question>, GuruError> {
        let doc = self.document(pdf_id)?.document;
        self.ensure_service().await?;
        normalize::generate_questions(
            self.provider.as_ref(),
            &doc.full_text,
            self.config.num_questions,
        )
        .await
    }

    pub async fn concepts(&self, pdf_id: Uuid) -> Result<ConceptMap, GuruError> {
        let doc = self.document(pdf_id)?.document;
        self.ensure_service().await?;
        normalize::generate_concepts(
            self.provider.as_ref(),
            &doc.full_text,
            self.config.max_concepts,
        )
        .await
    }

    pub async fn insights(
        &self,
        pdf_id: Uuid,
        performance: Option<Performance>,
    ) -> Result<Insights, GuruError> {
        let doc = self.document(pdf_id)?.document;
        self.ensure_service().await?;
        normalize::generate_insights(self.provider.as_ref(), &doc.full_text, performance).await
    }

    /// Generate every artifact for a document and register the session.
    ///
    /// Stages run one after another; the first failing stage aborts the
    /// session and nothing is registered.
    pub async fn process(&self, pdf_id: Uuid) -> Result<LearningSession, GuruError> {
        let doc = self.document(pdf_id)?.document;
        self.ensure_service().await?;

        let provider = self.provider.as_ref();
        let text = doc.full_text.as_str();
        let start = Instant::now();
        self.progress.on_session_start(Stage::ALL.len());

        let summary = self
            .stage(
                Stage::Summary,
                normalize::generate_summary(provider, text, self.config.summary_max_tokens),
            )
            .await?;
        let questions = self
            .stage(
                Stage::Questions,
                normalize::generate_questions(provider, text, self.config.num_questions),
            )
            .await?;
        let concept_map = self
            .stage(
                Stage::Concepts,
                normalize::generate_concepts(provider, text, self.config.max_concepts),
            )
            .await?;
        let insights = self
            .stage(
                Stage::Insights,
                normalize::generate_insights(provider, text, None),
            )
            .await?;

        let session = LearningSession {
            id: Uuid::new_v4(),
            pdf_id,
            title: doc.title,
            summary,
            questions,
            concept_map,
            insights,
            progress: 0,
            status: SessionStatus::Completed,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.sessions.put(session.id, session.clone());
        self.progress.on_session_complete(session.id);
        info!(
            "Session {} ready for document {} in {:?}",
            session.id,
            pdf_id,
            start.elapsed()
        );
        Ok(session)
    }

    /// Blocking wrapper around [`process`](Self::process).
    ///
    /// Creates a temporary tokio runtime, so it must not be called from
    /// inside an async context.
    pub fn process_sync(&self, pdf_id: Uuid) -> Result<LearningSession, GuruError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| GuruError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.process(pdf_id))
    }

    pub fn session(&self, session_id: Uuid) -> Result<LearningSession, GuruError> {
        self.sessions
            .get(&session_id)
            .ok_or(GuruError::SessionNotFound(session_id))
    }

    /// Record learner progress, capped at [`MAX_PROGRESS`].
    pub fn update_progress(
        &self,
        session_id: Uuid,
        progress: u32,
    ) -> Result<LearningSession, GuruError> {
        let value = progress.min(MAX_PROGRESS as u32) as u8;
        let now = Utc::now();
        self.sessions
            .update(&session_id, &mut |s| {
                s.progress = value;
                s.updated_at = Some(now);
            })
            .ok_or(GuruError::SessionNotFound(session_id))
    }

    fn check_upload(&self, filename: &str, size: usize) -> Result<(), GuruError> {
        if filename.trim().is_empty() {
            return Err(GuruError::InvalidUpload("No file selected".into()));
        }

        let ext = Path::new(filename)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        match ext {
            Some(ext) if self.config.allowed_extensions.contains(&ext) => {}
            _ => {
                return Err(GuruError::InvalidUpload(format!(
                    "Invalid file type '{}'. Allowed: {}",
                    filename,
                    self.config.allowed_extensions.join(", ")
                )))
            }
        }

        if size > self.config.max_upload_bytes {
            return Err(GuruError::UploadTooLarge {
                size,
                limit: self.config.max_upload_bytes,
            });
        }
        Ok(())
    }

    async fn ensure_service(&self) -> Result<(), GuruError> {
        if self.provider.check_connection().await {
            Ok(())
        } else {
            Err(GuruError::ServiceUnavailable {
                url: self.config.base_url.clone(),
                reason: "health probe failed".into(),
            })
        }
    }

    async fn stage<T, F>(&self, stage: Stage, work: F) -> Result<T, GuruError>
    where
        F: Future<Output = Result<T, GuruError>>,
    {
        self.progress.on_stage_start(stage);
        let start = Instant::now();
        match work.await {
            Ok(v) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                debug!("Stage {} done in {}ms", stage, elapsed_ms);
                self.progress.on_stage_complete(stage, elapsed_ms);
                Ok(v)
            }
            Err(e) => {
                warn!("Stage {} failed: {}", stage, e);
                self.progress.on_stage_error(stage, &e.to_string());
                Err(e)
            }
        }
    }
}

/// An injected provider wins; otherwise talk to Ollama at `base_url`.
fn resolve_provider(config: &GuruConfig) -> Result<Arc<dyn CompletionProvider>, GuruError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }
    info!("Using Ollama at {} (model {})", config.base_url, config.model);
    Ok(Arc::new(OllamaClient::new(config)?))
}

/// An injected backend wins; otherwise pdfium.
fn resolve_backend(config: &GuruConfig) -> Arc<dyn PdfBackend> {
    if let Some(ref backend) = config.pdf_backend {
        return Arc::clone(backend);
    }
    match config.pdfium_lib_path {
        Some(ref path) => Arc::new(PdfiumBackend::with_library_path(path.clone())),
        None => Arc::new(PdfiumBackend::default()),
    }
}
