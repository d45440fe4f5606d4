//! Configuration for the learning-session pipeline.
//!
//! Every knob lives in [`GuruConfig`], built via [`GuruConfigBuilder`] or read
//! from the environment with [`GuruConfig::from_env`]. Collaborators that are
//! normally constructed from the config (the Ollama client, the pdfium
//! backend) can be injected pre-built, which is how tests swap in fakes.

use crate::error::GuruError;
use crate::pipeline::extract::PdfBackend;
use crate::pipeline::llm::CompletionProvider;
use crate::progress::SessionProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared progress callback handle.
pub type ProgressCallback = Arc<dyn SessionProgressCallback>;

/// Configuration for document extraction and artifact generation.
///
/// # Example
/// ```rust
/// use pdf_guru::GuruConfig;
///
/// let config = GuruConfig::builder()
///     .model("llama3.1")
///     .num_questions(8)
///     .build()
///     .unwrap();
/// assert_eq!(config.num_questions, 8);
/// ```
#[derive(Clone)]
pub struct GuruConfig {
    /// Ollama base URL. Default: `http://localhost:11434`.
    pub base_url: String,

    /// Ollama model name. Default: `llama2`.
    pub model: String,

    /// Directory uploaded PDFs are stored in. Default: `uploads`.
    pub upload_dir: PathBuf,

    /// Largest accepted upload in bytes. Default: 16 MiB.
    pub max_upload_bytes: usize,

    /// Accepted file extensions (lowercase, no dot). Default: `["pdf"]`.
    pub allowed_extensions: Vec<String>,

    /// Questions requested per document. Default: 5.
    pub num_questions: usize,

    /// Concepts the model is asked to focus on. Default: 10.
    ///
    /// Only steers the prompt; the returned graph is not truncated.
    pub max_concepts: usize,

    /// Token budget for the summary completion. Default: 500.
    pub summary_max_tokens: usize,

    /// Sampling temperature sent with every completion. Default: 0.7.
    pub temperature: f32,

    /// Nucleus sampling cutoff sent with every completion. Default: 0.9.
    pub top_p: f32,

    /// Timeout for a completion call in seconds. Default: 120.
    pub request_timeout_secs: u64,

    /// Timeout for the `/api/tags` health probe in seconds. Default: 5.
    pub health_timeout_secs: u64,

    /// Minimum cleaned text length (chars) a document must have. Default: 100.
    pub min_text_length: usize,

    /// Explicit pdfium library path. If None, `PDFIUM_LIB_PATH` is consulted.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Pre-constructed completion provider. Takes precedence over `base_url`/`model`.
    pub provider: Option<Arc<dyn CompletionProvider>>,

    /// Pre-constructed PDF backend. Takes precedence over `pdfium_lib_path`.
    pub pdf_backend: Option<Arc<dyn PdfBackend>>,

    /// Stage-level progress events for [`crate::service::LearningService::process`].
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GuruConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama2".to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 16 * 1024 * 1024,
            allowed_extensions: vec!["pdf".to_string()],
            num_questions: 5,
            max_concepts: 10,
            summary_max_tokens: crate::prompts::SUMMARY_MAX_TOKENS,
            temperature: 0.7,
            top_p: 0.9,
            request_timeout_secs: 120,
            health_timeout_secs: 5,
            min_text_length: 100,
            pdfium_lib_path: None,
            provider: None,
            pdf_backend: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GuruConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuruConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("upload_dir", &self.upload_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("num_questions", &self.num_questions)
            .field("max_concepts", &self.max_concepts)
            .field("summary_max_tokens", &self.summary_max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("health_timeout_secs", &self.health_timeout_secs)
            .field("min_text_length", &self.min_text_length)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "provider",
                &self.provider.as_ref().map(|_| "<dyn CompletionProvider>"),
            )
            .field(
                "pdf_backend",
                &self.pdf_backend.as_ref().map(|_| "<dyn PdfBackend>"),
            )
            .finish()
    }
}

impl GuruConfig {
    /// Create a new builder for `GuruConfig`.
    pub fn builder() -> GuruConfigBuilder {
        GuruConfigBuilder {
            config: Self::default(),
        }
    }

    /// Read overrides from the process environment on top of the defaults.
    ///
    /// | Variable                    | Field               |
    /// |-----------------------------|---------------------|
    /// | `OLLAMA_BASE_URL`           | `base_url`          |
    /// | `OLLAMA_MODEL`              | `model`             |
    /// | `UPLOAD_FOLDER`             | `upload_dir`        |
    /// | `PDF_GURU_NUM_QUESTIONS`    | `num_questions`     |
    /// | `PDF_GURU_MAX_CONCEPTS`     | `max_concepts`      |
    /// | `PDF_GURU_MAX_UPLOAD_BYTES` | `max_upload_bytes`  |
    /// | `PDFIUM_LIB_PATH`           | `pdfium_lib_path`   |
    pub fn from_env() -> Result<Self, GuruError> {
        let mut builder = Self::builder();

        if let Some(url) = env_non_empty("OLLAMA_BASE_URL") {
            builder = builder.base_url(url);
        }
        if let Some(model) = env_non_empty("OLLAMA_MODEL") {
            builder = builder.model(model);
        }
        if let Some(dir) = env_non_empty("UPLOAD_FOLDER") {
            builder = builder.upload_dir(dir);
        }
        if let Some(n) = env_parsed::<usize>("PDF_GURU_NUM_QUESTIONS")? {
            builder = builder.num_questions(n);
        }
        if let Some(n) = env_parsed::<usize>("PDF_GURU_MAX_CONCEPTS")? {
            builder = builder.max_concepts(n);
        }
        if let Some(n) = env_parsed::<usize>("PDF_GURU_MAX_UPLOAD_BYTES")? {
            builder = builder.max_upload_bytes(n);
        }
        if let Some(path) = env_non_empty("PDFIUM_LIB_PATH") {
            builder = builder.pdfium_lib_path(path);
        }

        builder.build()
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, GuruError> {
    match env_non_empty(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| GuruError::InvalidConfig(format!("{key} is not a number: '{raw}'"))),
    }
}

/// Builder for [`GuruConfig`].
pub struct GuruConfigBuilder {
    config: GuruConfig,
}

impl fmt::Debug for GuruConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuruConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl GuruConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn allowed_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_extensions = exts
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn num_questions(mut self, n: usize) -> Self {
        self.config.num_questions = n;
        self
    }

    pub fn max_concepts(mut self, n: usize) -> Self {
        self.config.max_concepts = n;
        self
    }

    pub fn summary_max_tokens(mut self, n: usize) -> Self {
        self.config.summary_max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn health_timeout_secs(mut self, secs: u64) -> Self {
        self.config.health_timeout_secs = secs;
        self
    }

    pub fn min_text_length(mut self, n: usize) -> Self {
        self.config.min_text_length = n;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn pdf_backend(mut self, backend: Arc<dyn PdfBackend>) -> Self {
        self.config.pdf_backend = Some(backend);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GuruConfig, GuruError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(GuruError::InvalidConfig(format!(
                "Ollama base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.model.trim().is_empty() {
            return Err(GuruError::InvalidConfig("Model name must not be empty".into()));
        }
        if c.num_questions == 0 {
            return Err(GuruError::InvalidConfig(
                "Number of questions must be ≥ 1".into(),
            ));
        }
        if c.max_concepts == 0 {
            return Err(GuruError::InvalidConfig("Max concepts must be ≥ 1".into()));
        }
        if c.request_timeout_secs == 0 || c.health_timeout_secs == 0 {
            return Err(GuruError::InvalidConfig("Timeouts must be ≥ 1s".into()));
        }
        if c.allowed_extensions.is_empty() {
            return Err(GuruError::InvalidConfig(
                "At least one upload extension must be allowed".into(),
            ));
        }
        Ok(self.config)
    }
}
