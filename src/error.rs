//! Error types for the pdf-guru library.
//!
//! There is exactly one fatal error type, [`GuruError`]. Document problems
//! (missing file, corrupt PDF, too little text) and service problems
//! (Ollama unreachable, Ollama answered with an error status) are kept as
//! distinct variants so callers can tell the user which one to fix.
//!
//! A model reply that cannot be decoded into the expected shape is *not* an
//! error: the normalizers absorb it with a deterministic fallback (see
//! [`crate::pipeline::normalize`]).

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// All fatal errors returned by the pdf-guru library.
#[derive(Debug, Error)]
pub enum GuruError {
    // ── Document errors ───────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The PDF library could not open or parse the document.
    #[error("Error processing PDF '{path}': {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Text extraction succeeded but produced too little usable text.
    #[error(
        "PDF contains insufficient text content: {length} characters after cleaning \
         (minimum {minimum}).\nScanned documents need OCR before they can be used."
    )]
    InsufficientContent { length: usize, minimum: usize },

    // ── Upload errors ─────────────────────────────────────────────────────
    /// The upload was rejected before extraction (empty name, wrong extension).
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// The upload exceeds the configured size limit.
    #[error("Upload of {size} bytes exceeds the {limit}-byte limit")]
    UploadTooLarge { size: usize, limit: usize },

    // ── Registry errors ───────────────────────────────────────────────────
    /// No uploaded document is registered under this id.
    #[error("Invalid PDF ID: {0}")]
    DocumentNotFound(Uuid),

    /// No learning session is registered under this id.
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    // ── LLM service errors ────────────────────────────────────────────────
    /// The Ollama host could not be reached (refused, DNS, timeout).
    #[error(
        "AI service unavailable at '{url}': {reason}\n\
         Please ensure Ollama is running: ollama serve"
    )]
    ServiceUnavailable { url: String, reason: String },

    /// Ollama answered, but with an error status or an undecodable body.
    #[error("Ollama API error ({status}): {detail}")]
    ServiceProtocol { status: u16, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library in the working\n\
directory, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not store an uploaded file.
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GuruError {
    /// HTTP status class an upstream web layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            GuruError::FileNotFound { .. }
            | GuruError::PermissionDenied { .. }
            | GuruError::NotAPdf { .. }
            | GuruError::CorruptPdf { .. }
            | GuruError::InsufficientContent { .. }
            | GuruError::InvalidUpload(_)
            | GuruError::DocumentNotFound(_) => 400,
            GuruError::SessionNotFound(_) => 404,
            GuruError::UploadTooLarge { .. } => 413,
            GuruError::ServiceProtocol { .. } => 502,
            GuruError::ServiceUnavailable { .. } => 503,
            GuruError::InvalidConfig(_)
            | GuruError::PdfiumBindingFailed(_)
            | GuruError::Io { .. }
            | GuruError::Internal(_) => 500,
        }
    }

    /// True for failures that concern the document rather than the service.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            GuruError::FileNotFound { .. }
                | GuruError::PermissionDenied { .. }
                | GuruError::NotAPdf { .. }
                | GuruError::CorruptPdf { .. }
                | GuruError::InsufficientContent { .. }
        )
    }
}
