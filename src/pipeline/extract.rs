//! Document extraction: turn a PDF file into an [`ExtractedDocument`].
//!
//! The PDF library sits behind [`PdfBackend`] so extraction rules (cleaning,
//! counting, metadata defaults, the minimum-content threshold) can be tested
//! without a native pdfium build. [`PdfiumBackend`] is the production
//! implementation.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with thread-local state and no async API. Reading
//! a long document is CPU-bound, so [`extract_document`] moves the work onto
//! Tokio's blocking pool instead of stalling an executor thread.

use crate::error::GuruError;
use crate::output::ExtractedDocument;
use crate::pipeline::clean::{clean, word_count};
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Placeholder title when the PDF has none.
pub const DEFAULT_TITLE: &str = "Untitled Document";
/// Placeholder author when the PDF has none.
pub const DEFAULT_AUTHOR: &str = "Unknown";

/// Metadata as reported by the PDF library; `None` means absent or empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

/// Raw, uncleaned content of a PDF.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPdf {
    /// Raw text of each page, in page order.
    pub pages: Vec<String>,
    pub info: PdfInfo,
}

/// A PDF text/metadata reader.
///
/// Implementations must release the underlying document before `read`
/// returns, on success and on every error path.
pub trait PdfBackend: Send + Sync {
    fn read(&self, path: &Path) -> Result<RawPdf, GuruError>;
}

/// [`PdfBackend`] backed by pdfium via `pdfium-render`.
///
/// The library is bound per call, as pdfium documents borrow their binding.
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    library_path: Option<PathBuf>,
}

impl PdfiumBackend {
    /// Bind to the library at `path` instead of searching for one.
    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    /// Resolve a pdfium binding: explicit path, `PDFIUM_LIB_PATH`, the
    /// working directory, then the system library.
    fn bind(&self) -> Result<Pdfium, GuruError> {
        let explicit = self
            .library_path
            .clone()
            .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

        let bindings = match explicit {
            Some(path) => Pdfium::bind_to_library(&path),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| GuruError::PdfiumBindingFailed(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

impl PdfBackend for PdfiumBackend {
    fn read(&self, path: &Path) -> Result<RawPdf, GuruError> {
        let pdfium = self.bind()?;

        // `document` is dropped (and closed by pdfium) on every return path.
        let document =
            pdfium
                .load_pdf_from_file(path, None)
                .map_err(|e| GuruError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: format!("{:?}", e),
                })?;

        let mut pages = Vec::new();
        for (idx, page) in document.pages().iter().enumerate() {
            let text = page.text().map_err(|e| GuruError::CorruptPdf {
                path: path.to_path_buf(),
                detail: format!("text extraction failed on page {}: {:?}", idx + 1, e),
            })?;
            pages.push(text.all());
        }

        let metadata = document.metadata();
        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata.get(tag).and_then(|t| {
                let v = t.value().trim().to_string();
                if v.is_empty() {
                    None
                } else {
                    Some(v)
                }
            })
        };

        let info = PdfInfo {
            title: get_meta(PdfDocumentMetadataTagType::Title),
            author: get_meta(PdfDocumentMetadataTagType::Author),
            subject: get_meta(PdfDocumentMetadataTagType::Subject),
            creator: get_meta(PdfDocumentMetadataTagType::Creator),
        };

        Ok(RawPdf { pages, info })
    }
}

/// Extract a document on Tokio's blocking pool.
pub async fn extract_document(
    backend: Arc<dyn PdfBackend>,
    path: &Path,
    min_text_length: usize,
) -> Result<ExtractedDocument, GuruError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || extract(backend.as_ref(), &path, min_text_length))
        .await
        .map_err(|e| GuruError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Extract and clean a PDF's text and metadata.
///
/// # Errors
/// - [`GuruError::FileNotFound`], [`GuruError::PermissionDenied`],
///   [`GuruError::NotAPdf`] from the pre-checks
/// - [`GuruError::CorruptPdf`] when the backend cannot parse the file
/// - [`GuruError::InsufficientContent`] when fewer than `min_text_length`
///   characters survive cleaning
pub fn extract(
    backend: &dyn PdfBackend,
    path: &Path,
    min_text_length: usize,
) -> Result<ExtractedDocument, GuruError> {
    validate_pdf_file(path)?;

    let raw = backend.read(path)?;
    info!("PDF loaded: {} pages", raw.pages.len());

    let page_texts: Vec<String> = raw.pages.iter().map(|p| clean(p)).collect();
    let full_text = clean(&raw.pages.join("\n"));

    let length = full_text.chars().count();
    if length < min_text_length {
        return Err(GuruError::InsufficientContent {
            length,
            minimum: min_text_length,
        });
    }

    let words = word_count(&full_text);
    debug!("Extracted {} chars, {} words", length, words);

    Ok(ExtractedDocument {
        page_count: page_texts.len(),
        word_count: words,
        full_text,
        page_texts,
        title: raw.info.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        author: raw.info.author.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
        subject: raw.info.subject.unwrap_or_default(),
        creator: raw.info.creator.unwrap_or_default(),
    })
}

/// Check the file exists, is readable, and starts with the `%PDF` magic.
pub fn validate_pdf_file(path: &Path) -> Result<(), GuruError> {
    if !path.exists() {
        return Err(GuruError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(GuruError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(GuruError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(GuruError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct FakeBackend(Result<RawPdf, String>);

    impl PdfBackend for FakeBackend {
        fn read(&self, path: &Path) -> Result<RawPdf, GuruError> {
            self.0.clone().map_err(|detail| GuruError::CorruptPdf {
                path: path.to_path_buf(),
                detail,
            })
        }
    }

    fn pdf_file() -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n% fake body\n").unwrap();
        f
    }

    fn long_page(words: usize) -> String {
        (0..words)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn extracts_pages_and_counts() {
        let file = pdf_file();
        let backend = FakeBackend(Ok(RawPdf {
            pages: vec![
                format!("{}\n7\n", long_page(30)),
                format!("  {}  ", long_page(20)),
            ],
            info: PdfInfo {
                title: Some("Thermodynamics".into()),
                ..Default::default()
            },
        }));

        let doc = extract(&backend, file.path(), 100).unwrap();
        assert_eq!(doc.page_count, 2);
        assert_eq!(doc.page_texts.len(), 2);
        assert_eq!(doc.word_count, 50);
        assert!(!doc.page_texts[0].ends_with('7'));
        assert_eq!(doc.title, "Thermodynamics");
        assert_eq!(doc.author, DEFAULT_AUTHOR);
        assert_eq!(doc.subject, "");
        assert_eq!(doc.creator, "");
    }

    #[test]
    fn missing_title_uses_placeholder() {
        let file = pdf_file();
        let backend = FakeBackend(Ok(RawPdf {
            pages: vec![long_page(40)],
            info: PdfInfo::default(),
        }));
        let doc = extract(&backend, file.path(), 100).unwrap();
        assert_eq!(doc.title, DEFAULT_TITLE);
    }

    #[test]
    fn short_document_is_insufficient() {
        let file = pdf_file();
        let backend = FakeBackend(Ok(RawPdf {
            pages: vec!["Too little text here.".into()],
            info: PdfInfo::default(),
        }));
        let err = extract(&backend, file.path(), 100).unwrap_err();
        assert!(
            matches!(err, GuruError::InsufficientContent { minimum: 100, .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn backend_failure_propagates() {
        let file = pdf_file();
        let backend = FakeBackend(Err("bad xref table".into()));
        let err = extract(&backend, file.path(), 100).unwrap_err();
        assert!(matches!(err, GuruError::CorruptPdf { .. }));
    }

    #[test]
    fn rejects_missing_file() {
        let backend = FakeBackend(Ok(RawPdf::default()));
        let err = extract(&backend, Path::new("/definitely/not/here.pdf"), 100).unwrap_err();
        assert!(matches!(err, GuruError::FileNotFound { .. }));
    }

    #[test]
    fn rejects_non_pdf_magic() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"PK\x03\x04zip").unwrap();
        let err = validate_pdf_file(f.path()).unwrap_err();
        assert!(matches!(err, GuruError::NotAPdf { magic, .. } if &magic == b"PK\x03\x04"));
    }
}
