//! Attachment text extraction
//!
//! Turns a fetchable file reference plus its declared MIME type into a short,
//! human-readable description for a chat assistant:
//!
//! ```text
//!   ExtractionRequest ──► dispatcher::classify ──► Category
//!                                   │
//!                 ┌─────────────────┼──────────────────┐
//!                 ▼                 ▼                  ▼
//!          ImageExtractor     PdfExtractor       TextExtractor
//!           (tesseract)         (lopdf)          (HTTP body)
//!                 └─────────────────┼──────────────────┘
//!                                   ▼
//!                  summarizer::summarize ──► ExtractionResult
//! ```
//!
//! Extractors never fail past their own boundary: internal errors degrade to
//! empty text and are kept as a diagnostic on the result.

pub mod dispatcher;
pub mod fetch;
pub mod image;
pub mod pdf;
pub mod pipeline;
pub mod summarizer;
pub mod text;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

pub use dispatcher::classify;
pub use fetch::HttpFetcher;
pub use image::{ImageExtractor, OcrEngine, OcrWorker, TesseractEngine};
pub use pdf::{LopdfSource, PdfDocument, PdfExtractor, PdfProbe, PdfSource};
pub use pipeline::Pipeline;
pub use summarizer::summarize;
pub use text::TextExtractor;

/// Extraction strategy bucket a file is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Image,
    Pdf,
    PlainText,
    Spreadsheet,
    Unsupported,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Image => write!(f, "image"),
            Category::Pdf => write!(f, "pdf"),
            Category::PlainText => write!(f, "plain_text"),
            Category::Spreadsheet => write!(f, "spreadsheet"),
            Category::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// One file to analyze. The locator has already been checked to be a URL.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub locator: String,
    pub content_type: String,
    pub display_name: Option<String>,
}

impl ExtractionRequest {
    pub fn new(
        locator: impl Into<String>,
        content_type: impl Into<String>,
        display_name: Option<String>,
    ) -> Self {
        Self {
            locator: locator.into(),
            content_type: content_type.into(),
            // An empty name reads the same as no name at all
            display_name: display_name.filter(|name| !name.is_empty()),
        }
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub category: Category,
    /// Empty when nothing was recovered or the category is unsupported.
    pub raw_text: String,
    /// Always non-empty.
    pub description: String,
    /// Set when an extractor failed internally; never shown to callers.
    pub diagnostic: Option<String>,
}

impl ExtractionResult {
    /// Raw text as exposed over the wire: `None` when empty.
    pub fn extracted_text(&self) -> Option<&str> {
        if self.raw_text.is_empty() {
            None
        } else {
            Some(self.raw_text.as_str())
        }
    }
}

/// Errors inside an extractor. They never escape [`Extractor::extract`].
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("fetch returned HTTP {status}")]
    Status { status: u16 },

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("task error: {0}")]
    Task(String),
}

/// Best-effort extraction outcome at the extractor boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub failure: Option<String>,
}

impl Extraction {
    pub fn recovered(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            failure: None,
        }
    }

    pub fn degraded(error: &ExtractError) -> Self {
        Self {
            text: String::new(),
            failure: Some(error.to_string()),
        }
    }
}

/// A strategy that turns a resource locator into plain text.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Fallible extraction. Implementations return trimmed text.
    async fn try_extract(&self, locator: &str) -> Result<String, ExtractError>;

    /// Infallible extraction: any error becomes empty text plus a diagnostic.
    async fn extract(&self, locator: &str) -> Extraction {
        match self.try_extract(locator).await {
            Ok(text) => Extraction::recovered(text),
            Err(e) => {
                warn!(extractor = self.name(), error = %e, "Extraction degraded to empty text");
                Extraction::degraded(&e)
            }
        }
    }
}
