use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::Config;
use crate::extraction::{
    ExtractionRequest, ExtractionResult, HttpFetcher, ImageExtractor, LopdfSource, PdfExtractor,
    Pipeline, TesseractEngine, TextExtractor,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<Pipeline>,
    pub pdf: Arc<PdfExtractor>,
}

impl AppState {
    /// Wire the production extractors from configuration.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(&config.extraction.user_agent)
            .context("Failed to build HTTP client")?;

        let image = ImageExtractor::new(
            fetcher.clone(),
            Arc::new(TesseractEngine::new(&config.extraction.tesseract_path)),
        )
        .with_languages(config.extraction.ocr_languages.clone());
        let pdf = Arc::new(PdfExtractor::new(Arc::new(LopdfSource::new(fetcher.clone()))));
        let text = TextExtractor::new(fetcher);

        let pipeline = Pipeline::new(Arc::new(image), pdf.clone(), Arc::new(text));

        Ok(Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            pdf,
        })
    }
}

// API Request/Response types

/// Body of `POST /api/files/analyze`.
///
/// Fields are optional at the serde level so that a missing field is reported
/// as a validation detail instead of a bare deserialization failure.
#[derive(Debug, Deserialize, Validate)]
pub struct AnalyzeRequest {
    #[validate(
        required(message = "url is required"),
        url(message = "url must be a valid URL")
    )]
    pub url: Option<String>,

    #[serde(rename = "contentType")]
    #[validate(required(message = "contentType is required"))]
    pub content_type: Option<String>,

    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
}

impl AnalyzeRequest {
    /// Only meaningful after `validate()` succeeded.
    pub fn into_extraction(self) -> ExtractionRequest {
        ExtractionRequest::new(
            self.url.unwrap_or_default(),
            self.content_type.unwrap_or_default(),
            self.file_name,
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub description: String,
    /// `null` when nothing was extracted
    pub extracted_text: Option<String>,
    pub content_type: String,
    pub file_name: String,
}

impl AnalyzeResponse {
    pub fn new(request: &ExtractionRequest, result: &ExtractionResult) -> Self {
        Self {
            success: true,
            description: result.description.clone(),
            extracted_text: result.extracted_text().map(str::to_string),
            content_type: request.content_type.clone(),
            file_name: request
                .display_name
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// Body of `POST /api/files/test-pdf`.
#[derive(Debug, Deserialize, Validate)]
pub struct PdfProbeRequest {
    #[validate(
        required(message = "url is required"),
        url(message = "url must be a valid URL")
    )]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfProbeResponse {
    pub success: bool,
    pub pages: u32,
    pub text: String,
    pub text_length: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
}
