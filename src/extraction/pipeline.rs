use std::sync::Arc;

use tracing::info;

use super::fetch::preview;
use super::{
    classify, summarize, Category, Extraction, ExtractionRequest, ExtractionResult, Extractor,
};

/// Classify, extract once, summarize.
pub struct Pipeline {
    image: Arc<dyn Extractor>,
    pdf: Arc<dyn Extractor>,
    text: Arc<dyn Extractor>,
}

impl Pipeline {
    pub fn new(
        image: Arc<dyn Extractor>,
        pdf: Arc<dyn Extractor>,
        text: Arc<dyn Extractor>,
    ) -> Self {
        Self { image, pdf, text }
    }

    fn extractor_for(&self, category: Category) -> Option<&dyn Extractor> {
        match category {
            Category::Image => Some(self.image.as_ref()),
            Category::Pdf => Some(self.pdf.as_ref()),
            Category::PlainText | Category::Spreadsheet => Some(self.text.as_ref()),
            Category::Unsupported => None,
        }
    }

    /// Run one request through the pipeline.
    ///
    /// Exactly one extraction attempt is made. Extractor failures come back
    /// as empty text, so this never fails.
    pub async fn analyze(&self, request: &ExtractionRequest) -> ExtractionResult {
        let category = classify(&request.content_type);
        info!(
            %category,
            content_type = %request.content_type,
            file_name = request.display_name.as_deref().unwrap_or("-"),
            "Analyzing {}",
            preview(&request.locator)
        );

        let extraction = match self.extractor_for(category) {
            Some(extractor) => extractor.extract(&request.locator).await,
            None => Extraction::default(),
        };

        let description = summarize(
            category,
            &extraction.text,
            request.display_name.as_deref(),
            &request.content_type,
        );
        info!(
            %category,
            text_chars = extraction.text.chars().count(),
            degraded = extraction.failure.is_some(),
            description_len = description.len(),
            "Analysis complete"
        );

        ExtractionResult {
            category,
            raw_text: extraction.text,
            description,
            diagnostic: extraction.failure,
        }
    }
}
