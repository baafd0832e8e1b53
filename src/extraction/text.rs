use async_trait::async_trait;

use super::{ExtractError, Extractor, HttpFetcher};

/// Reads text-like and spreadsheet-like files verbatim over HTTP.
///
/// CSV and Excel bodies are not parsed; the assistant gets the raw text.
pub struct TextExtractor {
    fetcher: HttpFetcher,
}

impl TextExtractor {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Extractor for TextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    async fn try_extract(&self, locator: &str) -> Result<String, ExtractError> {
        let body = self.fetcher.fetch_text(locator).await?;
        Ok(body.trim().to_string())
    }
}
