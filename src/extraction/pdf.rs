//! PDF text extraction.
//!
//! Pages are visited 1..=N in order. Text items inside a page are joined with
//! a single space and every page ends with a newline.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, ObjectId};
use serde::Serialize;
use tracing::debug;

use super::{ExtractError, Extractor, HttpFetcher};

/// Opens PDF documents by locator.
#[async_trait]
pub trait PdfSource: Send + Sync {
    async fn open(&self, locator: &str) -> Result<Box<dyn PdfDocument>, ExtractError>;
}

/// A loaded document. Page numbers are 1-based.
pub trait PdfDocument: Send {
    fn page_count(&self) -> u32;

    /// Text items of one page, in content order.
    fn page_items(&self, number: u32) -> Result<Vec<String>, ExtractError>;
}

/// Page count plus first-page text, for diagnosing unreadable PDFs.
#[derive(Debug, Clone, Serialize)]
pub struct PdfProbe {
    pub pages: u32,
    pub text: String,
}

pub struct PdfExtractor {
    source: Arc<dyn PdfSource>,
}

impl PdfExtractor {
    pub fn new(source: Arc<dyn PdfSource>) -> Self {
        Self { source }
    }

    /// Load the document and read page 1 only. Errors are returned, not
    /// swallowed.
    pub async fn probe(&self, locator: &str) -> Result<PdfProbe, ExtractError> {
        let document = self.source.open(locator).await?;

        tokio::task::spawn_blocking(move || {
            let pages = document.page_count();
            let items = document.page_items(1)?;
            Ok::<_, ExtractError>(PdfProbe {
                pages,
                text: items.join(" ").trim().to_string(),
            })
        })
        .await
        .map_err(|e| ExtractError::Task(e.to_string()))?
    }
}

#[async_trait]
impl Extractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    async fn try_extract(&self, locator: &str) -> Result<String, ExtractError> {
        let document = self.source.open(locator).await?;

        let text = tokio::task::spawn_blocking(move || collect_text(&*document))
            .await
            .map_err(|e| ExtractError::Task(e.to_string()))??;

        Ok(text.trim().to_string())
    }
}

fn collect_text(document: &dyn PdfDocument) -> Result<String, ExtractError> {
    let mut full_text = String::new();
    for number in 1..=document.page_count() {
        let items = document.page_items(number)?;
        full_text.push_str(&items.join(" "));
        full_text.push('\n');
    }
    Ok(full_text)
}

// =============================================================================
// lopdf backend
// =============================================================================

/// Fetches the document over HTTP and parses it with `lopdf`.
pub struct LopdfSource {
    fetcher: HttpFetcher,
}

impl LopdfSource {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl PdfSource for LopdfSource {
    async fn open(&self, locator: &str) -> Result<Box<dyn PdfDocument>, ExtractError> {
        let bytes = self.fetcher.fetch_bytes(locator).await?;

        let (doc, pages) = tokio::task::spawn_blocking(move || {
            let mut doc =
                Document::load_mem(&bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
            let pages = doc.get_pages();
            for page_id in pages.values() {
                isolate_text_fragments(&mut doc, *page_id);
            }
            Ok::<_, ExtractError>((doc, pages))
        })
        .await
        .map_err(|e| ExtractError::Task(e.to_string()))??;

        debug!("PDF loaded, pages: {}", pages.len());

        Ok(Box::new(LopdfDocument { doc, pages }))
    }
}

/// `Document::extract_text` glues consecutive show operators of one text
/// object together ("Hello" + "World" -> "HelloWorld") and only breaks lines at
/// `ET`. Closing the text object after every `Tj`/`TJ` makes each fragment its
/// own line, so a page's lines are its text items.
///
/// Pages whose content does not decode are left alone; extraction reports them.
fn isolate_text_fragments(doc: &mut Document, page_id: ObjectId) {
    let Ok(content) = doc
        .get_page_content(page_id)
        .and_then(|data| Content::decode(&data))
    else {
        return;
    };

    let operations = split_text_objects(content.operations);
    let encoded = Content { operations }.encode();
    if let Ok(encoded) = encoded {
        if let Err(e) = doc.change_page_content(page_id, encoded) {
            debug!("Could not rewrite page {:?} content: {}", page_id, e);
        }
    }
}

fn split_text_objects(operations: Vec<Operation>) -> Vec<Operation> {
    let mut split = Vec::with_capacity(operations.len());
    let mut in_text = false;
    let mut rest = operations.into_iter().peekable();

    while let Some(op) = rest.next() {
        let shows_text = matches!(op.operator.as_str(), "Tj" | "TJ");
        match op.operator.as_str() {
            "BT" => in_text = true,
            "ET" => in_text = false,
            _ => {}
        }
        split.push(op);

        // Text state (font, size) survives ET/BT; only the matrix resets
        if in_text && shows_text && rest.peek().is_some_and(|next| next.operator != "ET") {
            split.push(Operation::new("ET", vec![]));
            split.push(Operation::new("BT", vec![]));
        }
    }
    split
}

struct LopdfDocument {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_items(&self, number: u32) -> Result<Vec<String>, ExtractError> {
        if !self.pages.contains_key(&number) {
            return Err(ExtractError::Pdf(format!("page {} does not exist", number)));
        }

        let text = self
            .doc
            .extract_text(&[number])
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;

        Ok(text
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
