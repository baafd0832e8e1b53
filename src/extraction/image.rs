//! Image OCR extraction
//!
//! Every call acquires its own OCR worker, configures it for English and
//! Vietnamese with a restricted character whitelist, recognizes the image and
//! releases the worker again. Workers are never pooled or shared.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{ExtractError, Extractor, HttpFetcher};

/// Language models loaded into every worker.
pub const DEFAULT_OCR_LANGUAGES: &str = "eng+vie";

/// Characters the recognizer may emit.
pub const OCR_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789.,!?;:()[]{}\"'`~@#$%^&*+-=<>/\\|_ \n\t";

/// Source of OCR workers.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn spawn_worker(&self) -> Result<Box<dyn OcrWorker>, ExtractError>;
}

/// A single-use recognizer. Callers must `terminate` it once done.
#[async_trait]
pub trait OcrWorker: Send {
    /// Load one or more `+`-joined language models.
    async fn load_language(&mut self, languages: &str) -> Result<(), ExtractError>;

    fn set_whitelist(&mut self, chars: &str);

    async fn recognize(&mut self, image: &[u8]) -> Result<String, ExtractError>;

    async fn terminate(self: Box<Self>);
}

pub struct ImageExtractor {
    fetcher: HttpFetcher,
    engine: Arc<dyn OcrEngine>,
    languages: String,
}

impl ImageExtractor {
    pub fn new(fetcher: HttpFetcher, engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            fetcher,
            engine,
            languages: DEFAULT_OCR_LANGUAGES.to_string(),
        }
    }

    pub fn with_languages(mut self, languages: impl Into<String>) -> Self {
        self.languages = languages.into();
        self
    }
}

#[async_trait]
impl Extractor for ImageExtractor {
    fn name(&self) -> &'static str {
        "image"
    }

    async fn try_extract(&self, locator: &str) -> Result<String, ExtractError> {
        let image = self.fetcher.fetch_bytes(locator).await?;

        let mut worker = self.engine.spawn_worker().await?;
        let recognized = run_worker(&mut *worker, &self.languages, &image).await;
        // Released on both the success and the error path
        worker.terminate().await;

        Ok(recognized?.trim().to_string())
    }
}

async fn run_worker(
    worker: &mut dyn OcrWorker,
    languages: &str,
    image: &[u8],
) -> Result<String, ExtractError> {
    worker.load_language(languages).await?;
    worker.set_whitelist(OCR_WHITELIST);
    worker.recognize(image).await
}

// =============================================================================
// Tesseract CLI engine
// =============================================================================

/// Runs the `tesseract` binary, one private scratch directory per worker.
pub struct TesseractEngine {
    binary: PathBuf,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn spawn_worker(&self) -> Result<Box<dyn OcrWorker>, ExtractError> {
        let scratch = tempfile::Builder::new().prefix("ocr-worker-").tempdir()?;
        debug!("Spawned OCR worker in {:?}", scratch.path());

        Ok(Box::new(TesseractWorker {
            binary: self.binary.clone(),
            scratch,
            languages: None,
            whitelist: None,
        }))
    }
}

struct TesseractWorker {
    binary: PathBuf,
    // Removed by `terminate`, or by `Drop` if the worker is abandoned
    scratch: TempDir,
    languages: Option<String>,
    whitelist: Option<String>,
}

#[async_trait]
impl OcrWorker for TesseractWorker {
    async fn load_language(&mut self, languages: &str) -> Result<(), ExtractError> {
        let output = Command::new(&self.binary)
            .arg("--list-langs")
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ExtractError::Ocr(format!(
                "tesseract --list-langs exited with {}",
                output.status
            )));
        }

        // Older releases print the listing on stderr
        let listing = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let missing = missing_languages(languages, &listing);
        if !missing.is_empty() {
            return Err(ExtractError::Ocr(format!(
                "language model not installed: {}",
                missing.join(", ")
            )));
        }

        self.languages = Some(languages.to_string());
        Ok(())
    }

    fn set_whitelist(&mut self, chars: &str) {
        self.whitelist = Some(chars.to_string());
    }

    async fn recognize(&mut self, image: &[u8]) -> Result<String, ExtractError> {
        let languages = self
            .languages
            .as_deref()
            .ok_or_else(|| ExtractError::Ocr("no language model loaded".to_string()))?;

        let input = self.scratch.path().join("input");
        tokio::fs::write(&input, image).await?;

        let mut cmd = Command::new(&self.binary);
        cmd.arg(&input).arg("stdout").arg("-l").arg(languages);
        if let Some(whitelist) = &self.whitelist {
            cmd.arg("-c")
                .arg(format!("tessedit_char_whitelist={}", whitelist));
        }

        let output = cmd.kill_on_drop(true).output().await?;
        if !output.status.success() {
            return Err(ExtractError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn terminate(self: Box<Self>) {
        let TesseractWorker { scratch, .. } = *self;
        let path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!("Failed to remove OCR scratch dir {:?}: {}", path, e);
        }
    }
}

/// Requested languages absent from a `tesseract --list-langs` listing.
fn missing_languages<'a>(requested: &'a str, listing: &str) -> Vec<&'a str> {
    let available: HashSet<&str> = listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of"))
        .collect();

    requested
        .split('+')
        .filter(|lang| !lang.is_empty() && !available.contains(lang))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Calls {
        spawned: AtomicUsize,
        terminated: AtomicUsize,
        languages: Mutex<Option<String>>,
        whitelist: Mutex<Option<String>>,
    }

    struct FakeEngine {
        calls: Arc<Calls>,
        recognized: Result<&'static str, &'static str>,
    }

    struct FakeWorker {
        calls: Arc<Calls>,
        recognized: Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl OcrEngine for FakeEngine {
        async fn spawn_worker(&self) -> Result<Box<dyn OcrWorker>, ExtractError> {
            self.calls.spawned.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeWorker {
                calls: self.calls.clone(),
                recognized: self.recognized,
            }))
        }
    }

    #[async_trait]
    impl OcrWorker for FakeWorker {
        async fn load_language(&mut self, languages: &str) -> Result<(), ExtractError> {
            *self.calls.languages.lock().unwrap() = Some(languages.to_string());
            Ok(())
        }

        fn set_whitelist(&mut self, chars: &str) {
            *self.calls.whitelist.lock().unwrap() = Some(chars.to_string());
        }

        async fn recognize(&mut self, _image: &[u8]) -> Result<String, ExtractError> {
            self.recognized
                .map(str::to_string)
                .map_err(|e| ExtractError::Ocr(e.to_string()))
        }

        async fn terminate(self: Box<Self>) {
            self.calls.terminated.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn serve_png(server: &mut mockito::ServerGuard) -> (mockito::Mock, String) {
        let mock = server
            .mock("GET", "/scan.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(b"\x89PNG fake".to_vec())
            .create_async()
            .await;
        (mock, format!("{}/scan.png", server.url()))
    }

    fn extractor(engine: FakeEngine) -> ImageExtractor {
        ImageExtractor::new(
            HttpFetcher::new("file-insight-test").unwrap(),
            Arc::new(engine),
        )
    }

    #[tokio::test]
    async fn test_recognized_text_is_trimmed() {
        let mut server = mockito::Server::new_async().await;
        let (_mock, url) = serve_png(&mut server).await;
        let calls = Arc::new(Calls::default());

        let outcome = extractor(FakeEngine {
            calls: calls.clone(),
            recognized: Ok("  Hello World\n\n"),
        })
        .extract(&url)
        .await;

        assert_eq!(outcome.text, "Hello World");
        assert!(outcome.failure.is_none());
        assert_eq!(calls.languages.lock().unwrap().as_deref(), Some("eng+vie"));
        assert_eq!(calls.whitelist.lock().unwrap().as_deref(), Some(OCR_WHITELIST));
        assert_eq!(calls.spawned.load(Ordering::SeqCst), 1);
        assert_eq!(calls.terminated.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_worker_released_when_recognition_fails() {
        let mut server = mockito::Server::new_async().await;
        let (_mock, url) = serve_png(&mut server).await;
        let calls = Arc::new(Calls::default());

        let outcome = extractor(FakeEngine {
            calls: calls.clone(),
            recognized: Err("engine crashed"),
        })
        .extract(&url)
        .await;

        assert!(outcome.text.is_empty());
        assert!(outcome.failure.unwrap().contains("engine crashed"));
        assert_eq!(calls.terminated.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_worker_when_fetch_fails() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/missing.png")
            .with_status(404)
            .create_async()
            .await;
        let calls = Arc::new(Calls::default());

        let outcome = extractor(FakeEngine {
            calls: calls.clone(),
            recognized: Ok("unused"),
        })
        .extract(&format!("{}/missing.png", server.url()))
        .await;

        assert!(outcome.text.is_empty());
        assert_eq!(calls.spawned.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_tesseract_binary_degrades() {
        let mut server = mockito::Server::new_async().await;
        let (_mock, url) = serve_png(&mut server).await;

        let extractor = ImageExtractor::new(
            HttpFetcher::new("file-insight-test").unwrap(),
            Arc::new(TesseractEngine::new("/nonexistent/bin/tesseract")),
        );
        let outcome = extractor.extract(&url).await;

        assert!(outcome.text.is_empty());
        assert!(outcome.failure.is_some());
    }

    fn tesseract_worker() -> (TesseractWorker, PathBuf) {
        let scratch = tempfile::Builder::new()
            .prefix("ocr-worker-")
            .tempdir()
            .unwrap();
        let path = scratch.path().to_path_buf();
        let worker = TesseractWorker {
            binary: PathBuf::from("tesseract"),
            scratch,
            languages: None,
            whitelist: None,
        };
        (worker, path)
    }

    #[tokio::test]
    async fn test_tesseract_worker_terminate_removes_scratch() {
        let (worker, path) = tesseract_worker();
        assert!(path.exists());

        let worker: Box<dyn OcrWorker> = Box::new(worker);
        worker.terminate().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_tesseract_worker_requires_language() {
        let (mut worker, _path) = tesseract_worker();
        let err = worker.recognize(b"bytes").await.unwrap_err();
        assert!(matches!(err, ExtractError::Ocr(_)));
    }

    #[test]
    fn test_missing_languages() {
        let listing = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\nosd\nvie\n";
        assert!(missing_languages("eng+vie", listing).is_empty());
        assert_eq!(missing_languages("eng+jpn", listing), vec!["jpn"]);
        assert_eq!(missing_languages("eng", ""), vec!["eng"]);
    }
}
