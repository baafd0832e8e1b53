// HTTP access to attachment locators, shared by every extractor

use reqwest::{Client, Response};
use tracing::debug;

use super::ExtractError;

/// Thin wrapper over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self, ExtractError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    async fn get(&self, locator: &str) -> Result<Response, ExtractError> {
        let response = self.client.get(locator).send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Fetched {}", preview(locator));

        if !status.is_success() {
            return Err(ExtractError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Body as raw bytes. Non-2xx statuses are errors.
    pub async fn fetch_bytes(&self, locator: &str) -> Result<Vec<u8>, ExtractError> {
        let body = self.get(locator).await?.bytes().await?;
        Ok(body.to_vec())
    }

    /// Body decoded as text. Non-2xx statuses are errors.
    pub async fn fetch_text(&self, locator: &str) -> Result<String, ExtractError> {
        Ok(self.get(locator).await?.text().await?)
    }
}

/// Locators can be long signed URLs; only the head goes into logs.
pub fn preview(locator: &str) -> String {
    const MAX: usize = 100;
    match locator.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &locator[..idx]),
        None => locator.to_string(),
    }
}
