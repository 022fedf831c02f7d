use std::time::Duration;

use reqwest::blocking::{Client, Response};

use crate::error::SubmitError;
use crate::news::{CreateNewsRequest, CreateNewsResponse, NewsArticle};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking client for the news backend. Calls are never retried; the caller
/// reports the failure and keeps the draft.
pub struct NewsClient {
    base_url: String,
    client: Client,
}

impl NewsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn create_news(&self, request: &CreateNewsRequest) -> Result<CreateNewsResponse, SubmitError> {
        let url = self.url_for("create-news");
        tracing::info!(%url, title = %request.title, "submitting news");
        let response = self.client.post(&url).json(request).send()?;
        let response = check_status(response)?;
        let body = response.text()?;
        if body.trim().is_empty() {
            return Ok(CreateNewsResponse::default());
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub fn fetch_news(&self, id: &str) -> Result<NewsArticle, SubmitError> {
        let url = self.url_for(&format!("news/{id}"));
        tracing::debug!(%url, "fetching news");
        let response = self.client.get(&url).send()?;
        let response = check_status(response)?;
        Ok(response.json()?)
    }
}

fn check_status(response: Response) -> Result<Response, SubmitError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<CreateNewsResponse>(&body)
        .map(|parsed| parsed.message)
        .ok()
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    tracing::warn!(status = status.as_u16(), %message, "backend rejected request");
    Err(SubmitError::Status {
        status: status.as_u16(),
        message,
    })
}
