//! Web page loading for the website analyzer

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

use crate::constants::HTML_RENDER_WIDTH;
use crate::error::TriageError;

/// Loads a document and returns its readable text
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<String, TriageError>;
}

/// HTTP GET followed by HTML-to-text conversion, truncated to `limit` chars
pub struct HttpLoader {
    client: Client,
    limit: usize,
}

impl HttpLoader {
    pub fn new(limit: usize, timeout_secs: u64) -> Result<Self, TriageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|e| TriageError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self { client, limit })
    }
}

/// Accept bare hosts like `example.com` by assuming https
pub fn normalize_url(input: &str) -> Result<Url, TriageError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TriageError::OperatorInput("Please enter a URL".to_string()));
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| TriageError::OperatorInput(format!("'{}' is not a valid URL: {}", trimmed, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(TriageError::OperatorInput(format!(
            "Unsupported URL scheme '{}'",
            other
        ))),
    }
}

/// Render HTML as plain text and keep at most `limit` characters
pub fn html_to_text(html: &[u8], limit: usize) -> Result<String, TriageError> {
    let text = html2text::config::plain()
        .string_from_read(html, HTML_RENDER_WIDTH)
        .map_err(|e| TriageError::Fetch(format!("could not read page content: {}", e)))?;
    Ok(truncate_chars(text.trim(), limit))
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[async_trait]
impl DocumentLoader for HttpLoader {
    async fn load(&self, url: &str) -> Result<String, TriageError> {
        let url = normalize_url(url)?;
        tracing::info!("Fetching {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TriageError::Fetch(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TriageError::Fetch(format!("{} returned {}", url, status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TriageError::Fetch(format!("{}: {}", url, e)))?;

        let text = html_to_text(&body, self.limit)?;
        if text.is_empty() {
            return Err(TriageError::Fetch(format!("{} has no readable text", url)));
        }
        tracing::debug!("Loaded {} chars from {}", text.chars().count(), url);
        Ok(text)
    }
}
