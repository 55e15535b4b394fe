//! Content Extractor: plain text out of uploaded PDFs and linked web pages.
//!
//! The builder only sees the [`ContentExtractor`] trait. [`HttpExtractor`] is
//! the production implementation; tests use an in-memory fake.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::errors::AppError;
use crate::retry::with_timeout;

pub mod html;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; AntiPortfolioBot/1.0)";

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Trimmed text of a PDF. `operation` tags timeouts (e.g. `pdf:cv.pdf`).
    /// On timeout the parser thread cannot be cancelled and runs to completion
    /// in the background, so callers should not retry a timed-out parse.
    async fn pdf_text(&self, operation: &str, bytes: Bytes) -> Result<String, AppError>;

    /// Readable text of a web page. Any HTTP status is accepted; only
    /// transport failures are errors.
    async fn web_text(&self, operation: &str, url: &str) -> Result<String, AppError>;
}

#[derive(Clone)]
pub struct HttpExtractor {
    client: Client,
    pdf_timeout: Duration,
}

impl HttpExtractor {
    pub fn new(web_timeout: Duration, pdf_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(web_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            pdf_timeout,
        })
    }
}

#[async_trait]
impl ContentExtractor for HttpExtractor {
    async fn pdf_text(&self, operation: &str, bytes: Bytes) -> Result<String, AppError> {
        let op = operation.to_string();
        with_timeout(self.pdf_timeout, operation, async move {
            // pdf parsing is CPU-bound
            let parsed = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                .await
                .map_err(|e| {
                    // the parser panics on some malformed files
                    if e.is_panic() {
                        AppError::Extraction(format!("{op}: unreadable PDF"))
                    } else {
                        AppError::Internal(anyhow::anyhow!("spawn_blocking failed in {op}: {e}"))
                    }
                })?;
            let text = parsed.map_err(|e| AppError::Extraction(format!("{op}: {e}")))?;
            Ok::<_, AppError>(text.trim().to_string())
        })
        .await
    }

    async fn web_text(&self, operation: &str, url: &str) -> Result<String, AppError> {
        let fetch_error = |e: reqwest::Error| {
            if e.is_timeout() {
                AppError::Timeout {
                    operation: operation.to_string(),
                }
            } else {
                AppError::Extraction(format!("{operation}: {e}"))
            }
        };

        let response = self.client.get(url).send().await.map_err(fetch_error)?;
        debug!(operation, status = response.status().as_u16(), "page fetched");
        let body = response.text().await.map_err(fetch_error)?;
        Ok(html::html_to_text(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn extractor() -> HttpExtractor {
        HttpExtractor::new(Duration::from_secs(5), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_web_text_extracts_main_region() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/about"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><nav>x</nav><main>Ciao, sono Giulia</main></body></html>"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/about", server.uri());
        let text = extractor().web_text("web:about", &url).await.unwrap();
        assert_eq!(text, "Ciao, sono Giulia");
    }

    #[tokio::test]
    async fn test_web_text_accepts_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<p>Not here</p>"))
            .mount(&server)
            .await;

        let text = extractor().web_text("web:x", &server.uri()).await.unwrap();
        assert_eq!(text, "Not here");
    }

    #[tokio::test]
    async fn test_web_timeout_is_tagged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let slow = HttpExtractor::new(Duration::from_millis(50), Duration::from_secs(1)).unwrap();
        let err = slow.web_text("web:slow", &server.uri()).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout { ref operation } if operation == "web:slow"));
    }

    #[tokio::test]
    async fn test_invalid_pdf_is_an_extraction_error() {
        let err = extractor()
            .pdf_text("pdf:broken.pdf", Bytes::from_static(b"not a pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }
}
