use std::time::Duration;

use futures::StreamExt;
use reqwest::{header, Client, StatusCode};
use tracing::{info, warn};

use crate::error::QuizError;
use crate::utils::pdf::is_pdf;

// Firefox ESR User-Agent string to reduce server-side variance
pub const FIREFOX_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:115.0) Gecko/20100101 Firefox/115.0";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_PDF_MB: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_pdf_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_pdf_bytes: DEFAULT_MAX_PDF_MB * 1024 * 1024,
            user_agent: FIREFOX_UA.to_string(),
        }
    }
}

/// Downloads PDF documents over HTTP(S).
pub struct Downloader {
    client: Client,
    max_pdf_bytes: u64,
}

impl Downloader {
    pub fn new(config: &FetchConfig) -> Result<Self, QuizError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_pdf_bytes: config.max_pdf_bytes,
        })
    }

    /// Fetches the raw bytes at `pdf_url`.
    ///
    /// Anything but a `200 OK` is reported as [`QuizError::Download`] carrying
    /// the numeric status.
    pub async fn download_pdf(&self, pdf_url: &str) -> Result<Vec<u8>, QuizError> {
        let url = url::Url::parse(pdf_url).map_err(|e| QuizError::InvalidUrl(e.to_string()))?;

        info!(target: "pdf_quiz::download", url = %url, "Starting HTTP fetch");

        let response = self.client.get(url.as_str()).send().await.map_err(|e| {
            warn!(target: "pdf_quiz::download", url = %url, "HTTP transport error: {}", e);
            QuizError::Request(e)
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(target: "pdf_quiz::download", url = %url, status = status.as_u16(), "HTTP non-200 status");
            return Err(QuizError::Download(status.as_u16()));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_pdf_bytes {
                warn!(target: "pdf_quiz::download", url = %url, size = len, limit = self.max_pdf_bytes, "PDF too large; refusing");
                return Err(QuizError::TooLarge {
                    size: len,
                    limit: self.max_pdf_bytes,
                });
            }
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(|s| s.to_string());

        // Read chunk by chunk so a body without Content-Length cannot grow past the limit.
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                warn!(target: "pdf_quiz::download", url = %url, "Body read failed: {}", e);
                QuizError::Request(e)
            })?;
            let size = (body.len() + chunk.len()) as u64;
            if size > self.max_pdf_bytes {
                warn!(target: "pdf_quiz::download", url = %url, size = size, limit = self.max_pdf_bytes, "PDF too large; refusing");
                return Err(QuizError::TooLarge {
                    size,
                    limit: self.max_pdf_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }
        let size = body.len() as u64;

        let head = &body[..body.len().min(512)];
        if !is_pdf(content_type.as_deref(), head) {
            warn!(target: "pdf_quiz::download", url = %url, ct = ?content_type, "Body does not look like a PDF; extracting anyway");
        }

        info!(target: "pdf_quiz::download", url = %url, size = size, ct = ?content_type, "HTTP fetch completed");
        Ok(body)
    }
}
