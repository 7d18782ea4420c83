pub mod server;
pub mod transport;
pub mod types;

use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::pipeline::parse_pdf_url;
use crate::quiz::Envelope;
use crate::utils::download::Downloader;

use types::{HandlerEvent, HandlerResponse, RequestBody};

pub const MISSING_PDF_URL: &str = "Missing pdfUrl";

/// Request/response entry point: one event in, one response out.
pub struct QuizHandler {
    downloader: Downloader,
}

impl QuizHandler {
    pub fn new(downloader: Downloader) -> Self {
        Self { downloader }
    }

    pub async fn handle(&self, event: HandlerEvent) -> HandlerResponse {
        let request_id = Uuid::new_v4();
        let span = info_span!("request", id = %request_id);
        self.handle_inner(event).instrument(span).await
    }

    async fn handle_inner(&self, event: HandlerEvent) -> HandlerResponse {
        let body = match parse_body(event.body) {
            Ok(body) => body,
            Err(e) => {
                error!("Invalid request body: {}", e);
                return HandlerResponse::internal_error(format!("Invalid request body: {}", e));
            }
        };

        let pdf_url = match body.pdf_url {
            Some(url) if !url.is_empty() => url,
            _ => {
                warn!("Request without pdfUrl");
                return HandlerResponse::bad_request(MISSING_PDF_URL);
            }
        };

        info!("Parsing questions from {}", pdf_url);
        match parse_pdf_url(&self.downloader, &pdf_url).await {
            Ok(questions) => {
                info!(count = questions.len(), "Request succeeded");
                HandlerResponse::ok(&Envelope::Data(questions))
            }
            Err(e) => {
                error!("Request failed: {}", e);
                HandlerResponse::internal_error(e.to_string())
            }
        }
    }
}

fn parse_body(body: Option<serde_json::Value>) -> Result<RequestBody, serde_json::Error> {
    match body {
        None | Some(serde_json::Value::Null) => Ok(RequestBody::default()),
        Some(serde_json::Value::String(raw)) => serde_json::from_str(&raw),
        Some(value) => serde_json::from_value(value),
    }
}
