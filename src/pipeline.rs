use std::time::Instant;

use tracing::info;

use crate::error::QuizError;
use crate::quiz::{parse_questions, Envelope, Question};
use crate::utils::download::Downloader;
use crate::utils::pdf::extract_text_from_pdf_mem;

/// Downloads the PDF at `pdf_url`, extracts its text and parses the questions.
pub async fn parse_pdf_url(
    downloader: &Downloader,
    pdf_url: &str,
) -> Result<Vec<Question>, QuizError> {
    let bytes = downloader.download_pdf(pdf_url).await?;

    info!(target: "pdf_quiz::pipeline", size = bytes.len(), "Starting PDF text extraction");
    let started = Instant::now();
    let text = tokio::task::spawn_blocking(move || extract_text_from_pdf_mem(&bytes))
        .await
        .map_err(|e| QuizError::Extraction(e.to_string()))??;
    info!(
        target: "pdf_quiz::pipeline",
        elapsed_ms = started.elapsed().as_millis() as u64,
        len = text.len(),
        "PDF extraction succeeded"
    );

    let questions = parse_questions(&text)?;
    info!(target: "pdf_quiz::pipeline", count = questions.len(), "Parsed questions");
    Ok(questions)
}

/// Runs the pipeline and folds the outcome into the response envelope.
pub async fn run_to_envelope(downloader: &Downloader, pdf_url: &str) -> Envelope {
    match parse_pdf_url(downloader, pdf_url).await {
        Ok(questions) => Envelope::Data(questions),
        Err(e) => Envelope::error(e.to_string()),
    }
}
