use thiserror::Error;

/// Every failure the fetch → extract → parse pipeline can produce.
///
/// The `Display` text of each variant is exactly what ends up in the
/// `{"error": ...}` envelope, so keep the messages user facing.
#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Failed to download PDF: {0}")]
    Download(u16),

    #[error("Failed to download PDF: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("PDF exceeds the allowed size limit ({size} > {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("Failed to extract text from PDF: {0}")]
    Extraction(String),

    #[error("No option matches answer {answer} for question \"{question}\"")]
    Resolution { question: String, answer: String },
}
