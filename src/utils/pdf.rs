// PDF text extraction for the question pipeline.
// Keep this module a thin layer over `pdf-extract`.

use crate::error::QuizError;

/// Extracts the text of a PDF held fully in memory.
///
/// Pages are extracted one by one and joined with [`join_pages`].
pub fn extract_text_from_pdf_mem(bytes: &[u8]) -> Result<String, QuizError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| QuizError::Extraction(e.to_string()))?;
    Ok(join_pages(pages))
}

/// Concatenates page texts, each followed by a newline. Pages that produced
/// no text are skipped entirely.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for page in pages {
        let page = page.as_ref();
        if page.is_empty() {
            continue;
        }
        text.push_str(page);
        text.push('\n');
    }
    text
}

/// Returns true if given content-type or head indicates a PDF file.
/// - Content-Type: application/pdf (case-insensitive, substring match)
/// - Magic bytes: %PDF-
pub fn is_pdf(content_type: Option<&str>, head: &[u8]) -> bool {
    let ct = content_type.unwrap_or("").to_ascii_lowercase();
    ct.contains("application/pdf") || head.starts_with(b"%PDF-")
}

#[cfg(test)]
mod tests {
    use super::{extract_text_from_pdf_mem, is_pdf, join_pages};
    use crate::error::QuizError;

    #[test]
    fn join_skips_empty_pages() {
        let text = join_pages(["1. Q\na) x", "", "b) y"]);
        assert_eq!(text, "1. Q\na) x\nb) y\n");
    }

    #[test]
    fn join_of_no_pages_is_empty() {
        assert_eq!(join_pages(Vec::<String>::new()), "");
    }

    #[test]
    fn detects_pdf_by_header_or_magic() {
        assert!(is_pdf(Some("Application/PDF; charset=binary"), b""));
        assert!(is_pdf(None, b"%PDF-1.7\n"));
        assert!(!is_pdf(Some("text/html"), b"<html>"));
    }

    #[test]
    fn garbage_bytes_fail_extraction() {
        let err = extract_text_from_pdf_mem(b"this is not a pdf").unwrap_err();
        assert!(matches!(err, QuizError::Extraction(_)));
        assert!(err
            .to_string()
            .starts_with("Failed to extract text from PDF: "));
    }
}
