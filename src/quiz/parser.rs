use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::types::{Question, QuizOption};
use crate::error::QuizError;

// Stem, four lettered options and the answer line. Every segment is lazy and
// may wrap across lines; only a-d are accepted as the answer letter.
static QUESTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)(\d+\..*?)\n(a\) .*?)\n(b\) .*?)\n(c\) .*?)\n(d\) .*?)\nAnswer:\s*([a-d]\))")
        .expect("question pattern is a valid regex")
});

/// Parses every question block in `text`, in document order.
///
/// Text without any matching block yields an empty list. If any matched block
/// names an answer that none of its options carries, the whole parse fails.
pub fn parse_questions(text: &str) -> Result<Vec<Question>, QuizError> {
    let mut questions = Vec::new();

    for caps in QUESTION_PATTERN.captures_iter(text) {
        let stem = caps[1].trim().to_string();
        let options = [
            QuizOption::new(caps[2].trim()),
            QuizOption::new(caps[3].trim()),
            QuizOption::new(caps[4].trim()),
            QuizOption::new(caps[5].trim()),
        ];
        let answer = caps[6].trim();

        let question = resolve_correct(&options, answer)
            .and_then(|correct| Question::new(stem.clone(), options, correct))
            .ok_or_else(|| QuizError::Resolution {
                question: stem,
                answer: answer.to_string(),
            })?;
        questions.push(question);
    }

    debug!(target: "pdf_quiz::parser", count = questions.len(), "Question blocks matched");
    Ok(questions)
}

/// Position of the first option whose text starts with `answer` (e.g. `"c)"`).
pub fn resolve_correct(options: &[QuizOption], answer: &str) -> Option<usize> {
    options
        .iter()
        .position(|option| option.name.starts_with(answer))
}
