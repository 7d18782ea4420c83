use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// One answer choice, e.g. `"b) 4"`. The letter prefix is part of the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizOption {
    pub name: String,
}

impl QuizOption {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A parsed multiple-choice question.
///
/// The correct answer is stored as an index into `options`, so it can never
/// point at text that is not one of the four choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub question: String,
    pub options: [QuizOption; 4],
    correct: usize,
}

impl Question {
    /// Returns `None` when `correct` is out of range.
    pub fn new(question: String, options: [QuizOption; 4], correct: usize) -> Option<Self> {
        if correct >= options.len() {
            return None;
        }
        Some(Self {
            question,
            options,
            correct,
        })
    }

    pub fn correct_answer(&self) -> &QuizOption {
        &self.options[self.correct]
    }
}

impl Serialize for Question {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Question", 3)?;
        state.serialize_field("question", &self.question)?;
        state.serialize_field("options", &self.options)?;
        state.serialize_field("correctAns", &self.correct_answer().name)?;
        state.end()
    }
}

/// Top-level JSON document handed back to callers: `{"data": [...]}` or
/// `{"error": "..."}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope {
    Data(Vec<Question>),
    Error(String),
}

impl Envelope {
    pub fn error(message: impl Into<String>) -> Self {
        Envelope::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Envelope::Error(_))
    }

    /// Compact single-line JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| fallback_error_json(&e))
    }

    /// Pretty JSON with four-space indentation.
    pub fn to_pretty_json(&self) -> String {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        match self.serialize(&mut ser) {
            // serde_json only ever writes valid UTF-8
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(e) => fallback_error_json(&e),
        }
    }
}

fn fallback_error_json(err: &serde_json::Error) -> String {
    serde_json::json!({ "error": format!("Failed to serialize response: {}", err) }).to_string()
}
