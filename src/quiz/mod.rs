pub mod parser;
pub mod types;

pub use parser::parse_questions;
pub use types::{Envelope, Question};
