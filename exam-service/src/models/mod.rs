pub mod question;

pub use question::{fallback_questions, Question, QUESTION_COUNT};
