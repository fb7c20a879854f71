pub mod metrics;
pub mod providers;
pub mod questions;

pub use questions::{GenerationError, QuestionProvider};
