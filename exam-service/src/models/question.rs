use serde::{Deserialize, Serialize};

/// Number of questions in every set served to the exam client.
pub const QUESTION_COUNT: usize = 5;

/// A single exam question as delivered to the client.
///
/// Within one response `id` always equals the 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub topic: String,
}

impl Question {
    pub fn new(id: u32, text: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            topic: topic.into(),
        }
    }
}

/// Offline question set served whenever generation is disabled or fails.
pub fn fallback_questions() -> Vec<Question> {
    vec![
        Question::new(
            1,
            "Explain the concept of Object-Oriented Programming (OOP) and list its four main principles with brief descriptions.",
            "OOP Principles",
        ),
        Question::new(
            2,
            "What is the difference between a stack and a queue data structure? Provide examples of real-world applications for each.",
            "Data Structures",
        ),
        Question::new(
            3,
            "Describe what an API (Application Programming Interface) is and explain the difference between REST and GraphQL APIs.",
            "APIs",
        ),
        Question::new(
            4,
            "What is machine learning? Explain the difference between supervised and unsupervised learning with examples.",
            "Machine Learning",
        ),
        Question::new(
            5,
            "Explain the concept of database normalization. What are the benefits and when might you choose to denormalize?",
            "Databases",
        ),
    ]
}
