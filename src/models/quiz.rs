use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a quiz opens a chapter (gating its content) or closes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizType {
    Start,
    End,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub chapter_id: Uuid,
    pub title: String,
    pub quiz_type: QuizType,
    /// Minimum score, in percent, needed to pass.
    pub passing_score: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub question: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub order_index: i32,
}

impl QuizQuestion {
    pub fn is_correct(&self, answer: &str) -> bool {
        let given = answer.trim();
        let expected = self.correct_answer.trim();
        match self.question_type {
            QuestionType::MultipleChoice => given == expected,
            QuestionType::TrueFalse => given.eq_ignore_ascii_case(expected),
        }
    }

    /// Options a student may pick from. True/false questions stored without
    /// options get the two canonical ones.
    pub fn choices(&self) -> Vec<String> {
        match self.question_type {
            QuestionType::TrueFalse if self.options.is_empty() => {
                vec!["True".to_string(), "False".to_string()]
            }
            _ => self.options.clone(),
        }
    }
}
