use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::quiz::{QuestionType, Quiz, QuizQuestion, QuizType};
use crate::services::quiz_service::QuizResult;

/// A question as shown to students, without its answer key.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub question: String,
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub order_index: i32,
}

impl From<&QuizQuestion> for PublicQuestion {
    fn from(q: &QuizQuestion) -> Self {
        Self {
            id: q.id,
            question: q.question.clone(),
            question_type: q.question_type,
            options: q.choices(),
            order_index: q.order_index,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicQuizResponse {
    pub id: Uuid,
    pub chapter_id: Uuid,
    pub title: String,
    pub quiz_type: QuizType,
    pub passing_score: i32,
    pub total_questions: usize,
    pub questions: Vec<PublicQuestion>,
}

impl PublicQuizResponse {
    pub fn new(quiz: Quiz, questions: &[QuizQuestion]) -> Self {
        Self {
            id: quiz.id,
            chapter_id: quiz.chapter_id,
            title: quiz.title,
            quiz_type: quiz.quiz_type,
            passing_score: quiz.passing_score,
            total_questions: questions.len(),
            questions: questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    #[validate(length(min = 1))]
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    #[validate(length(min = 1), nested)]
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitQuizResponse {
    pub result: QuizResult,
    pub content_unlocked: bool,
}
