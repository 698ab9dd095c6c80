use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::progress::{ProgressRecord, QuizAttempt};
use crate::models::quiz::{QuestionType, Quiz, QuizQuestion, QuizType};
use crate::services::progress_service::{rounded_percent, PROGRESS_CONFLICT_KEY};
use crate::store::{self, tables, DataStore, Order, Query, Resolution};

#[derive(Debug, Clone, Serialize)]
pub struct GradedQuestion {
    pub question_id: Uuid,
    pub answer: String,
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    pub quiz_id: Uuid,
    pub quiz_type: QuizType,
    pub score: i32,
    pub passing_score: i32,
    pub passed: bool,
    pub correct_count: usize,
    pub total_count: usize,
    pub questions: Vec<GradedQuestion>,
}

impl QuizResult {
    pub fn to_attempt(&self) -> QuizAttempt {
        QuizAttempt {
            score: self.score,
            passed: self.passed,
            answers: self
                .questions
                .iter()
                .map(|q| (q.question_id, q.answer.clone()))
                .collect(),
            completed_at: Utc::now(),
            quiz_type: self.quiz_type,
        }
    }
}

/// Grades `answers` (aligned with `questions`) against `quiz.passing_score`.
pub fn score_quiz(quiz: &Quiz, questions: &[QuizQuestion], answers: &[String]) -> QuizResult {
    let graded: Vec<GradedQuestion> = questions
        .iter()
        .zip(answers)
        .map(|(q, answer)| GradedQuestion {
            question_id: q.id,
            answer: answer.clone(),
            is_correct: q.is_correct(answer),
            correct_answer: q.correct_answer.clone(),
            explanation: q.explanation.clone(),
        })
        .collect();

    let total_count = questions.len();
    let correct_count = graded.iter().filter(|g| g.is_correct).count();
    let score = rounded_percent(correct_count, total_count) as i32;

    QuizResult {
        quiz_id: quiz.id,
        quiz_type: quiz.quiz_type,
        score,
        passing_score: quiz.passing_score,
        passed: score >= quiz.passing_score,
        correct_count,
        total_count,
        questions: graded,
    }
}

#[derive(Debug, Clone)]
pub enum QuizState {
    NotStarted,
    InProgress { current: usize },
    Submitted(QuizResult),
}

/// Linear walk through a quiz: one question at a time, forward only once the
/// current question is answered, submit only from the last question.
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: Quiz,
    questions: Vec<QuizQuestion>,
    answers: Vec<Option<String>>,
    state: QuizState,
}

impl QuizSession {
    pub fn new(quiz: Quiz, mut questions: Vec<QuizQuestion>) -> Result<Self> {
        if questions.is_empty() {
            return Err(Error::BadRequest(format!(
                "Quiz '{}' has no questions",
                quiz.title
            )));
        }
        questions.sort_by_key(|q| q.order_index);
        let answers = vec![None; questions.len()];
        Ok(Self {
            quiz,
            questions,
            answers,
            state: QuizState::NotStarted,
        })
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn start(&mut self) -> Result<()> {
        match self.state {
            QuizState::NotStarted => {
                self.state = QuizState::InProgress { current: 0 };
                Ok(())
            }
            _ => Err(Error::BadRequest("Quiz has already been started".to_string())),
        }
    }

    fn current(&self) -> Result<usize> {
        match self.state {
            QuizState::InProgress { current } => Ok(current),
            QuizState::NotStarted => Err(Error::BadRequest("Quiz has not been started".to_string())),
            QuizState::Submitted(_) => {
                Err(Error::BadRequest("Quiz has already been submitted".to_string()))
            }
        }
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.current().ok().map(|i| &self.questions[i])
    }

    pub fn select_answer(&mut self, answer: &str) -> Result<()> {
        let current = self.current()?;
        let question = &self.questions[current];
        if !is_valid_choice(question, answer) {
            return Err(Error::BadRequest(format!(
                "'{}' is not an option for question {}",
                answer.trim(),
                question.id
            )));
        }
        self.answers[current] = Some(answer.trim().to_string());
        Ok(())
    }

    fn is_last(&self, current: usize) -> bool {
        current + 1 == self.questions.len()
    }

    pub fn can_go_next(&self) -> bool {
        match self.current() {
            Ok(current) => self.answers[current].is_some() && !self.is_last(current),
            Err(_) => false,
        }
    }

    pub fn can_submit(&self) -> bool {
        match self.current() {
            Ok(current) => self.is_last(current) && self.answers.iter().all(Option::is_some),
            Err(_) => false,
        }
    }

    pub fn next(&mut self) -> Result<()> {
        let current = self.current()?;
        if !self.can_go_next() {
            return Err(Error::BadRequest(format!(
                "Question {} must be answered before moving on",
                current + 1
            )));
        }
        self.state = QuizState::InProgress {
            current: current + 1,
        };
        Ok(())
    }

    pub fn previous(&mut self) -> Result<()> {
        let current = self.current()?;
        if current == 0 {
            return Err(Error::BadRequest("Already at the first question".to_string()));
        }
        self.state = QuizState::InProgress {
            current: current - 1,
        };
        Ok(())
    }

    pub fn submit(&mut self) -> Result<&QuizResult> {
        self.current()?;
        if !self.can_submit() {
            return Err(Error::BadRequest(
                "All questions must be answered and the last question reached before submitting"
                    .to_string(),
            ));
        }
        let answers: Vec<String> = self.answers.iter().flatten().cloned().collect();
        let result = score_quiz(&self.quiz, &self.questions, &answers);
        self.state = QuizState::Submitted(result);
        match &self.state {
            QuizState::Submitted(result) => Ok(result),
            _ => Err(Error::Internal("Quiz state did not advance".to_string())),
        }
    }

    /// Plays a complete answer sheet through the session, in question order.
    pub fn run(mut self, answers: &HashMap<Uuid, String>) -> Result<QuizResult> {
        self.start()?;
        loop {
            let question_id = self.questions[self.current()?].id;
            let answer = answers.get(&question_id).ok_or_else(|| {
                Error::BadRequest(format!("Question {} was not answered", question_id))
            })?;
            self.select_answer(answer)?;
            if self.can_submit() {
                return self.submit().cloned();
            }
            self.next()?;
        }
    }
}

fn is_valid_choice(question: &QuizQuestion, answer: &str) -> bool {
    let answer = answer.trim();
    if answer.is_empty() {
        return false;
    }
    match question.question_type {
        QuestionType::TrueFalse => question
            .choices()
            .iter()
            .any(|c| c.trim().eq_ignore_ascii_case(answer)),
        QuestionType::MultipleChoice if question.options.is_empty() => true,
        QuestionType::MultipleChoice => question.options.iter().any(|o| o.trim() == answer),
    }
}

#[derive(Clone)]
pub struct QuizService {
    store: Arc<dyn DataStore>,
}

impl QuizService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn get_quiz(&self, chapter_id: Uuid, quiz_type: QuizType) -> Result<Quiz> {
        let kind = match quiz_type {
            QuizType::Start => "start",
            QuizType::End => "end",
        };
        let query = Query::table(tables::QUIZZES)
            .eq("chapter_id", chapter_id)
            .eq("quiz_type", kind);
        store::fetch_one(self.store.as_ref(), &query, "Quiz").await
    }

    pub async fn get_quiz_by_id(&self, chapter_id: Uuid, quiz_id: Uuid) -> Result<Quiz> {
        let query = Query::table(tables::QUIZZES)
            .eq("id", quiz_id)
            .eq("chapter_id", chapter_id);
        store::fetch_one(self.store.as_ref(), &query, "Quiz").await
    }

    pub async fn list_questions(&self, quiz_id: Uuid) -> Result<Vec<QuizQuestion>> {
        let query = Query::table(tables::QUIZ_QUESTIONS)
            .eq("quiz_id", quiz_id)
            .order_by("order_index", Order::Asc);
        store::fetch_all(self.store.as_ref(), &query).await
    }

    /// Merges the attempt into the chapter's progress record under the quiz
    /// id, replacing an earlier attempt at the same quiz.
    pub async fn record_attempt(
        &self,
        user_id: Uuid,
        chapter_id: Uuid,
        result: &QuizResult,
    ) -> Result<QuizAttempt> {
        let query = Query::table(tables::STUDENT_PROGRESS)
            .eq("user_id", user_id)
            .eq("chapter_id", chapter_id);
        let existing: Option<ProgressRecord> =
            store::fetch_optional(self.store.as_ref(), &query).await?;

        let now = Utc::now();
        let (started_at, mut attempts) = match existing {
            Some(record) => (record.started_at.unwrap_or(now), record.quiz_attempts),
            None => (now, BTreeMap::new()),
        };
        let attempt = result.to_attempt();
        attempts.insert(result.quiz_id, attempt.clone());

        let row = json!({
            "user_id": user_id,
            "chapter_id": chapter_id,
            "started_at": started_at,
            "quiz_attempts": attempts,
        });
        self.store
            .upsert(
                tables::STUDENT_PROGRESS,
                row,
                PROGRESS_CONFLICT_KEY,
                Resolution::Merge,
            )
            .await?;

        tracing::info!(
            %user_id,
            %chapter_id,
            quiz_id = %result.quiz_id,
            score = result.score,
            passed = result.passed,
            "Quiz attempt recorded"
        );
        Ok(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockDataStore;

    fn quiz(passing_score: i32) -> Quiz {
        Quiz {
            id: Uuid::new_v4(),
            chapter_id: Uuid::new_v4(),
            title: "Warm-up".into(),
            quiz_type: QuizType::Start,
            passing_score,
        }
    }

    fn mc(quiz: &Quiz, order_index: i32, correct: &str) -> QuizQuestion {
        QuizQuestion {
            id: Uuid::new_v4(),
            quiz_id: quiz.id,
            question: format!("Q{}", order_index),
            question_type: QuestionType::MultipleChoice,
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: correct.into(),
            explanation: Some("because".into()),
            order_index,
        }
    }

    #[test]
    fn three_of_four_meets_seventy_five() {
        let q = quiz(75);
        let questions: Vec<QuizQuestion> = (0..4).map(|i| mc(&q, i, "a")).collect();
        let answers = vec!["a".to_string(), "a".into(), "a".into(), "b".into()];

        let result = score_quiz(&q, &questions, &answers);
        assert_eq!(result.score, 75);
        assert!(result.passed);
        assert_eq!(result.correct_count, 3);
    }

    #[test]
    fn score_just_below_threshold_fails() {
        let q = quiz(70);
        let questions: Vec<QuizQuestion> = (0..3).map(|i| mc(&q, i, "a")).collect();
        let answers = vec!["a".to_string(), "a".into(), "c".into()];
        let result = score_quiz(&q, &questions, &answers);
        assert_eq!(result.score, 67);
        assert!(!result.passed);
    }

    #[test]
    fn session_walks_forward_and_back() {
        let q = quiz(50);
        let questions = vec![mc(&q, 2, "b"), mc(&q, 1, "a")];
        let first_id = questions[1].id;
        let mut session = QuizSession::new(q, questions).unwrap();

        assert!(matches!(session.state(), QuizState::NotStarted));
        assert!(session.select_answer("a").is_err());
        session.start().unwrap();
        assert_eq!(session.current_question().unwrap().id, first_id);

        assert!(!session.can_go_next());
        assert!(session.next().is_err());
        assert!(session.previous().is_err());
        assert!(session.submit().is_err());

        session.select_answer("a").unwrap();
        assert!(session.can_go_next());
        session.next().unwrap();
        assert!(!session.can_go_next());
        assert!(!session.can_submit());

        session.previous().unwrap();
        assert_eq!(session.current_question().unwrap().id, first_id);
        session.next().unwrap();

        session.select_answer("c").unwrap();
        assert!(session.can_submit());
        let result = session.submit().unwrap().clone();
        assert_eq!(result.score, 50);
        assert!(result.passed);

        assert!(matches!(session.state(), QuizState::Submitted(_)));
        assert!(session.next().is_err());
        assert!(session.submit().is_err());
    }

    #[test]
    fn unknown_option_is_rejected() {
        let q = quiz(50);
        let questions = vec![mc(&q, 0, "a")];
        let mut session = QuizSession::new(q, questions).unwrap();
        session.start().unwrap();
        assert!(session.select_answer("z").is_err());
        assert!(session.select_answer("   ").is_err());
    }

    #[test]
    fn empty_quiz_cannot_start() {
        assert!(matches!(
            QuizSession::new(quiz(50), vec![]),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn run_requires_every_answer() {
        let q = quiz(100);
        let questions = vec![mc(&q, 0, "a"), mc(&q, 1, "b")];
        let mut answers = HashMap::new();
        answers.insert(questions[0].id, "a".to_string());

        let session = QuizSession::new(q.clone(), questions.clone()).unwrap();
        assert!(session.run(&answers).is_err());

        answers.insert(questions[1].id, "b".to_string());
        let result = QuizSession::new(q, questions).unwrap().run(&answers).unwrap();
        assert_eq!(result.score, 100);
        assert!(result.passed);
    }

    #[test]
    fn true_false_accepts_any_case() {
        let q = quiz(100);
        let question = QuizQuestion {
            question_type: QuestionType::TrueFalse,
            options: vec![],
            correct_answer: "False".into(),
            ..mc(&q, 0, "")
        };
        let mut answers = HashMap::new();
        answers.insert(question.id, "false".to_string());
        let result = QuizSession::new(q, vec![question]).unwrap().run(&answers).unwrap();
        assert!(result.passed);
    }

    #[tokio::test]
    async fn attempt_is_merged_into_existing_record() {
        let user = Uuid::new_v4();
        let q = quiz(50);
        let chapter = q.chapter_id;
        let earlier_quiz = Uuid::new_v4();
        let questions = vec![mc(&q, 0, "a")];
        let result = score_quiz(&q, &questions, &["a".to_string()]);
        let quiz_id = q.id;

        let mut store = MockDataStore::new();
        store.expect_select().times(1).returning(move |_| {
            Ok(vec![json!({
                "user_id": user,
                "chapter_id": chapter,
                "started_at": "2024-05-01T08:00:00Z",
                "completed": false,
                "completed_at": null,
                "quiz_attempts": {
                    earlier_quiz.to_string(): {
                        "score": 100,
                        "passed": true,
                        "answers": {},
                        "completed_at": "2024-05-01T08:10:00Z",
                        "quiz_type": "end"
                    }
                }
            })])
        });
        store
            .expect_upsert()
            .withf(move |table, row, on_conflict, resolution| {
                let attempts = row["quiz_attempts"].as_object().unwrap();
                table == tables::STUDENT_PROGRESS
                    && on_conflict == PROGRESS_CONFLICT_KEY
                    && *resolution == Resolution::Merge
                    && attempts.len() == 2
                    && attempts[&quiz_id.to_string()]["passed"] == json!(true)
                    && attempts[&quiz_id.to_string()]["quiz_type"] == json!("start")
                    && row["started_at"] == json!("2024-05-01T08:00:00Z")
            })
            .times(1)
            .returning(|_, _, _, _| Ok(vec![]));

        let svc = QuizService::new(Arc::new(store));
        let attempt = svc.record_attempt(user, chapter, &result).await.unwrap();
        assert_eq!(attempt.score, 100);
        assert_eq!(attempt.answers.len(), 1);
    }

    #[tokio::test]
    async fn resubmission_replaces_previous_attempt() {
        let user = Uuid::new_v4();
        let q = quiz(50);
        let chapter = q.chapter_id;
        let quiz_id = q.id;
        let questions = vec![mc(&q, 0, "a")];
        let result = score_quiz(&q, &questions, &["b".to_string()]);

        let mut store = MockDataStore::new();
        store.expect_select().returning(move |_| {
            Ok(vec![json!({
                "user_id": user,
                "chapter_id": chapter,
                "started_at": null,
                "completed": false,
                "completed_at": null,
                "quiz_attempts": {
                    quiz_id.to_string(): {
                        "score": 100,
                        "passed": true,
                        "completed_at": "2024-05-01T08:10:00Z",
                        "quiz_type": "start"
                    }
                }
            })])
        });
        store
            .expect_upsert()
            .withf(move |_, row, _, _| {
                let attempts = row["quiz_attempts"].as_object().unwrap();
                attempts.len() == 1 && attempts[&quiz_id.to_string()]["score"] == json!(0)
            })
            .returning(|_, _, _, _| Ok(vec![]));

        let svc = QuizService::new(Arc::new(store));
        let attempt = svc.record_attempt(user, chapter, &result).await.unwrap();
        assert!(!attempt.passed);
    }
}
