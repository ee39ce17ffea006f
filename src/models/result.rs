// src/models/result.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// DTO for submitting quiz answers. One entry per question, in quiz order;
/// `null` marks a question the student left unanswered.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitQuizRequest {
    #[validate(length(min = 1, max = 200), custom(function = validate_answers))]
    pub answers: Vec<Option<String>>,
}

fn validate_answers(answers: &[Option<String>]) -> Result<(), validator::ValidationError> {
    for answer in answers.iter().flatten() {
        if answer.len() > 500 {
            return Err(validator::ValidationError::new("answer_too_long"));
        }
    }
    Ok(())
}

/// The outcome returned to the student right after grading.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitQuizResponse {
    pub quiz_id: i64,
    pub score: i64,
    pub right_answers: i64,
    pub wrong_answers: i64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// One row of a student's review page: their latest result for a quiz.
#[derive(Debug, FromRow, Serialize, ToSchema)]
pub struct QuizReviewEntry {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub score: i64,
    pub right_answers: i64,
    pub wrong_answers: i64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// A student's standing across one subject.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubjectReview {
    pub subject_id: i64,
    /// Mean of the latest scores below, absent when nothing was taken yet.
    pub average_score: Option<f64>,
    pub quizzes: Vec<QuizReviewEntry>,
}

/// One submission as seen by the admin results view.
#[derive(Debug, FromRow, Serialize, ToSchema)]
pub struct StudentResult {
    pub username: String,
    pub score: i64,
    pub right_answers: i64,
    pub wrong_answers: i64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}
