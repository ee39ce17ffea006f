// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use utoipa::ToSchema;

/// Represents the 'questions' table in the database.
///
/// Questions belong to exactly one quiz and are replaced wholesale when the
/// quiz is edited. `position` is the authoring order; submissions are
/// matched to questions by that order, not by id.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub question_text: String,
    pub position: i64,
}

/// Represents the 'answer_choices' table in the database.
/// Exactly one choice per question carries `is_correct = true`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct AnswerChoice {
    pub id: i64,
    pub question_id: i64,
    pub choice_text: String,
    pub is_correct: bool,
    pub position: i64,
}

/// DTO for sending a choice to students (correctness flag withheld).
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicChoice {
    pub id: i64,
    pub choice_text: String,
}

/// DTO for sending a question to students (answer key withheld).
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub choices: Vec<PublicChoice>,
}

/// DTO for the admin edit view: question with its full answer key.
#[derive(Debug, Serialize, ToSchema)]
pub struct FullQuestion {
    pub id: i64,
    pub question_text: String,
    pub choices: Vec<AnswerChoice>,
}
