// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{PublicChoice, PublicQuestion},
        quiz::{Quiz, QuizDetail},
        result::{SubmitQuizRequest, SubmitQuizResponse},
    },
    scoring::{QuestionKey, Submission, score},
    utils::jwt::Claims,
};

/// Helper struct for fetching a quiz's questions in authored order.
#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: i64,
    question_text: String,
}

/// Helper struct for fetching answer choices across a whole quiz.
#[derive(sqlx::FromRow)]
struct ChoiceRow {
    id: i64,
    question_id: i64,
    choice_text: String,
    is_correct: bool,
}

/// Retrieves a quiz for taking: questions and choices, answer key withheld.
///
/// Unpublished quizzes are visible to admins only; students get a 404 so the
/// route does not leak their existence.
#[utoipa::path(
    get,
    path = "/api/quizzes/{id}",
    params(("id" = i64, Path, description = "Quiz ID")),
    responses(
        (status = 200, description = "The quiz without its answer key", body = QuizDetail),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn get_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = fetch_visible_quiz(&pool, id, &claims).await?;

    let (questions, mut choices_by_question) = fetch_question_set(&pool, id).await?;

    let questions = questions
        .into_iter()
        .map(|q| PublicQuestion {
            id: q.id,
            question_text: q.question_text,
            choices: choices_by_question
                .remove(&q.id)
                .unwrap_or_default()
                .into_iter()
                .map(|c| PublicChoice {
                    id: c.id,
                    choice_text: c.choice_text,
                })
                .collect(),
        })
        .collect();

    Ok(Json(QuizDetail {
        id: quiz.id,
        subject_id: quiz.subject_id,
        title: quiz.title,
        description: quiz.description,
        is_published: quiz.is_published,
        questions,
    }))
}

/// Submits a student's answers for grading.
///
/// * Fetches the quiz's questions and answer keys in authored order.
/// * Runs the scoring engine over the ordered selections.
/// * Persists one result row per submission; retakes append.
#[utoipa::path(
    post,
    path = "/api/quizzes/{id}/submit",
    params(("id" = i64, Path, description = "Quiz ID")),
    request_body = SubmitQuizRequest,
    responses(
        (status = 201, description = "Graded result", body = SubmitQuizResponse),
        (status = 400, description = "Answer count does not match question count"),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn submit_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let student_id = claims.user_id()?;

    fetch_visible_quiz(&pool, id, &claims).await?;

    let (questions, mut choices_by_question) = fetch_question_set(&pool, id).await?;

    let keys: Vec<QuestionKey> = questions
        .iter()
        .map(|q| {
            let choices: HashMap<String, bool> = choices_by_question
                .remove(&q.id)
                .unwrap_or_default()
                .into_iter()
                .map(|c| (c.choice_text, c.is_correct))
                .collect();
            QuestionKey::new(q.id, choices)
        })
        .collect();

    let submission = Submission::from(payload.answers);

    let grade = score(&keys, &submission, Utc::now())?;

    sqlx::query(
        r#"
        INSERT INTO quiz_results
        (quiz_id, student_id, score, right_answers, wrong_answers, completed_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(student_id)
    .bind(i64::from(grade.score))
    .bind(i64::from(grade.right_answers))
    .bind(i64::from(grade.wrong_answers))
    .bind(grade.completed_at)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert quiz result: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitQuizResponse {
            quiz_id: id,
            score: i64::from(grade.score),
            right_answers: i64::from(grade.right_answers),
            wrong_answers: i64::from(grade.wrong_answers),
            completed_at: grade.completed_at,
        }),
    ))
}

/// Fetches a quiz, hiding unpublished ones from non-admins.
async fn fetch_visible_quiz(
    pool: &SqlitePool,
    id: i64,
    claims: &Claims,
) -> Result<Quiz, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, subject_id, admin_id, title, description, is_published, created_at
        FROM quizzes
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if !quiz.is_published && claims.role != "admin" {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(quiz)
}

/// Fetches a quiz's questions in authored order, with every question's
/// choices grouped and ordered. Submissions are matched positionally, so
/// both orderings matter.
async fn fetch_question_set(
    pool: &SqlitePool,
    quiz_id: i64,
) -> Result<(Vec<QuestionRow>, HashMap<i64, Vec<ChoiceRow>>), AppError> {
    let questions = sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT id, question_text
        FROM questions
        WHERE quiz_id = ?
        ORDER BY position, id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let choices = sqlx::query_as::<_, ChoiceRow>(
        r#"
        SELECT c.id, c.question_id, c.choice_text, c.is_correct
        FROM answer_choices c
        JOIN questions q ON q.id = c.question_id
        WHERE q.quiz_id = ?
        ORDER BY c.position, c.id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch answer choices: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let mut choices_by_question: HashMap<i64, Vec<ChoiceRow>> = HashMap::new();
    for choice in choices {
        choices_by_question
            .entry(choice.question_id)
            .or_default()
            .push(choice);
    }

    Ok((questions, choices_by_question))
}
