// src/handlers/subject.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        quiz::Quiz,
        result::{QuizReviewEntry, SubjectReview},
        subject::Subject,
    },
    utils::jwt::Claims,
};

/// Lists all subjects.
#[utoipa::path(
    get,
    path = "/api/subjects",
    responses((status = 200, description = "All subjects", body = [Subject]))
)]
pub async fn list_subjects(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let subjects = sqlx::query_as::<_, Subject>(
        r#"
        SELECT id, name, admin_id, created_at
        FROM subjects
        ORDER BY name
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list subjects: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(subjects))
}

/// Retrieves a single subject by ID.
#[utoipa::path(
    get,
    path = "/api/subjects/{id}",
    params(("id" = i64, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "The subject", body = Subject),
        (status = 404, description = "Subject not found")
    )
)]
pub async fn get_subject(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let subject = sqlx::query_as::<_, Subject>(
        r#"
        SELECT id, name, admin_id, created_at
        FROM subjects
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch subject: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Subject not found".to_string()))?;

    Ok(Json(subject))
}

/// Lists the quizzes of one subject.
///
/// Students only see published quizzes; admins see everything.
#[utoipa::path(
    get,
    path = "/api/subjects/{id}/quizzes",
    params(("id" = i64, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Quizzes of the subject", body = [Quiz]),
        (status = 404, description = "Subject not found")
    )
)]
pub async fn list_subject_quizzes(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_subject_exists(&pool, id).await?;

    let mut sql = String::from(
        "SELECT id, subject_id, admin_id, title, description, is_published, created_at
         FROM quizzes WHERE subject_id = ?",
    );
    if claims.role != "admin" {
        sql.push_str(" AND is_published = 1");
    }
    sql.push_str(" ORDER BY id");

    let quizzes = sqlx::query_as::<_, Quiz>(&sql)
        .bind(id)
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list quizzes: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(quizzes))
}

/// A student's review of one subject: their most recent result for every
/// quiz they have taken, plus the average of those scores.
#[utoipa::path(
    get,
    path = "/api/subjects/{id}/review",
    params(("id" = i64, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Latest result per taken quiz", body = SubjectReview),
        (status = 404, description = "Subject not found")
    )
)]
pub async fn subject_review(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;

    ensure_subject_exists(&pool, id).await?;

    // Retakes append rows, so pick the newest result per quiz.
    let quizzes = sqlx::query_as::<_, QuizReviewEntry>(
        r#"
        SELECT
            q.id AS quiz_id,
            q.title AS quiz_title,
            r.score,
            r.right_answers,
            r.wrong_answers,
            r.completed_at
        FROM quizzes q
        JOIN quiz_results r ON r.quiz_id = q.id
        WHERE q.subject_id = ?
          AND r.student_id = ?
          AND r.id = (
              SELECT r2.id FROM quiz_results r2
              WHERE r2.quiz_id = q.id AND r2.student_id = ?
              ORDER BY r2.completed_at DESC, r2.id DESC
              LIMIT 1
          )
        ORDER BY q.id
        "#,
    )
    .bind(id)
    .bind(student_id)
    .bind(student_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch review: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let average_score = if quizzes.is_empty() {
        None
    } else {
        let sum: i64 = quizzes.iter().map(|q| q.score).sum();
        Some(sum as f64 / quizzes.len() as f64)
    };

    Ok(Json(SubjectReview {
        subject_id: id,
        average_score,
        quizzes,
    }))
}

async fn ensure_subject_exists(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM subjects WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check subject: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or(AppError::NotFound("Subject not found".to_string()))?;

    Ok(())
}
