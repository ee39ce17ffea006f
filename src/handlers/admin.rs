// src/handlers/admin.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{AnswerChoice, FullQuestion, Question},
        quiz::{CreateQuizRequest, PublishQuizRequest, QuestionInput, Quiz, QuizWithKey, ReplaceQuizRequest},
        result::StudentResult,
        subject::CreateSubjectRequest,
    },
    utils::{jwt::Claims, sanitize::clean_text},
};

/// Creates a new subject.
/// Admin only. Subject names are unique across the system.
#[utoipa::path(
    post,
    path = "/api/admin/subjects",
    request_body = CreateSubjectRequest,
    responses(
        (status = 201, description = "Subject created"),
        (status = 409, description = "Subject name already used")
    )
)]
pub async fn create_subject(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let admin_id = claims.user_id()?;
    let name = clean_text(&payload.name);

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO subjects (name, admin_id)
        VALUES (?, ?)
        RETURNING id
        "#,
    )
    .bind(&name)
    .bind(admin_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            AppError::Conflict("Subject name already used".to_string())
        } else {
            tracing::error!("Failed to create subject: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Deletes a subject by ID, along with its quizzes and their results.
/// Admin only.
#[utoipa::path(
    delete,
    path = "/api/admin/subjects/{id}",
    params(("id" = i64, Path, description = "Subject ID")),
    responses(
        (status = 204, description = "Subject deleted"),
        (status = 404, description = "Subject not found")
    )
)]
pub async fn delete_subject(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete subject: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Creates a quiz with its full question set in one transaction.
/// Admin only.
#[utoipa::path(
    post,
    path = "/api/admin/quizzes",
    request_body = CreateQuizRequest,
    responses(
        (status = 201, description = "Quiz created"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Subject not found")
    )
)]
pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let admin_id = claims.user_id()?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM subjects WHERE id = ?")
        .bind(payload.subject_id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or(AppError::NotFound("Subject not found".to_string()))?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let quiz_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO quizzes (subject_id, admin_id, title, description)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(payload.subject_id)
    .bind(admin_id)
    .bind(clean_text(&payload.title))
    .bind(payload.description.as_deref().map(clean_text).unwrap_or_default())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    insert_question_set(&mut tx, quiz_id, &payload.questions).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": quiz_id}))))
}

/// Retrieves a quiz with its answer key, for the edit view.
/// Admin only; unpublished quizzes included.
#[utoipa::path(
    get,
    path = "/api/admin/quizzes/{id}/full",
    params(("id" = i64, Path, description = "Quiz ID")),
    responses(
        (status = 200, description = "The quiz with its answer key", body = QuizWithKey),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn get_quiz_full(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, subject_id, admin_id, title, description, is_published, created_at
        FROM quizzes
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, quiz_id, question_text, position
        FROM questions
        WHERE quiz_id = ?
        ORDER BY position, id
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await
    .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let choices = sqlx::query_as::<_, AnswerChoice>(
        r#"
        SELECT c.id, c.question_id, c.choice_text, c.is_correct, c.position
        FROM answer_choices c
        JOIN questions q ON q.id = c.question_id
        WHERE q.quiz_id = ?
        ORDER BY c.position, c.id
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await
    .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let mut choices_by_question: HashMap<i64, Vec<AnswerChoice>> = HashMap::new();
    for choice in choices {
        choices_by_question
            .entry(choice.question_id)
            .or_default()
            .push(choice);
    }

    let questions = questions
        .into_iter()
        .map(|q| FullQuestion {
            id: q.id,
            question_text: q.question_text,
            choices: choices_by_question.remove(&q.id).unwrap_or_default(),
        })
        .collect();

    Ok(Json(QuizWithKey {
        id: quiz.id,
        subject_id: quiz.subject_id,
        title: quiz.title,
        description: quiz.description,
        is_published: quiz.is_published,
        questions,
    }))
}

/// Replaces a quiz's metadata and entire question set.
///
/// Questions and choices are deleted and reinserted wholesale inside one
/// transaction; submitted question order becomes the new authored order.
/// Admin only.
#[utoipa::path(
    put,
    path = "/api/admin/quizzes/{id}",
    params(("id" = i64, Path, description = "Quiz ID")),
    request_body = ReplaceQuizRequest,
    responses(
        (status = 200, description = "Quiz replaced"),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn replace_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<ReplaceQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let admin_id = claims.user_id()?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let result = sqlx::query(
        r#"
        UPDATE quizzes
        SET title = ?, description = ?, admin_id = ?
        WHERE id = ?
        "#,
    )
    .bind(clean_text(&payload.title))
    .bind(payload.description.as_deref().map(clean_text).unwrap_or_default())
    .bind(admin_id)
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    // Choices cascade with their questions.
    sqlx::query("DELETE FROM questions WHERE quiz_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to clear questions: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    insert_question_set(&mut tx, id, &payload.questions).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(StatusCode::OK)
}

/// Publishes or unpublishes a quiz.
/// Admin only.
#[utoipa::path(
    post,
    path = "/api/admin/quizzes/{id}/publish",
    params(("id" = i64, Path, description = "Quiz ID")),
    request_body = PublishQuizRequest,
    responses(
        (status = 200, description = "Visibility updated"),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn publish_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<PublishQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("UPDATE quizzes SET is_published = ? WHERE id = ?")
        .bind(payload.is_published)
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update quiz visibility: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a quiz by ID, along with its questions, choices and results.
/// Admin only.
#[utoipa::path(
    delete,
    path = "/api/admin/quizzes/{id}",
    params(("id" = i64, Path, description = "Quiz ID")),
    responses(
        (status = 204, description = "Quiz deleted"),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn delete_quiz(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists every submission for one quiz, newest first.
/// Admin only.
#[utoipa::path(
    get,
    path = "/api/admin/quizzes/{id}/results",
    params(("id" = i64, Path, description = "Quiz ID")),
    responses(
        (status = 200, description = "Submissions for the quiz", body = [StudentResult]),
        (status = 404, description = "Quiz not found")
    )
)]
pub async fn quiz_results(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let results = sqlx::query_as::<_, StudentResult>(
        r#"
        SELECT u.username, r.score, r.right_answers, r.wrong_answers, r.completed_at
        FROM quiz_results r
        JOIN users u ON u.id = r.student_id
        WHERE r.quiz_id = ?
        ORDER BY r.completed_at DESC, r.id DESC
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch quiz results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(results))
}

/// Inserts a question set for a quiz, skipping blank question slots.
///
/// Question text is sanitized; choice text is stored verbatim because it is
/// the key submissions are matched against.
async fn insert_question_set(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    quiz_id: i64,
    questions: &[QuestionInput],
) -> Result<(), AppError> {
    let kept = questions
        .iter()
        .filter(|q| !q.question_text.trim().is_empty());

    for (position, question) in kept.enumerate() {
        let question_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO questions (quiz_id, question_text, position)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(quiz_id)
        .bind(clean_text(&question.question_text))
        .bind(position as i64)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO answer_choices (question_id, choice_text, is_correct, position) ",
        );
        builder.push_values(
            question.choices.iter().enumerate(),
            |mut b, (choice_position, choice)| {
                b.push_bind(question_id)
                    .push_bind(&choice.choice_text)
                    .push_bind(choice.is_correct)
                    .push_bind(choice_position as i64);
            },
        );

        builder.build().execute(&mut **tx).await.map_err(|e| {
            tracing::error!("Failed to insert answer choices: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;
    }

    Ok(())
}
