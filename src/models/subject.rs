// src/models/subject.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Represents the 'subjects' table in the database.
/// A subject groups the quizzes an administrator authors for it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Subject {
    pub id: i64,

    /// Unique subject name (e.g., "Mathematics").
    pub name: String,

    /// The administrator who created the subject.
    pub admin_id: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new subject.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSubjectRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Subject name length must be between 1 and 100 characters."
    ))]
    pub name: String,
}
