// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::config::CHOICES_PER_QUESTION;
use crate::models::question::{FullQuestion, PublicQuestion};

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Quiz {
    pub id: i64,

    pub subject_id: i64,

    /// The administrator who authored (or last edited) the quiz.
    pub admin_id: i64,

    pub title: String,

    pub description: String,

    /// Students only see and take published quizzes.
    pub is_published: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One authored choice: its text plus the answer-key flag.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChoiceInput {
    pub choice_text: String,
    pub is_correct: bool,
}

/// One authored question with its fixed set of choices.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionInput {
    pub question_text: String,
    pub choices: Vec<ChoiceInput>,
}

/// DTO for creating a new quiz with its full question set.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateQuizRequest {
    pub subject_id: i64,
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 characters."
    ))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(custom(function = validate_questions))]
    pub questions: Vec<QuestionInput>,
}

/// DTO for replacing a quiz: same shape as creation minus the subject,
/// since a quiz never moves between subjects.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReplaceQuizRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 characters."
    ))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(custom(function = validate_questions))]
    pub questions: Vec<QuestionInput>,
}

/// DTO for toggling quiz visibility.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishQuizRequest {
    pub is_published: bool,
}

/// A quiz as served to students: questions included, answer key withheld.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizDetail {
    pub id: i64,
    pub subject_id: i64,
    pub title: String,
    pub description: String,
    pub is_published: bool,
    pub questions: Vec<PublicQuestion>,
}

/// A quiz as served to the admin edit view: answer key included.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizWithKey {
    pub id: i64,
    pub subject_id: i64,
    pub title: String,
    pub description: String,
    pub is_published: bool,
    pub questions: Vec<FullQuestion>,
}

/// Structural rules for an authored question set.
///
/// Questions with blank text are tolerated here because the handler skips
/// them on insert (the authoring form submits empty trailing slots). Every
/// question that is kept must carry the fixed choice count and exactly one
/// correct answer.
fn validate_questions(questions: &[QuestionInput]) -> Result<(), validator::ValidationError> {
    let mut kept = 0;

    for question in questions {
        if question.question_text.trim().is_empty() {
            continue;
        }
        kept += 1;

        if question.question_text.len() > 1000 {
            return Err(validator::ValidationError::new("question_too_long"));
        }

        if question.choices.len() != CHOICES_PER_QUESTION {
            return Err(validator::ValidationError::new("wrong_choice_count"));
        }

        for choice in &question.choices {
            if choice.choice_text.trim().is_empty() {
                return Err(validator::ValidationError::new("blank_choice"));
            }
            if choice.choice_text.len() > 500 {
                return Err(validator::ValidationError::new("choice_too_long"));
            }
        }

        let correct = question.choices.iter().filter(|c| c.is_correct).count();
        if correct != 1 {
            return Err(validator::ValidationError::new("need_exactly_one_correct"));
        }
    }

    if kept == 0 {
        return Err(validator::ValidationError::new("no_questions"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str, correct: usize) -> QuestionInput {
        QuestionInput {
            question_text: text.to_string(),
            choices: (0..CHOICES_PER_QUESTION)
                .map(|i| ChoiceInput {
                    choice_text: format!("choice {i}"),
                    is_correct: i == correct,
                })
                .collect(),
        }
    }

    #[test]
    fn accepts_a_well_formed_question_set() {
        let questions = vec![question("What is 2 + 2?", 0), question("Capital of France?", 2)];
        assert!(validate_questions(&questions).is_ok());
    }

    #[test]
    fn blank_questions_are_skipped_but_not_counted() {
        let questions = vec![question("   ", 0), question("Real question?", 1)];
        assert!(validate_questions(&questions).is_ok());

        let only_blank = vec![question("", 0)];
        let err = validate_questions(&only_blank).unwrap_err();
        assert_eq!(err.code, "no_questions");
    }

    #[test]
    fn rejects_wrong_choice_count() {
        let mut q = question("How many?", 0);
        q.choices.pop();
        let err = validate_questions(&[q]).unwrap_err();
        assert_eq!(err.code, "wrong_choice_count");
    }

    #[test]
    fn rejects_zero_or_multiple_correct_flags() {
        let mut none_correct = question("Which?", 0);
        for c in &mut none_correct.choices {
            c.is_correct = false;
        }
        let err = validate_questions(&[none_correct]).unwrap_err();
        assert_eq!(err.code, "need_exactly_one_correct");

        let mut two_correct = question("Which?", 0);
        two_correct.choices[1].is_correct = true;
        let err = validate_questions(&[two_correct]).unwrap_err();
        assert_eq!(err.code, "need_exactly_one_correct");
    }

    #[test]
    fn rejects_blank_choice_text() {
        let mut q = question("Which?", 0);
        q.choices[3].choice_text = "  ".to_string();
        let err = validate_questions(&[q]).unwrap_err();
        assert_eq!(err.code, "blank_choice");
    }
}
