// src/scoring.rs

//! Pure scoring of quiz submissions.
//!
//! Grading is a synchronous computation over already-fetched data: the
//! caller loads the quiz's questions and answer keys, flattens the student's
//! payload into an ordered [`Submission`], and gets back a [`Grade`]. No I/O
//! happens here, so the whole thing is unit-testable without a database.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Answer key for one question: choice text mapped to its correctness flag.
///
/// Authoring guarantees exactly one entry is `true`; grading only ever looks
/// up the flag of the selected text, so a malformed key degrades to wrong
/// answers rather than a panic.
#[derive(Debug, Clone)]
pub struct QuestionKey {
    pub question_id: i64,
    pub choices: HashMap<String, bool>,
}

impl QuestionKey {
    pub fn new(question_id: i64, choices: HashMap<String, bool>) -> Self {
        Self {
            question_id,
            choices,
        }
    }

    /// Whether `choice_text` is the correct answer. Unknown texts count as
    /// incorrect rather than failing the whole submission.
    fn is_correct(&self, choice_text: &str) -> bool {
        self.choices.get(choice_text).copied().unwrap_or(false)
    }
}

/// One student's selections for a quiz attempt, ordered by question
/// position. `None` means the question was left unanswered.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    selections: Vec<Option<String>>,
}

impl Submission {
    pub fn new(selections: Vec<Option<String>>) -> Self {
        Self { selections }
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    fn selections(&self) -> impl Iterator<Item = Option<&str>> {
        self.selections.iter().map(Option::as_deref)
    }
}

impl From<Vec<Option<String>>> for Submission {
    fn from(selections: Vec<Option<String>>) -> Self {
        Self::new(selections)
    }
}

/// Outcome of grading one submission.
///
/// Unanswered questions count toward neither tally, while the score divides
/// by the full question count, so `right_answers + wrong_answers` may be
/// less than the number of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grade {
    pub right_answers: u32,
    pub wrong_answers: u32,
    /// 0-100, rounded half-up from the right/total ratio.
    pub score: u32,
    pub completed_at: DateTime<Utc>,
}

/// Structural failures that grading refuses to paper over.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoreError {
    /// A quiz without questions has no defined score; failing beats
    /// recording a division-by-zero artifact.
    #[error("quiz has no questions to score")]
    EmptyQuiz,

    /// Submission and question list differ in length. Matching is positional,
    /// so truncating or padding would silently grade the wrong answers.
    #[error("submission has {selections} answers for {questions} questions")]
    ShapeMismatch {
        questions: usize,
        selections: usize,
    },
}

/// Grades `submission` against the ordered question `keys`.
///
/// * Questions and selections are matched by index; the caller must pass
///   both in the same order the quiz was served.
/// * A selection is right when its answer-key entry is `true`, wrong when
///   the entry is `false` or the text is unknown.
/// * Unanswered questions are skipped entirely (the historical behavior:
///   they dilute the score through the denominator without counting as
///   wrong).
/// * `completed_at` is supplied by the caller so grading stays pure.
pub fn score(
    keys: &[QuestionKey],
    submission: &Submission,
    completed_at: DateTime<Utc>,
) -> Result<Grade, ScoreError> {
    if keys.is_empty() {
        return Err(ScoreError::EmptyQuiz);
    }

    if submission.len() != keys.len() {
        return Err(ScoreError::ShapeMismatch {
            questions: keys.len(),
            selections: submission.len(),
        });
    }

    let mut right_answers: u32 = 0;
    let mut wrong_answers: u32 = 0;

    for (key, selected) in keys.iter().zip(submission.selections()) {
        let Some(choice_text) = selected else {
            continue;
        };

        if key.is_correct(choice_text) {
            right_answers += 1;
        } else {
            wrong_answers += 1;
        }
    }

    // f64::round rounds half away from zero, which is half-up for a
    // non-negative ratio.
    let score = (100.0 * f64::from(right_answers) / keys.len() as f64).round() as u32;

    Ok(Grade {
        right_answers,
        wrong_answers,
        score,
        completed_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: i64, correct: &str, wrong: &[&str]) -> QuestionKey {
        let mut choices = HashMap::new();
        choices.insert(correct.to_string(), true);
        for w in wrong {
            choices.insert((*w).to_string(), false);
        }
        QuestionKey::new(id, choices)
    }

    fn four_keys() -> Vec<QuestionKey> {
        vec![
            key(1, "A", &["B", "C", "D"]),
            key(2, "B", &["A", "C", "D"]),
            key(3, "C", &["A", "B", "D"]),
            key(4, "D", &["A", "B", "C"]),
        ]
    }

    fn picks(texts: &[&str]) -> Submission {
        Submission::new(texts.iter().map(|t| Some((*t).to_string())).collect())
    }

    #[test]
    fn all_correct_scores_100() {
        let grade = score(&four_keys(), &picks(&["A", "B", "C", "D"]), Utc::now()).unwrap();
        assert_eq!(grade.right_answers, 4);
        assert_eq!(grade.wrong_answers, 0);
        assert_eq!(grade.score, 100);
    }

    #[test]
    fn all_wrong_scores_0() {
        let grade = score(&four_keys(), &picks(&["B", "C", "D", "A"]), Utc::now()).unwrap();
        assert_eq!(grade.right_answers, 0);
        assert_eq!(grade.wrong_answers, 4);
        assert_eq!(grade.score, 0);
    }

    #[test]
    fn three_of_four_scores_75() {
        let grade = score(&four_keys(), &picks(&["A", "B", "C", "A"]), Utc::now()).unwrap();
        assert_eq!(grade.right_answers, 3);
        assert_eq!(grade.wrong_answers, 1);
        assert_eq!(grade.score, 75);
    }

    #[test]
    fn single_question_correct_scores_100() {
        let keys = vec![key(1, "A", &["B", "C", "D"])];
        let grade = score(&keys, &picks(&["A"]), Utc::now()).unwrap();
        assert_eq!(grade.right_answers, 1);
        assert_eq!(grade.wrong_answers, 0);
        assert_eq!(grade.score, 100);
    }

    #[test]
    fn one_of_three_rounds_half_up() {
        let keys = vec![
            key(1, "A", &["B"]),
            key(2, "A", &["B"]),
            key(3, "A", &["B"]),
        ];
        // 100 / 3 = 33.33... -> 33; 2/3 = 66.66... -> 67.
        let grade = score(&keys, &picks(&["A", "B", "B"]), Utc::now()).unwrap();
        assert_eq!(grade.score, 33);
        let grade = score(&keys, &picks(&["A", "A", "B"]), Utc::now()).unwrap();
        assert_eq!(grade.score, 67);
    }

    #[test]
    fn exact_half_rounds_up() {
        let keys = vec![
            key(1, "A", &["B"]),
            key(2, "A", &["B"]),
            key(3, "A", &["B"]),
            key(4, "A", &["B"]),
            key(5, "A", &["B"]),
            key(6, "A", &["B"]),
            key(7, "A", &["B"]),
            key(8, "A", &["B"]),
        ];
        // 3/8 = 37.5 -> 38.
        let grade = score(&keys, &picks(&["A", "A", "A", "B", "B", "B", "B", "B"]), Utc::now())
            .unwrap();
        assert_eq!(grade.score, 38);
    }

    #[test]
    fn unanswered_questions_count_toward_neither_tally() {
        let submission = Submission::new(vec![
            Some("A".to_string()),
            None,
            None,
            Some("D".to_string()),
        ]);
        let grade = score(&four_keys(), &submission, Utc::now()).unwrap();
        assert_eq!(grade.right_answers, 2);
        assert_eq!(grade.wrong_answers, 0);
        assert!(grade.right_answers + grade.wrong_answers <= 4);
        // Denominator stays the full question count.
        assert_eq!(grade.score, 50);
    }

    #[test]
    fn unknown_choice_text_counts_as_wrong() {
        let keys = vec![key(1, "A", &["B", "C", "D"])];
        let grade = score(&keys, &picks(&["definitely not a choice"]), Utc::now()).unwrap();
        assert_eq!(grade.right_answers, 0);
        assert_eq!(grade.wrong_answers, 1);
        assert_eq!(grade.score, 0);
    }

    #[test]
    fn empty_quiz_is_an_error_not_a_nan() {
        let err = score(&[], &Submission::default(), Utc::now()).unwrap_err();
        assert_eq!(err, ScoreError::EmptyQuiz);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = score(&four_keys(), &picks(&["A", "B"]), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            ScoreError::ShapeMismatch {
                questions: 4,
                selections: 2,
            }
        );
    }

    #[test]
    fn identical_inputs_grade_identically() {
        let keys = four_keys();
        let submission = picks(&["A", "B", "D", "D"]);
        let at = Utc::now();
        let first = score(&keys, &submission, at).unwrap();
        let second = score(&keys, &submission, at).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn score_matches_rounded_ratio_for_every_tally() {
        let keys: Vec<QuestionKey> = (0..7).map(|i| key(i, "A", &["B"])).collect();
        for right in 0..=7u32 {
            let texts: Vec<Option<String>> = (0..7)
                .map(|i| {
                    Some(if (i as u32) < right { "A" } else { "B" }.to_string())
                })
                .collect();
            let grade = score(&keys, &Submission::new(texts), Utc::now()).unwrap();
            assert_eq!(grade.right_answers, right);
            let expected = (100.0 * f64::from(right) / 7.0).round() as u32;
            assert_eq!(grade.score, expected);
        }
    }
}
