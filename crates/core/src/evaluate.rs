//! Scoring of a completed answer.
//!
//! Pure functions only; persistence and session counters live in the services
//! crate.

use crate::model::{Accuracy, GameResultError, NewGameResult, Question};

/// Points awarded for a correct answer.
pub const POINTS_PER_CORRECT: u32 = 10;

/// Dexterity reported for a submission when nothing measures it.
///
/// Higher means faster, more precise gesturing. Replace with a measured value
/// through `GameLoopService::with_dexterity` when one exists.
pub const PLACEHOLDER_DEXTERITY: u32 = 85;

/// Outcome of checking an accumulated answer against a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// `None` when the accumulated text is not an integer.
    pub predicted_answer: Option<i64>,
    pub correct_answer: i64,
    pub is_correct: bool,
    pub accuracy: Accuracy,
    pub score_delta: u32,
}

impl Evaluation {
    /// Message shown to the player after checking.
    #[must_use]
    pub fn feedback(&self, accumulated: &str) -> String {
        if self.is_correct {
            format!("Correct! The answer is {}", self.correct_answer)
        } else {
            format!(
                "Incorrect. Your answer: {accumulated}, Correct: {}",
                self.correct_answer
            )
        }
    }

    /// Build the record that gets persisted for this answer.
    ///
    /// # Errors
    ///
    /// Returns `GameResultError::EmptyQuestion` only if the question renders to
    /// blank text, which `Question` never does.
    pub fn to_submission(
        &self,
        question: &Question,
        dexterity_score: u32,
    ) -> Result<NewGameResult, GameResultError> {
        NewGameResult::new(
            question.text(),
            self.correct_answer,
            self.predicted_answer,
            self.accuracy,
            dexterity_score,
        )
    }
}

/// Compare the digits signed so far with the question's answer.
///
/// Malformed input (empty, non-numeric) counts as an incorrect answer.
#[must_use]
pub fn evaluate(question: &Question, accumulated: &str) -> Evaluation {
    let predicted_answer = accumulated.trim().parse::<i64>().ok();
    let correct_answer = question.correct_answer();
    let is_correct = predicted_answer == Some(correct_answer);

    Evaluation {
        predicted_answer,
        correct_answer,
        is_correct,
        accuracy: if is_correct {
            Accuracy::PERFECT
        } else {
            Accuracy::ZERO
        },
        score_delta: if is_correct { POINTS_PER_CORRECT } else { 0 },
    }
}
