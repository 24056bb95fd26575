use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{GameResultId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GameResultError {
    #[error("accuracy must be between 0 and 100, got {0}")]
    InvalidAccuracy(i64),

    #[error("question text cannot be empty")]
    EmptyQuestion,

    #[error("stored is_correct flag disagrees with the recorded answers")]
    CorrectnessMismatch,
}

//
// ─── ACCURACY ──────────────────────────────────────────────────────────────────
//

/// Percentage score for one answered question.
///
/// The evaluator only produces `ZERO` or `PERFECT`; intermediate values are
/// accepted so stored history stays readable if partial credit is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Accuracy(u8);

impl Accuracy {
    pub const ZERO: Accuracy = Accuracy(0);
    pub const PERFECT: Accuracy = Accuracy(100);

    /// # Errors
    ///
    /// Returns `GameResultError::InvalidAccuracy` outside `0..=100`.
    pub fn new(value: i64) -> Result<Self, GameResultError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Self)
            .ok_or(GameResultError::InvalidAccuracy(value))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

//
// ─── SUBMISSION ────────────────────────────────────────────────────────────────
//

/// A result as submitted by the client, before it has an id or owner.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGameResult {
    question: String,
    correct_answer: i64,
    predicted_answer: Option<i64>,
    accuracy: Accuracy,
    speed: u32,
    dexterity_score: u32,
}

impl NewGameResult {
    /// # Errors
    ///
    /// Returns `GameResultError::EmptyQuestion` if the question text is blank.
    pub fn new(
        question: impl Into<String>,
        correct_answer: i64,
        predicted_answer: Option<i64>,
        accuracy: Accuracy,
        dexterity_score: u32,
    ) -> Result<Self, GameResultError> {
        let question = question.into().trim().to_owned();
        if question.is_empty() {
            return Err(GameResultError::EmptyQuestion);
        }
        Ok(Self {
            question,
            correct_answer,
            predicted_answer,
            accuracy,
            speed: 0,
            dexterity_score,
        })
    }

    /// Client-reported answering speed; `0` means it was not measured.
    #[must_use]
    pub fn with_speed(mut self, speed: u32) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn correct_answer(&self) -> i64 {
        self.correct_answer
    }

    #[must_use]
    pub fn predicted_answer(&self) -> Option<i64> {
        self.predicted_answer
    }

    #[must_use]
    pub fn accuracy(&self) -> Accuracy {
        self.accuracy
    }

    #[must_use]
    pub fn speed(&self) -> u32 {
        self.speed
    }

    #[must_use]
    pub fn dexterity_score(&self) -> u32 {
        self.dexterity_score
    }

    /// Derived, never taken from the client.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.predicted_answer == Some(self.correct_answer)
    }
}

//
// ─── STORED RESULT ─────────────────────────────────────────────────────────────
//

/// An answered question owned by a user. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct GameResult {
    id: GameResultId,
    user_id: UserId,
    played_at: DateTime<Utc>,
    submission: NewGameResult,
}

impl GameResult {
    #[must_use]
    pub fn new(
        id: GameResultId,
        user_id: UserId,
        submission: NewGameResult,
        played_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            played_at,
            submission,
        }
    }

    /// Rehydrate a result from storage.
    ///
    /// # Errors
    ///
    /// Returns `GameResultError::CorrectnessMismatch` if the stored flag does not
    /// match the stored answers.
    pub fn from_persisted(
        id: GameResultId,
        user_id: UserId,
        submission: NewGameResult,
        is_correct: bool,
        played_at: DateTime<Utc>,
    ) -> Result<Self, GameResultError> {
        if submission.is_correct() != is_correct {
            return Err(GameResultError::CorrectnessMismatch);
        }
        Ok(Self::new(id, user_id, submission, played_at))
    }

    #[must_use]
    pub fn id(&self) -> GameResultId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn played_at(&self) -> DateTime<Utc> {
        self.played_at
    }

    #[must_use]
    pub fn question(&self) -> &str {
        self.submission.question()
    }

    #[must_use]
    pub fn correct_answer(&self) -> i64 {
        self.submission.correct_answer()
    }

    #[must_use]
    pub fn predicted_answer(&self) -> Option<i64> {
        self.submission.predicted_answer()
    }

    #[must_use]
    pub fn accuracy(&self) -> Accuracy {
        self.submission.accuracy()
    }

    #[must_use]
    pub fn speed(&self) -> u32 {
        self.submission.speed()
    }

    #[must_use]
    pub fn dexterity_score(&self) -> u32 {
        self.submission.dexterity_score()
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.submission.is_correct()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
