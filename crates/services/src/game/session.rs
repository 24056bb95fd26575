use signplay_core::evaluate::{Evaluation, evaluate};
use signplay_core::model::{Digit, GameResultId, NewGameResult, Question};

use super::progress::{GameStats, SaveStatus};
use crate::error::GameError;

pub const FEEDBACK_CAPTURE_FAILED: &str = "Error detecting gesture. Try again.";

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Where the current question is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Digits are still being signed (or the answer is full but unchecked).
    Capturing,
    /// The answer has been evaluated; only `next_question` moves on.
    Checked,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Client-held state for one player working through questions.
///
/// All mutation goes through `GameLoopService`, which takes the session by
/// `&mut`, so a capture and a check can never interleave.
#[derive(Debug, Clone)]
pub struct GameSession {
    question: Question,
    accumulated: String,
    feedback: Option<String>,
    phase: GamePhase,
    stats: GameStats,
    last_evaluation: Option<Evaluation>,
    submission: Option<NewGameResult>,
    last_save: Option<SaveStatus>,
}

impl GameSession {
    #[must_use]
    pub fn new(question: Question) -> Self {
        Self {
            question,
            accumulated: String::new(),
            feedback: None,
            phase: GamePhase::Capturing,
            stats: GameStats::default(),
            last_evaluation: None,
            submission: None,
            last_save: None,
        }
    }

    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    /// Digits signed so far, in order.
    #[must_use]
    pub fn accumulated_answer(&self) -> &str {
        &self.accumulated
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub fn stats(&self) -> GameStats {
        self.stats
    }

    #[must_use]
    pub fn last_evaluation(&self) -> Option<&Evaluation> {
        self.last_evaluation.as_ref()
    }

    #[must_use]
    pub fn last_save(&self) -> Option<&SaveStatus> {
        self.last_save.as_ref()
    }

    #[must_use]
    pub fn remaining_digits(&self) -> usize {
        self.question
            .target_len()
            .saturating_sub(self.accumulated.len())
    }

    #[must_use]
    pub fn can_capture(&self) -> bool {
        self.phase == GamePhase::Capturing && self.remaining_digits() > 0
    }

    #[must_use]
    pub fn can_check(&self) -> bool {
        self.phase == GamePhase::Capturing && self.remaining_digits() == 0
    }

    pub(crate) fn ensure_can_capture(&self) -> Result<(), GameError> {
        match self.phase {
            GamePhase::Checked => Err(GameError::AlreadyChecked),
            GamePhase::Capturing if self.remaining_digits() == 0 => Err(GameError::CaptureClosed),
            GamePhase::Capturing => Ok(()),
        }
    }

    pub(crate) fn push_digit(&mut self, digit: Digit) -> Result<(), GameError> {
        self.ensure_can_capture()?;
        self.accumulated.push(digit.as_char());
        self.feedback = Some(format!("Detected digit: {digit}"));
        Ok(())
    }

    pub(crate) fn capture_failed(&mut self) {
        self.feedback = Some(FEEDBACK_CAPTURE_FAILED.to_owned());
    }

    /// Evaluate the full answer and apply the tentative counters.
    pub(crate) fn check(
        &mut self,
        dexterity_score: u32,
    ) -> Result<(Evaluation, NewGameResult), GameError> {
        match self.phase {
            GamePhase::Checked => return Err(GameError::AlreadyChecked),
            GamePhase::Capturing if self.remaining_digits() > 0 => {
                return Err(GameError::AnswerIncomplete);
            }
            GamePhase::Capturing => {}
        }

        let evaluation = evaluate(&self.question, &self.accumulated);
        let submission = evaluation.to_submission(&self.question, dexterity_score)?;

        if evaluation.is_correct {
            self.stats.correct += 1;
        } else {
            self.stats.incorrect += 1;
        }
        self.stats.score += evaluation.score_delta;
        self.feedback = Some(evaluation.feedback(&self.accumulated));
        self.phase = GamePhase::Checked;
        self.last_evaluation = Some(evaluation.clone());
        self.submission = Some(submission.clone());
        self.last_save = Some(SaveStatus::Pending);

        Ok((evaluation, submission))
    }

    /// The submission whose save failed, if any.
    pub(crate) fn failed_submission(&self) -> Option<&NewGameResult> {
        match self.last_save {
            Some(SaveStatus::Failed(_)) => self.submission.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn mark_saved(&mut self, id: GameResultId) {
        if self.last_save.as_ref().is_some_and(SaveStatus::is_failed) {
            self.stats.failed = self.stats.failed.saturating_sub(1);
        }
        self.stats.saved += 1;
        self.last_save = Some(SaveStatus::Saved(id));
    }

    pub(crate) fn mark_failed(&mut self, reason: String) {
        if !self.last_save.as_ref().is_some_and(SaveStatus::is_failed) {
            self.stats.failed += 1;
        }
        self.last_save = Some(SaveStatus::Failed(reason));
    }

    /// Move to `question`, keeping the running tallies.
    pub(crate) fn reset(&mut self, question: Question) {
        self.question = question;
        self.accumulated.clear();
        self.feedback = None;
        self.phase = GamePhase::Capturing;
        self.last_evaluation = None;
        self.submission = None;
        self.last_save = None;
    }
}
