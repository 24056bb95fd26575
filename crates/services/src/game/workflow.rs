use std::sync::Arc;

use signplay_core::evaluate::{Evaluation, PLACEHOLDER_DEXTERITY};
use signplay_core::generator;
use signplay_core::model::{Digit, GameResultId, Question};
use tracing::{debug, warn};

use super::progress::SaveStatus;
use super::session::GameSession;
use crate::classifier::{FrameSource, GestureClassifier};
use crate::error::{CaptureError, GameError};
use crate::recorder::ResultRecorder;

/// Result of checking a full answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub evaluation: Evaluation,
    pub save: SaveStatus,
}

/// Drives a `GameSession`: capture digits, check, persist, move on.
#[derive(Clone)]
pub struct GameLoopService {
    frames: Arc<dyn FrameSource>,
    classifier: Arc<dyn GestureClassifier>,
    recorder: Arc<dyn ResultRecorder>,
    dexterity_score: u32,
}

impl GameLoopService {
    #[must_use]
    pub fn new(
        frames: Arc<dyn FrameSource>,
        classifier: Arc<dyn GestureClassifier>,
        recorder: Arc<dyn ResultRecorder>,
    ) -> Self {
        Self {
            frames,
            classifier,
            recorder,
            dexterity_score: PLACEHOLDER_DEXTERITY,
        }
    }

    /// Report `score` as the dexterity of every following submission.
    #[must_use]
    pub fn with_dexterity(mut self, score: u32) -> Self {
        self.dexterity_score = score;
        self
    }

    #[must_use]
    pub fn dexterity_score(&self) -> u32 {
        self.dexterity_score
    }

    /// Start a session on a freshly generated question.
    #[must_use]
    pub fn start(&self) -> GameSession {
        GameSession::new(generator::generate())
    }

    /// Start a session on a given question.
    #[must_use]
    pub fn start_with(&self, question: Question) -> GameSession {
        GameSession::new(question)
    }

    /// Grab one frame, classify it and append the digit.
    ///
    /// On failure the answer is left as it was and the feedback asks the player
    /// to try again.
    ///
    /// # Errors
    ///
    /// Returns `GameError::CaptureClosed` once every digit is in,
    /// `GameError::AlreadyChecked` after checking, or `GameError::Capture` when
    /// the frame source or classifier fails.
    pub async fn capture(&self, session: &mut GameSession) -> Result<Digit, GameError> {
        session.ensure_can_capture()?;

        match self.grab_and_classify().await {
            Ok(digit) => {
                session.push_digit(digit)?;
                debug!(
                    digit = digit.value(),
                    remaining = session.remaining_digits(),
                    "digit captured"
                );
                Ok(digit)
            }
            Err(err) => {
                warn!(error = %err, "gesture capture failed");
                session.capture_failed();
                Err(err.into())
            }
        }
    }

    async fn grab_and_classify(&self) -> Result<Digit, CaptureError> {
        let frame = self.frames.next_frame().await?;
        Ok(self.classifier.classify(&frame).await?)
    }

    /// Evaluate the full answer and hand it to the recorder.
    ///
    /// The session counters move even if the save fails; the outcome's
    /// `save` field says how persistence went and `retry_save` can finish it.
    ///
    /// # Errors
    ///
    /// Returns `GameError::AnswerIncomplete` before every digit is in, or
    /// `GameError::AlreadyChecked` on a second check.
    pub async fn check_answer(&self, session: &mut GameSession) -> Result<CheckOutcome, GameError> {
        let (evaluation, submission) = session.check(self.dexterity_score)?;

        match self.recorder.record(&submission).await {
            Ok(id) => session.mark_saved(id),
            Err(err) => {
                warn!(error = %err, question = submission.question(), "saving result failed");
                session.mark_failed(err.to_string());
            }
        }

        let save = session.last_save().cloned().unwrap_or(SaveStatus::Pending);
        Ok(CheckOutcome { evaluation, save })
    }

    /// Re-submit the last result after a failed save.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NothingToRetry` unless the last save failed, or
    /// `GameError::Record` if it fails again.
    pub async fn retry_save(&self, session: &mut GameSession) -> Result<GameResultId, GameError> {
        let submission = session
            .failed_submission()
            .cloned()
            .ok_or(GameError::NothingToRetry)?;

        match self.recorder.record(&submission).await {
            Ok(id) => {
                session.mark_saved(id);
                Ok(id)
            }
            Err(err) => {
                warn!(error = %err, "retrying result save failed");
                session.mark_failed(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Move to a new question. Tallies carry over.
    pub fn next_question(&self, session: &mut GameSession) {
        self.next_question_with(session, generator::generate());
    }

    /// Move to `question`. Tallies carry over.
    pub fn next_question_with(&self, session: &mut GameSession, question: Question) {
        if session.last_save().is_some_and(SaveStatus::is_failed) {
            warn!("moving on with an unsaved result");
        }
        session.reset(question);
    }
}
