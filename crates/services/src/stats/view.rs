//! JSON shapes shared by the HTTP surface and the remote recorder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signplay_core::model::{Accuracy, GameResult, GameResultError, NewGameResult, UserAggregate};

use super::service::{SavedResult, StatsOverview};

/// Body of `POST /api/game/save-result`.
///
/// Any `isCorrect` the client sends is ignored; correctness is recomputed
/// from the two answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResultPayload {
    pub question: String,
    pub correct_answer: i64,
    #[serde(default)]
    pub predicted_answer: Option<i64>,
    pub accuracy: i64,
    #[serde(default)]
    pub speed: Option<u32>,
    #[serde(default)]
    pub dexterity_score: Option<u32>,
}

impl SaveResultPayload {
    #[must_use]
    pub fn from_submission(submission: &NewGameResult) -> Self {
        Self {
            question: submission.question().to_owned(),
            correct_answer: submission.correct_answer(),
            predicted_answer: submission.predicted_answer(),
            accuracy: i64::from(submission.accuracy().value()),
            speed: Some(submission.speed()),
            dexterity_score: Some(submission.dexterity_score()),
        }
    }

    /// Validate into a domain submission. Missing speed and dexterity count as 0.
    ///
    /// # Errors
    ///
    /// Returns `GameResultError` for out-of-range accuracy or blank question text.
    pub fn into_submission(self) -> Result<NewGameResult, GameResultError> {
        let accuracy = Accuracy::new(self.accuracy)?;
        Ok(NewGameResult::new(
            self.question,
            self.correct_answer,
            self.predicted_answer,
            accuracy,
            self.dexterity_score.unwrap_or(0),
        )?
        .with_speed(self.speed.unwrap_or(0)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecordView {
    pub id: u64,
    pub user_id: u64,
    pub question: String,
    pub correct_answer: i64,
    pub predicted_answer: Option<i64>,
    pub accuracy: u8,
    pub speed: u32,
    pub dexterity_score: u32,
    pub is_correct: bool,
    pub played_at: DateTime<Utc>,
}

impl From<&GameResult> for GameRecordView {
    fn from(result: &GameResult) -> Self {
        Self {
            id: result.id().value(),
            user_id: result.user_id().value(),
            question: result.question().to_owned(),
            correct_answer: result.correct_answer(),
            predicted_answer: result.predicted_answer(),
            accuracy: result.accuracy().value(),
            speed: result.speed(),
            dexterity_score: result.dexterity_score(),
            is_correct: result.is_correct(),
            played_at: result.played_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: u64,
    pub name: String,
    pub total_games_played: u32,
    pub average_accuracy: u8,
    pub dexterity_score: u32,
}

impl From<&UserAggregate> for UserView {
    fn from(user: &UserAggregate) -> Self {
        Self {
            id: user.user_id().value(),
            name: user.name().to_owned(),
            total_games_played: user.total_games_played(),
            average_accuracy: user.average_accuracy(),
            dexterity_score: user.dexterity_score(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResultResponse {
    pub success: bool,
    pub game_record: GameRecordView,
}

impl From<&SavedResult> for SaveResultResponse {
    fn from(saved: &SavedResult) -> Self {
        Self {
            success: true,
            game_record: GameRecordView::from(&saved.result),
        }
    }
}

/// Body of `GET /api/game/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub user: UserView,
    pub recent_games: Vec<GameRecordView>,
}

impl From<&StatsOverview> for StatsResponse {
    fn from(overview: &StatsOverview) -> Self {
        Self {
            user: UserView::from(&overview.user),
            recent_games: overview.recent.iter().map(GameRecordView::from).collect(),
        }
    }
}
