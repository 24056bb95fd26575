use thiserror::Error;

use crate::model::ids::UserId;
use crate::model::result::GameResult;

const MAX_NAME_CHARS: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("user name cannot be empty")]
    EmptyName,

    #[error("user name is longer than {MAX_NAME_CHARS} characters")]
    NameTooLong,

    #[error("accuracy sum {sum} cannot come from {games} games")]
    InconsistentTotals { sum: u64, games: u32 },
}

/// Lifetime statistics for one player.
///
/// Kept as running totals (`games`, accuracy sum, best dexterity) so a save
/// never has to rescan history. `rebuild` recomputes the same numbers from a
/// full history and must always agree with repeated `record_result` calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAggregate {
    user_id: UserId,
    name: String,
    total_games_played: u32,
    accuracy_sum: u64,
    dexterity_score: u32,
}

impl UserAggregate {
    /// A freshly registered player with no games.
    ///
    /// # Errors
    ///
    /// Returns `UserError::EmptyName` or `UserError::NameTooLong`.
    pub fn new(user_id: UserId, name: impl Into<String>) -> Result<Self, UserError> {
        Ok(Self {
            user_id,
            name: validate_name(name.into())?,
            total_games_played: 0,
            accuracy_sum: 0,
            dexterity_score: 0,
        })
    }

    /// Rehydrate from storage.
    ///
    /// # Errors
    ///
    /// Returns `UserError::InconsistentTotals` if the accuracy sum exceeds what
    /// `total_games_played` results could add up to.
    pub fn from_persisted(
        user_id: UserId,
        name: impl Into<String>,
        total_games_played: u32,
        accuracy_sum: u64,
        dexterity_score: u32,
    ) -> Result<Self, UserError> {
        if accuracy_sum > u64::from(total_games_played) * 100 {
            return Err(UserError::InconsistentTotals {
                sum: accuracy_sum,
                games: total_games_played,
            });
        }
        Ok(Self {
            user_id,
            name: validate_name(name.into())?,
            total_games_played,
            accuracy_sum,
            dexterity_score,
        })
    }

    /// Recompute the aggregate from a player's complete history.
    #[must_use]
    pub fn rebuild(user_id: UserId, name: &str, history: &[GameResult]) -> Self {
        let mut aggregate = Self {
            user_id,
            name: name.to_owned(),
            total_games_played: 0,
            accuracy_sum: 0,
            dexterity_score: 0,
        };
        for result in history {
            aggregate.record_result(result);
        }
        aggregate
    }

    /// Fold one newly saved result into the totals.
    pub fn record_result(&mut self, result: &GameResult) {
        self.total_games_played = self.total_games_played.saturating_add(1);
        self.accuracy_sum += u64::from(result.accuracy().value());
        self.dexterity_score = self.dexterity_score.max(result.dexterity_score());
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn total_games_played(&self) -> u32 {
        self.total_games_played
    }

    #[must_use]
    pub fn accuracy_sum(&self) -> u64 {
        self.accuracy_sum
    }

    /// Mean accuracy rounded to the nearest integer, halves up. `0` with no games.
    #[must_use]
    pub fn average_accuracy(&self) -> u8 {
        if self.total_games_played == 0 {
            return 0;
        }
        let games = u64::from(self.total_games_played);
        let rounded = (2 * self.accuracy_sum + games) / (2 * games);
        // from_persisted guarantees sum <= 100 * games
        u8::try_from(rounded).unwrap_or(100)
    }

    /// Best dexterity score ever recorded, `0` with no games.
    #[must_use]
    pub fn dexterity_score(&self) -> u32 {
        self.dexterity_score
    }
}

fn validate_name(name: String) -> Result<String, UserError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(UserError::EmptyName);
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(UserError::NameTooLong);
    }
    Ok(trimmed.to_owned())
}
