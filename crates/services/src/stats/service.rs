use std::sync::Arc;

use signplay_core::model::{GameResult, NewGameResult, UserAggregate, UserId};
use storage::repository::{GameResultRepository, ResultPersistence, Storage, UserRepository};
use tracing::{info, instrument};

use crate::Clock;
use crate::error::StatsError;
use crate::users::Identity;

/// How many results the dashboard overview carries.
pub const RECENT_GAMES: u32 = 5;

/// A stored result and the owner's aggregate right after it was folded in.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedResult {
    pub result: GameResult,
    pub aggregate: UserAggregate,
}

/// Dashboard data: the aggregate plus the newest results.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsOverview {
    pub user: UserAggregate,
    pub recent: Vec<GameResult>,
}

/// Persists results and serves the per-user statistics read paths.
#[derive(Clone)]
pub struct StatisticsService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    results: Arc<dyn GameResultRepository>,
    persistence: Arc<dyn ResultPersistence>,
}

impl StatisticsService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        results: Arc<dyn GameResultRepository>,
        persistence: Arc<dyn ResultPersistence>,
    ) -> Self {
        Self {
            clock,
            users,
            results,
            persistence,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.results),
            Arc::clone(&storage.persistence),
        )
    }

    /// Store one answered question and fold it into the owner's aggregate.
    ///
    /// Both writes happen in one unit of work; an unknown user leaves storage
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::UnknownUser` if the identity no longer exists, or
    /// `StatsError::Storage` for persistence failures.
    #[instrument(skip_all, fields(user_id = %identity.user_id))]
    pub async fn save_result(
        &self,
        identity: &Identity,
        submission: &NewGameResult,
    ) -> Result<SavedResult, StatsError> {
        let played_at = self.clock.now();
        let recorded = self
            .persistence
            .record_result(identity.user_id, submission, played_at)
            .await?;

        info!(
            result_id = %recorded.result.id(),
            is_correct = recorded.result.is_correct(),
            total_games = recorded.aggregate.total_games_played(),
            "game result saved"
        );
        Ok(SavedResult {
            result: recorded.result,
            aggregate: recorded.aggregate,
        })
    }

    /// Aggregate plus the `RECENT_GAMES` newest results.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::UnknownUser` if the user does not exist.
    pub async fn overview(&self, user_id: UserId) -> Result<StatsOverview, StatsError> {
        let user = self.users.get_user(user_id).await?;
        let recent = self
            .results
            .list_results(user_id, Some(RECENT_GAMES))
            .await?;
        Ok(StatsOverview { user, recent })
    }

    /// Every result of the user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if the query fails.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<GameResult>, StatsError> {
        Ok(self.results.list_results(user_id, None).await?)
    }

    /// Recompute a stored aggregate from the full result history and persist it.
    ///
    /// The recount and the overwrite are one storage unit of work, so a save
    /// racing the rebuild is never lost.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::UnknownUser` if the user does not exist.
    pub async fn rebuild_aggregate(&self, user_id: UserId) -> Result<UserAggregate, StatsError> {
        let before = self.users.get_user(user_id).await?;
        let rebuilt = self.persistence.rebuild_aggregate(user_id).await?;
        if rebuilt != before {
            info!(
                %user_id,
                total_games = rebuilt.total_games_played(),
                "aggregate repaired from history"
            );
        }
        Ok(rebuilt)
    }
}
