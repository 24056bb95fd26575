use async_trait::async_trait;
use chrono::{DateTime, Utc};
use signplay_core::model::{GameResult, GameResultId, NewGameResult, UserAggregate, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for a new account.
///
/// Only a digest of the access token is stored; the token itself is handed to
/// the player once and never written anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserRecord {
    pub name: String,
    pub token_digest: String,
}

/// A stored result together with the owner's aggregate after the save.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedResult {
    pub result: GameResult,
    pub aggregate: UserAggregate,
}

/// Repository contract for player accounts and their aggregates.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a player with zeroed statistics.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the token digest is already taken.
    async fn insert_user(&self, user: NewUserRecord) -> Result<UserAggregate, StorageError>;

    /// Fetch a player's aggregate.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_user(&self, id: UserId) -> Result<UserAggregate, StorageError>;

    /// Resolve an access token digest to its owner.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no account uses the digest.
    async fn find_by_token_digest(&self, digest: &str) -> Result<UserAggregate, StorageError>;
}

/// Read side of the result history.
#[async_trait]
pub trait GameResultRepository: Send + Sync {
    /// List a player's results, newest first, optionally capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query fails or a row cannot be decoded.
    async fn list_results(
        &self,
        user_id: UserId,
        limit: Option<u32>,
    ) -> Result<Vec<GameResult>, StorageError>;
}

/// Writes that touch a result history and its aggregate together.
#[async_trait]
pub trait ResultPersistence: Send + Sync {
    /// Insert `submission` for `user_id` and update that user's aggregate in
    /// the same unit of work. Nothing is written if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown user, or other storage errors.
    async fn record_result(
        &self,
        user_id: UserId,
        submission: &NewGameResult,
        played_at: DateTime<Utc>,
    ) -> Result<RecordedResult, StorageError>;

    /// Recompute a user's totals from every stored result and overwrite the
    /// aggregate, as one unit of work. A result recorded concurrently is either
    /// counted by the rebuild or folded in after it, never dropped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown user, or other storage errors.
    async fn rebuild_aggregate(&self, user_id: UserId) -> Result<UserAggregate, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryState {
    users: HashMap<UserId, UserAggregate>,
    token_digests: HashMap<String, UserId>,
    results: Vec<GameResult>,
    next_user_id: u64,
    next_result_id: u64,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// A single mutex guards users and results together, so a result insert and
/// its aggregate update are never observed apart.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_user(&self, user: NewUserRecord) -> Result<UserAggregate, StorageError> {
        let mut guard = self.lock()?;
        if guard.token_digests.contains_key(&user.token_digest) {
            return Err(StorageError::Conflict);
        }
        guard.next_user_id += 1;
        let id = UserId::new(guard.next_user_id);
        let aggregate = UserAggregate::new(id, user.name)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.token_digests.insert(user.token_digest, id);
        guard.users.insert(id, aggregate.clone());
        Ok(aggregate)
    }

    async fn get_user(&self, id: UserId) -> Result<UserAggregate, StorageError> {
        let guard = self.lock()?;
        guard.users.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn find_by_token_digest(&self, digest: &str) -> Result<UserAggregate, StorageError> {
        let guard = self.lock()?;
        guard
            .token_digests
            .get(digest)
            .and_then(|id| guard.users.get(id))
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl GameResultRepository for InMemoryRepository {
    async fn list_results(
        &self,
        user_id: UserId,
        limit: Option<u32>,
    ) -> Result<Vec<GameResult>, StorageError> {
        let guard = self.lock()?;
        let mut found: Vec<GameResult> = guard
            .results
            .iter()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.played_at()
                .cmp(&a.played_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        if let Some(limit) = limit {
            found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(found)
    }
}

#[async_trait]
impl ResultPersistence for InMemoryRepository {
    async fn record_result(
        &self,
        user_id: UserId,
        submission: &NewGameResult,
        played_at: DateTime<Utc>,
    ) -> Result<RecordedResult, StorageError> {
        let mut guard = self.lock()?;
        if !guard.users.contains_key(&user_id) {
            return Err(StorageError::NotFound);
        }

        guard.next_result_id += 1;
        let result = GameResult::new(
            GameResultId::new(guard.next_result_id),
            user_id,
            submission.clone(),
            played_at,
        );
        guard.results.push(result.clone());

        let aggregate = guard
            .users
            .get_mut(&user_id)
            .ok_or(StorageError::NotFound)?;
        aggregate.record_result(&result);
        let aggregate = aggregate.clone();

        Ok(RecordedResult { result, aggregate })
    }

    async fn rebuild_aggregate(&self, user_id: UserId) -> Result<UserAggregate, StorageError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let slot = state.users.get_mut(&user_id).ok_or(StorageError::NotFound)?;

        let history: Vec<GameResult> = state
            .results
            .iter()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect();
        *slot = UserAggregate::rebuild(user_id, slot.name(), &history);
        Ok(slot.clone())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub results: Arc<dyn GameResultRepository>,
    pub persistence: Arc<dyn ResultPersistence>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            users: Arc::new(repo.clone()),
            results: Arc::new(repo.clone()),
            persistence: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use signplay_core::model::Accuracy;
    use signplay_core::time::fixed_now;

    fn submission(correct: i64, predicted: i64, dexterity: u32) -> NewGameResult {
        let accuracy = if correct == predicted {
            Accuracy::PERFECT
        } else {
            Accuracy::ZERO
        };
        NewGameResult::new("4 + 4", correct, Some(predicted), accuracy, dexterity).unwrap()
    }

    async fn register(repo: &InMemoryRepository, name: &str) -> UserId {
        repo.insert_user(NewUserRecord {
            name: name.into(),
            token_digest: format!("digest-{name}"),
        })
        .await
        .unwrap()
        .user_id()
    }

    #[tokio::test]
    async fn record_result_updates_aggregate_in_step() {
        let repo = InMemoryRepository::new();
        let user = register(&repo, "ada").await;

        let first = repo
            .record_result(user, &submission(8, 8, 85), fixed_now())
            .await
            .unwrap();
        assert_eq!(first.aggregate.total_games_played(), 1);
        assert_eq!(first.aggregate.average_accuracy(), 100);

        let second = repo
            .record_result(user, &submission(8, 3, 90), fixed_now())
            .await
            .unwrap();
        assert_eq!(second.aggregate.total_games_played(), 2);
        assert_eq!(second.aggregate.average_accuracy(), 50);
        assert_eq!(second.aggregate.dexterity_score(), 90);
        assert_eq!(repo.get_user(user).await.unwrap(), second.aggregate);
    }

    #[tokio::test]
    async fn unknown_user_writes_nothing() {
        let repo = InMemoryRepository::new();
        let err = repo
            .record_result(UserId::new(99), &submission(1, 1, 85), fixed_now())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
        assert!(
            repo.list_results(UserId::new(99), None)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn lists_newest_first_per_user() {
        let repo = InMemoryRepository::new();
        let ada = register(&repo, "ada").await;
        let bob = register(&repo, "bob").await;

        for minute in 0..6 {
            let at = fixed_now() + Duration::minutes(minute);
            repo.record_result(ada, &submission(minute, minute, 85), at)
                .await
                .unwrap();
        }
        repo.record_result(bob, &submission(1, 2, 85), fixed_now())
            .await
            .unwrap();

        let recent = repo.list_results(ada, Some(5)).await.unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].correct_answer(), 5);
        assert_eq!(recent[4].correct_answer(), 1);
        assert!(recent.iter().all(|r| r.user_id() == ada));
        assert_eq!(repo.list_results(bob, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rebuild_repairs_drifted_totals_from_history() {
        let repo = InMemoryRepository::new();
        let user = register(&repo, "ada").await;
        for (predicted, dexterity) in [(8, 70), (3, 99), (8, 85)] {
            repo.record_result(user, &submission(8, predicted, dexterity), fixed_now())
                .await
                .unwrap();
        }
        {
            let mut guard = repo.lock().unwrap();
            let drifted = UserAggregate::from_persisted(user, "ada", 1, 0, 10).unwrap();
            guard.users.insert(user, drifted);
        }

        let rebuilt = repo.rebuild_aggregate(user).await.unwrap();
        assert_eq!(rebuilt.total_games_played(), 3);
        assert_eq!(rebuilt.average_accuracy(), 67);
        assert_eq!(rebuilt.dexterity_score(), 99);
        assert_eq!(repo.get_user(user).await.unwrap(), rebuilt);

        assert!(matches!(
            repo.rebuild_aggregate(UserId::new(99)).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn rebuilds_racing_saves_never_lose_a_game() {
        let repo = InMemoryRepository::new();
        let user = register(&repo, "ada").await;

        let mut tasks = Vec::new();
        for n in 0..40_u32 {
            let repo = repo.clone();
            tasks.push(tokio::spawn(async move {
                if n % 4 == 0 {
                    repo.rebuild_aggregate(user).await.map(|_| ())
                } else {
                    repo.record_result(user, &submission(8, 8, n), fixed_now())
                        .await
                        .map(|_| ())
                }
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let history = repo.list_results(user, None).await.unwrap();
        let stored = repo.get_user(user).await.unwrap();
        assert_eq!(history.len(), 30);
        assert_eq!(
            usize::try_from(stored.total_games_played()).unwrap(),
            history.len()
        );
        assert_eq!(stored.dexterity_score(), 39);
        assert_eq!(stored, UserAggregate::rebuild(user, "ada", &history));
    }

    #[tokio::test]
    async fn duplicate_token_digest_conflicts() {
        let repo = InMemoryRepository::new();
        register(&repo, "ada").await;
        let err = repo
            .insert_user(NewUserRecord {
                name: "impostor".into(),
                token_digest: "digest-ada".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }
}
