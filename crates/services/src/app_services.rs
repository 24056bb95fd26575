use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::classifier::{FrameSource, GestureClassifier};
use crate::error::AppServicesError;
use crate::game::GameLoopService;
use crate::recorder::LocalRecorder;
use crate::stats::StatisticsService;
use crate::users::{Identity, UserService};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    stats: Arc<StatisticsService>,
    users: Arc<UserService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock) -> Self {
        Self {
            stats: Arc::new(StatisticsService::from_storage(clock, storage)),
            users: Arc::new(UserService::new(Arc::clone(&storage.users))),
        }
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(&Storage::in_memory(), clock)
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if connecting or migrating fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, clock))
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatisticsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }

    /// A game loop that records straight into this backend as `identity`.
    #[must_use]
    pub fn local_game_loop(
        &self,
        frames: Arc<dyn FrameSource>,
        classifier: Arc<dyn GestureClassifier>,
        identity: Identity,
    ) -> GameLoopService {
        let recorder = LocalRecorder::new(self.stats.as_ref().clone(), identity);
        GameLoopService::new(frames, classifier, Arc::new(recorder))
    }
}
