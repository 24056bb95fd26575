//! Where checked answers go: straight into local storage, or to a remote
//! game server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use signplay_core::model::{GameResultId, NewGameResult};

use crate::error::RecordError;
use crate::stats::{SaveResultPayload, SaveResultResponse, StatisticsService};
use crate::users::Identity;

#[async_trait]
pub trait ResultRecorder: Send + Sync {
    /// Persist one submission, returning its stored id.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` when the result could not be stored.
    async fn record(&self, submission: &NewGameResult) -> Result<GameResultId, RecordError>;
}

/// Records through an in-process `StatisticsService` on behalf of one player.
#[derive(Clone)]
pub struct LocalRecorder {
    stats: StatisticsService,
    identity: Identity,
}

impl LocalRecorder {
    #[must_use]
    pub fn new(stats: StatisticsService, identity: Identity) -> Self {
        Self { stats, identity }
    }
}

#[async_trait]
impl ResultRecorder for LocalRecorder {
    async fn record(&self, submission: &NewGameResult) -> Result<GameResultId, RecordError> {
        let saved = self.stats.save_result(&self.identity, submission).await?;
        Ok(saved.result.id())
    }
}

/// Posts results to `{base}/api/game/save-result` with a bearer token.
#[derive(Clone)]
pub struct RemoteResultRecorder {
    client: Client,
    base_url: String,
    token: String,
}

impl RemoteResultRecorder {
    /// # Errors
    ///
    /// Returns `RecordError::Http` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RecordError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl ResultRecorder for RemoteResultRecorder {
    async fn record(&self, submission: &NewGameResult) -> Result<GameResultId, RecordError> {
        let url = format!(
            "{}/api/game/save-result",
            self.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&SaveResultPayload::from_submission(submission))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_default();
            return Err(RecordError::Rejected { status, message });
        }

        let body: SaveResultResponse = response.json().await?;
        Ok(GameResultId::new(body.game_record.id))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}
