use signplay_core::model::GameResultId;

/// Running tallies for one play session.
///
/// `correct`, `incorrect` and `score` move at check time whether or not the
/// save lands; `saved` and `failed` reconcile them with storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameStats {
    pub correct: u32,
    pub incorrect: u32,
    pub score: u32,
    pub saved: u32,
    pub failed: u32,
}

impl GameStats {
    #[must_use]
    pub fn answered(&self) -> u32 {
        self.correct + self.incorrect
    }
}

/// Where the last checked answer stands with the result store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Pending,
    Saved(GameResultId),
    Failed(String),
}

impl SaveStatus {
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, SaveStatus::Failed(_))
    }
}
