#![forbid(unsafe_code)]

pub mod app_services;
pub mod classifier;
pub mod error;
pub mod game;
pub mod recorder;
pub mod stats;
pub mod users;

pub use signplay_core::Clock;

pub use app_services::AppServices;
pub use classifier::{ClassifierConfig, Frame, FrameSource, GestureClassifier, HttpClassifier};
pub use error::{
    AppServicesError, CaptureError, ClassifierError, GameError, RecordError, StatsError,
};
pub use game::{CheckOutcome, GameLoopService, GamePhase, GameSession, GameStats, SaveStatus};
pub use recorder::{LocalRecorder, RemoteResultRecorder, ResultRecorder};
pub use stats::{SavedResult, StatisticsService, StatsOverview};
pub use users::{Identity, Registration, UserService};
