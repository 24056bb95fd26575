mod service;
mod view;

pub use crate::error::StatsError;
pub use service::{RECENT_GAMES, SavedResult, StatisticsService, StatsOverview};
pub use view::{
    GameRecordView, SaveResultPayload, SaveResultResponse, StatsResponse, UserView,
};
