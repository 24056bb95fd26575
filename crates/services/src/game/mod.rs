mod progress;
mod session;
mod workflow;

// Public API of the game loop.
pub use crate::error::GameError;
pub use progress::{GameStats, SaveStatus};
pub use session::{FEEDBACK_CAPTURE_FAILED, GamePhase, GameSession};
pub use workflow::{CheckOutcome, GameLoopService};
