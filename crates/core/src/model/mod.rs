mod digit;
mod ids;
mod question;
mod result;
mod user;

pub use digit::{Digit, DigitError};
pub use ids::{GameResultId, UserId};
pub use question::{MAX_OPERAND, Operator, Question, QuestionError};
pub use result::{Accuracy, GameResult, GameResultError, NewGameResult};
pub use user::{UserAggregate, UserError};
