mod ids;
mod item;
mod mode;
mod session;

pub use ids::{ItemId, ParseIdError, SessionId, SetIdentity};
pub use item::{Item, ItemError, ItemSet, SetError, is_blank};
pub use mode::{ParseModeError, QuizMode};
pub use session::{Grade, OrderRecord, ProgressError, QuizSession, SessionSnapshot};
