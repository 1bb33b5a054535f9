#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod progress;
pub mod quiz;

pub use quiz_core::Clock;
pub use storage::SqliteSettings;

pub use app_services::QuizServices;
pub use error::{QuizError, QuizServicesError};
pub use progress::{OrderStore, SessionStore};
pub use quiz::{Answer, AnswerFeedback, FinishReason, QuizController, QuizPhase, SessionView};
