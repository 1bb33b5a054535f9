mod controller;
mod view;

pub use controller::QuizController;
pub use view::{Answer, AnswerFeedback, FinishReason, QuizPhase, SessionView};
