//! Question generation.
//!
//! Everything here is pure; randomness is injected so callers can seed it.

mod generator;
mod question;

pub use generator::{GenerateError, GeneratedBatch, QuestionGenerator};
pub use question::{
    MultipleChoiceKind, MultipleChoiceQuestion, Question, TextInputKind, TextInputQuestion,
};
