#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod policy;
pub mod quiz;
pub mod time;

pub use error::Error;
pub use policy::{PolicyError, QuizPolicy, QuizPolicyDraft};
pub use time::Clock;
