use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How questions of a session are asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuizMode {
    MultipleChoice,
    TextInput,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown quiz mode: {0}")]
pub struct ParseModeError(String);

impl QuizMode {
    pub const ALL: [QuizMode; 2] = [QuizMode::MultipleChoice, QuizMode::TextInput];

    /// Human-readable name. Display-only.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            QuizMode::MultipleChoice => "Multiple Choice",
            QuizMode::TextInput => "Text Input",
        }
    }

    /// Display-only description of the mode.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            QuizMode::MultipleChoice => "Pick the correct answer from several options.",
            QuizMode::TextInput => "Type the correct reading or meaning.",
        }
    }

    /// Name lower-cased with spaces replaced by underscores.
    ///
    /// Part of the session key, so it must never change for an existing mode.
    #[must_use]
    pub fn slug(self) -> String {
        self.name().to_lowercase().replace(' ', "_")
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QuizMode {
    type Err = ParseModeError;

    /// Accepts the slug, the kebab-case slug, or the display name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        QuizMode::ALL
            .into_iter()
            .find(|mode| mode.slug() == normalized)
            .ok_or_else(|| ParseModeError(s.to_string()))
    }
}
