use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PolicyError {
    #[error("points per correct answer must be > 0")]
    InvalidPoints,

    #[error("max options must be at least 2 (got {0})")]
    InvalidMaxOptions(usize),
}

/// Tunable scoring and question-shape constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuizPolicyDraft", into = "QuizPolicyDraft")]
pub struct QuizPolicy {
    points_per_correct: u32,
    max_options: usize,
}

impl QuizPolicy {
    pub const DEFAULT_POINTS_PER_CORRECT: u32 = 10;
    pub const DEFAULT_MAX_OPTIONS: usize = 4;

    /// # Errors
    ///
    /// Returns `PolicyError` if points are zero or fewer than two options are allowed.
    pub fn new(points_per_correct: u32, max_options: usize) -> Result<Self, PolicyError> {
        if points_per_correct == 0 {
            return Err(PolicyError::InvalidPoints);
        }
        if max_options < 2 {
            return Err(PolicyError::InvalidMaxOptions(max_options));
        }
        Ok(Self {
            points_per_correct,
            max_options,
        })
    }

    #[must_use]
    pub fn points_per_correct(&self) -> u32 {
        self.points_per_correct
    }

    /// Upper bound on options in a multiple-choice question, correct answer included.
    #[must_use]
    pub fn max_options(&self) -> usize {
        self.max_options
    }
}

impl Default for QuizPolicy {
    fn default() -> Self {
        Self {
            points_per_correct: Self::DEFAULT_POINTS_PER_CORRECT,
            max_options: Self::DEFAULT_MAX_OPTIONS,
        }
    }
}

/// Unvalidated policy as it appears in configuration files.
///
/// Missing fields fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizPolicyDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_per_correct: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_options: Option<usize>,
}

impl QuizPolicyDraft {
    /// # Errors
    ///
    /// Returns `PolicyError` if a provided value is out of range.
    pub fn validate(self) -> Result<QuizPolicy, PolicyError> {
        QuizPolicy::new(
            self.points_per_correct
                .unwrap_or(QuizPolicy::DEFAULT_POINTS_PER_CORRECT),
            self.max_options.unwrap_or(QuizPolicy::DEFAULT_MAX_OPTIONS),
        )
    }
}

impl TryFrom<QuizPolicyDraft> for QuizPolicy {
    type Error = PolicyError;

    fn try_from(draft: QuizPolicyDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<QuizPolicy> for QuizPolicyDraft {
    fn from(policy: QuizPolicy) -> Self {
        Self {
            points_per_correct: Some(policy.points_per_correct),
            max_options: Some(policy.max_options),
        }
    }
}
