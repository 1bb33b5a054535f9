use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{ItemId, QuizMode, SessionId, SetIdentity};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("current index {index} exceeds total questions {total}")]
    IndexOutOfRange { index: u32, total: u32 },

    #[error("answer counts ({answered}) exceed total questions {total}")]
    TooManyAnswers { answered: u32, total: u32 },

    #[error("order record for {session} is empty")]
    EmptyOrder { session: SessionId },
}

/// Outcome of grading one answer at the store boundary.
///
/// `None` means "not graded"; only the access time is refreshed.
pub type Grade = Option<bool>;

/// Persistent progress for one (set, mode) pair.
///
/// All mutators keep `current_index <= total_questions` and
/// `correct_count + incorrect_count <= total_questions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    id: SessionId,
    set_identity: SetIdentity,
    mode: QuizMode,
    score: u32,
    current_index: u32,
    total_questions: u32,
    correct_count: u32,
    incorrect_count: u32,
    answered_item_ids: BTreeSet<ItemId>,
    has_order_saved: bool,
    last_accessed: DateTime<Utc>,
}

impl QuizSession {
    /// Fresh session with zeroed progress and no saved order.
    #[must_use]
    pub fn new(
        set_identity: SetIdentity,
        mode: QuizMode,
        total_questions: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::for_set(&set_identity, mode),
            set_identity,
            mode,
            score: 0,
            current_index: 0,
            total_questions,
            correct_count: 0,
            incorrect_count: 0,
            answered_item_ids: BTreeSet::new(),
            has_order_saved: false,
            last_accessed: now,
        }
    }

    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the stored counters break the session invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        set_identity: SetIdentity,
        mode: QuizMode,
        score: u32,
        current_index: u32,
        total_questions: u32,
        correct_count: u32,
        incorrect_count: u32,
        answered_item_ids: BTreeSet<ItemId>,
        has_order_saved: bool,
        last_accessed: DateTime<Utc>,
    ) -> Result<Self, ProgressError> {
        if current_index > total_questions {
            return Err(ProgressError::IndexOutOfRange {
                index: current_index,
                total: total_questions,
            });
        }
        let answered = correct_count.saturating_add(incorrect_count);
        if answered > total_questions {
            return Err(ProgressError::TooManyAnswers {
                answered,
                total: total_questions,
            });
        }

        Ok(Self {
            id: SessionId::for_set(&set_identity, mode),
            set_identity,
            mode,
            score,
            current_index,
            total_questions,
            correct_count,
            incorrect_count,
            answered_item_ids,
            has_order_saved,
            last_accessed,
        })
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn set_identity(&self) -> &SetIdentity {
        &self.set_identity
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn current_index(&self) -> u32 {
        self.current_index
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.incorrect_count
    }

    #[must_use]
    pub fn answered_item_ids(&self) -> &BTreeSet<ItemId> {
        &self.answered_item_ids
    }

    #[must_use]
    pub fn is_answered(&self, item: ItemId) -> bool {
        self.answered_item_ids.contains(&item)
    }

    #[must_use]
    pub fn has_order_saved(&self) -> bool {
        self.has_order_saved
    }

    #[must_use]
    pub fn last_accessed(&self) -> DateTime<Utc> {
        self.last_accessed
    }

    /// True when progress exists that refers to a particular item order.
    #[must_use]
    pub fn has_progress(&self) -> bool {
        self.current_index > 0
            || self.correct_count > 0
            || self.incorrect_count > 0
            || self.score > 0
            || !self.answered_item_ids.is_empty()
    }

    /// `current_index >= total_questions` with at least one question.
    #[must_use]
    pub fn is_past_end(&self) -> bool {
        self.total_questions > 0 && self.current_index >= self.total_questions
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_index: self.current_index,
            total_questions: self.total_questions,
            score: self.score,
            correct_count: self.correct_count,
            incorrect_count: self.incorrect_count,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed = now;
    }

    /// Zero every progress field and forget the saved order.
    pub fn reset_progress(&mut self, total_questions: u32, now: DateTime<Utc>) {
        self.total_questions = total_questions;
        self.current_index = 0;
        self.score = 0;
        self.correct_count = 0;
        self.incorrect_count = 0;
        self.answered_item_ids.clear();
        self.has_order_saved = false;
        self.last_accessed = now;
    }

    /// Apply a grade. Returns whether a counter changed.
    ///
    /// A graded answer past `total_questions` answers is ignored.
    pub fn record_answer(&mut self, grade: Grade, points: u32, now: DateTime<Utc>) -> bool {
        self.last_accessed = now;
        let Some(correct) = grade else {
            return false;
        };
        if self.correct_count.saturating_add(self.incorrect_count) >= self.total_questions {
            return false;
        }
        if correct {
            self.correct_count += 1;
            self.score = self.score.saturating_add(points);
        } else {
            self.incorrect_count += 1;
        }
        true
    }

    /// Returns `true` if the id was newly inserted.
    pub fn mark_answered(&mut self, item: ItemId) -> bool {
        self.answered_item_ids.insert(item)
    }

    /// Move to the next question; no-op once the index reaches the total.
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        if self.current_index >= self.total_questions {
            return false;
        }
        self.current_index += 1;
        self.last_accessed = now;
        true
    }

    pub fn set_order_saved(&mut self, saved: bool) {
        self.has_order_saved = saved;
    }
}

/// Read-only progress view for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub current_index: u32,
    pub total_questions: u32,
    pub score: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
}

/// Persisted presentation order for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    session_id: SessionId,
    item_ids: Vec<ItemId>,
}

impl OrderRecord {
    /// # Errors
    ///
    /// Returns `ProgressError::EmptyOrder` for an empty id list; an empty
    /// order can never be resumed from.
    pub fn new(session_id: SessionId, item_ids: Vec<ItemId>) -> Result<Self, ProgressError> {
        if item_ids.is_empty() {
            return Err(ProgressError::EmptyOrder {
                session: session_id,
            });
        }
        Ok(Self {
            session_id,
            item_ids,
        })
    }

    /// Rehydrate without validation; stored records are revalidated on load.
    #[must_use]
    pub fn from_persisted(session_id: SessionId, item_ids: Vec<ItemId>) -> Self {
        Self {
            session_id,
            item_ids,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.item_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }
}
