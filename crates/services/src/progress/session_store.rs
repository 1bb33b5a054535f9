use std::sync::Arc;

use chrono::{DateTime, Utc};
use quiz_core::QuizPolicy;
use quiz_core::model::{Grade, ItemId, QuizMode, QuizSession, SessionId, SetIdentity};
use storage::repository::{OrderEffect, SessionMutation, SessionRepository, StorageError};
use tracing::{debug, info};

use crate::Clock;
use crate::error::QuizError;

/// Owns per-(set, mode) progress records.
///
/// Every operation is a single repository call, so a write either lands
/// completely or not at all. Returned sessions are snapshots; the store never
/// mutates a value it has already handed out.
#[derive(Clone)]
pub struct SessionStore {
    clock: Clock,
    policy: QuizPolicy,
    sessions: Arc<dyn SessionRepository>,
}

impl SessionStore {
    #[must_use]
    pub fn new(clock: Clock, sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            clock,
            policy: QuizPolicy::default(),
            sessions,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: QuizPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn policy(&self) -> QuizPolicy {
        self.policy
    }

    /// Return the session for `(set, mode)`, creating it on first access.
    ///
    /// An existing session whose total no longer matches `item_count` has all
    /// progress zeroed and its order dropped in the same write.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::SetTooLarge` if `item_count` does not fit a session counter.
    /// Returns `QuizError::Persistence` if repository access fails.
    pub async fn get_or_create(
        &self,
        set: &SetIdentity,
        mode: QuizMode,
        item_count: usize,
    ) -> Result<QuizSession, QuizError> {
        let total = u32::try_from(item_count).map_err(|_| QuizError::SetTooLarge(item_count))?;
        let id = SessionId::for_set(set, mode);
        let now = self.clock.now();

        match self.sessions.update_session(&id, sync_total(total, now)).await {
            Ok(session) => return Ok(session),
            Err(StorageError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let session = QuizSession::new(set.clone(), mode, total, now);
        match self.sessions.insert_session(&session).await {
            Ok(()) => {
                info!(session = %id, total, "created quiz session");
                Ok(session)
            }
            // Created between our update and insert; fall back to the stored one.
            Err(StorageError::Conflict) => Ok(self
                .sessions
                .update_session(&id, sync_total(total, now))
                .await?),
            Err(e) => Err(e.into()),
        }
    }

    /// Read-only fetch for progress display; does not touch `last_accessed`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Persistence` if repository access fails.
    pub async fn find(
        &self,
        set: &SetIdentity,
        mode: QuizMode,
    ) -> Result<Option<QuizSession>, QuizError> {
        let id = SessionId::for_set(set, mode);
        Ok(self.sessions.get_session(&id).await?)
    }

    /// Apply a tri-state grade. `None` only refreshes `last_accessed`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Persistence` if the session is missing or the write fails.
    pub async fn record_answer(
        &self,
        id: &SessionId,
        grade: Grade,
    ) -> Result<QuizSession, QuizError> {
        let points = self.policy.points_per_correct();
        let now = self.clock.now();
        self.update(
            id,
            Box::new(move |s| {
                s.record_answer(grade, points, now);
                OrderEffect::Keep
            }),
        )
        .await
    }

    /// Add an item to the answered log. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Persistence` if the session is missing or the write fails.
    pub async fn mark_answered(
        &self,
        id: &SessionId,
        item: ItemId,
    ) -> Result<QuizSession, QuizError> {
        self.update(
            id,
            Box::new(move |s| {
                s.mark_answered(item);
                OrderEffect::Keep
            }),
        )
        .await
    }

    /// Mark `item` answered and count the grade, as one write.
    ///
    /// An item already in the answered log leaves the counters untouched.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Persistence` if the session is missing or the write fails.
    pub async fn record_graded_answer(
        &self,
        id: &SessionId,
        item: ItemId,
        correct: bool,
    ) -> Result<QuizSession, QuizError> {
        let points = self.policy.points_per_correct();
        let now = self.clock.now();
        self.update(
            id,
            Box::new(move |s| {
                if s.mark_answered(item) {
                    s.record_answer(Some(correct), points, now);
                } else {
                    debug!(session = %s.id(), %item, "answer already recorded");
                    s.touch(now);
                }
                OrderEffect::Keep
            }),
        )
        .await
    }

    /// Step to the next question; stays put once `current_index == total_questions`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Persistence` if the session is missing or the write fails.
    pub async fn advance(&self, id: &SessionId) -> Result<QuizSession, QuizError> {
        let now = self.clock.now();
        self.update(
            id,
            Box::new(move |s| {
                s.advance(now);
                OrderEffect::Keep
            }),
        )
        .await
    }

    /// Move the index to the end so the session resumes as finished.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Persistence` if the session is missing or the write fails.
    pub async fn complete(&self, id: &SessionId) -> Result<QuizSession, QuizError> {
        let now = self.clock.now();
        self.update(
            id,
            Box::new(move |s| {
                while s.advance(now) {}
                OrderEffect::Keep
            }),
        )
        .await
    }

    /// Zero all progress and drop the saved order, keeping the total.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Persistence` if the session is missing or the write fails.
    pub async fn restart(&self, id: &SessionId) -> Result<QuizSession, QuizError> {
        let now = self.clock.now();
        self.update(
            id,
            Box::new(move |s| {
                let total = s.total_questions();
                s.reset_progress(total, now);
                OrderEffect::Discard
            }),
        )
        .await
    }

    /// Delete the session and its order. Returns `false` if nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Persistence` if the delete fails.
    pub async fn clear(&self, set: &SetIdentity, mode: QuizMode) -> Result<bool, QuizError> {
        let id = SessionId::for_set(set, mode);
        let removed = self.sessions.delete_session(&id).await?;
        if removed {
            info!(session = %id, "cleared quiz session");
        }
        Ok(removed)
    }

    async fn update(
        &self,
        id: &SessionId,
        mutation: SessionMutation,
    ) -> Result<QuizSession, QuizError> {
        Ok(self.sessions.update_session(id, mutation).await?)
    }
}

fn sync_total(total: u32, now: DateTime<Utc>) -> SessionMutation {
    Box::new(move |s| {
        if s.total_questions() == total {
            s.touch(now);
            OrderEffect::Keep
        } else {
            info!(
                session = %s.id(),
                previous = s.total_questions(),
                current = total,
                "item count changed; resetting progress"
            );
            s.reset_progress(total, now);
            OrderEffect::Discard
        }
    })
}
