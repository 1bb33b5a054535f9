use std::collections::HashMap;
use std::sync::Arc;

use quiz_core::model::{Item, ItemId, OrderRecord, QuizSession, SessionId};
use storage::repository::{OrderRepository, SessionRepository, StorageError};
use tracing::{debug, warn};

use crate::error::QuizError;

/// Owns the persisted presentation order of each session.
///
/// Saved orders are revalidated on every load; anything that no longer lines
/// up with the session or the set is discarded rather than repaired.
#[derive(Clone)]
pub struct OrderStore {
    orders: Arc<dyn OrderRepository>,
    sessions: Arc<dyn SessionRepository>,
}

impl OrderStore {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderRepository>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { orders, sessions }
    }

    /// Replace the session's order and flag it as saved.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Progress` for an empty id list.
    /// Returns `QuizError::Persistence` if the write fails.
    pub async fn save(
        &self,
        session_id: &SessionId,
        item_ids: Vec<ItemId>,
    ) -> Result<OrderRecord, QuizError> {
        let record = OrderRecord::new(session_id.clone(), item_ids)?;
        self.orders.replace_order(&record).await?;
        debug!(session = %session_id, len = record.len(), "saved question order");
        Ok(record)
    }

    /// Resolve the saved order against `available` items.
    ///
    /// Returns `None` when there is nothing usable to resume from. A record is
    /// usable only if it decodes, is non-empty, every id resolves, and its
    /// length equals the session's current total; otherwise it is deleted and
    /// the session's flag cleared.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Persistence` if repository access fails.
    pub async fn load(
        &self,
        session_id: &SessionId,
        available: &[Item],
    ) -> Result<Option<Vec<Item>>, QuizError> {
        let session = self.sessions.get_session(session_id).await?;
        let record = match self.orders.get_order(session_id).await {
            Ok(record) => record,
            Err(StorageError::Serialization(detail)) => {
                debug!(session = %session_id, %detail, "stored order does not decode");
                return self.discard(session_id, "order record is unreadable").await;
            }
            Err(e) => return Err(e.into()),
        };
        let Some(record) = record else {
            if session.as_ref().is_some_and(QuizSession::has_order_saved) {
                self.discard(session_id, "flagged order is missing").await?;
            }
            return Ok(None);
        };

        if record.is_empty() {
            return self.discard(session_id, "order is empty").await;
        }

        let by_id: HashMap<ItemId, &Item> = available.iter().map(|i| (i.id(), i)).collect();
        let mut resolved = Vec::with_capacity(record.len());
        for id in record.item_ids() {
            match by_id.get(id) {
                Some(item) => resolved.push((*item).clone()),
                None => return self.discard(session_id, "order references a missing item").await,
            }
        }

        let Some(session) = session else {
            return self.discard(session_id, "order has no session").await;
        };
        if u32::try_from(resolved.len()).ok() != Some(session.total_questions()) {
            return self.discard(session_id, "order length differs from session total").await;
        }

        Ok(Some(resolved))
    }

    /// Remove the order and clear the session flag. No-op when absent.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Persistence` if the delete fails.
    pub async fn clear(&self, session_id: &SessionId) -> Result<bool, QuizError> {
        Ok(self.orders.delete_order(session_id).await?)
    }

    async fn discard(
        &self,
        session_id: &SessionId,
        reason: &'static str,
    ) -> Result<Option<Vec<Item>>, QuizError> {
        warn!(session = %session_id, reason, "discarding stale question order");
        self.orders.delete_order(session_id).await?;
        Ok(None)
    }
}
