use async_trait::async_trait;
use quiz_core::model::{OrderRecord, QuizSession, SessionId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// What should happen to a session's order record after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEffect {
    Keep,
    /// Delete the order record and clear `has_order_saved`, atomically with the session write.
    Discard,
}

/// A read-modify-write step applied to a stored session inside one store call.
pub type SessionMutation = Box<dyn FnOnce(&mut QuizSession) -> OrderEffect + Send>;

/// Repository contract for the `sessions` table.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Fetch a session by id; `None` if it was never created or was cleared.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_session(&self, id: &SessionId) -> Result<Option<QuizSession>, StorageError>;

    /// Persist a brand-new session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a session with the same id exists.
    async fn insert_session(&self, session: &QuizSession) -> Result<(), StorageError>;

    /// Load, mutate, and write back a session as one atomic step.
    ///
    /// Returns the session as written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist; nothing
    /// is written on any error.
    async fn update_session(
        &self,
        id: &SessionId,
        mutation: SessionMutation,
    ) -> Result<QuizSession, StorageError>;

    /// Delete a session together with its order record.
    ///
    /// Returns `false` when there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend write fails.
    async fn delete_session(&self, id: &SessionId) -> Result<bool, StorageError>;
}

/// Repository contract for the `orders` table.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_order(&self, id: &SessionId) -> Result<Option<OrderRecord>, StorageError>;

    /// Replace any existing record for the session and set the session's
    /// `has_order_saved` flag, as one transaction.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend write fails; neither write is applied then.
    async fn replace_order(&self, order: &OrderRecord) -> Result<(), StorageError>;

    /// Remove the record and clear the session flag, as one transaction.
    ///
    /// Returns `false` if no record existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend write fails.
    async fn delete_order(&self, id: &SessionId) -> Result<bool, StorageError>;
}

#[derive(Default)]
struct Tables {
    sessions: HashMap<SessionId, QuizSession>,
    orders: HashMap<SessionId, OrderRecord>,
}

/// In-memory implementation for tests and ephemeral runs.
///
/// Both tables sit behind one `RwLock`, so cross-table writes are atomic and
/// concurrent readers never block each other.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: ToString>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn get_session(&self, id: &SessionId) -> Result<Option<QuizSession>, StorageError> {
        let guard = self.tables.read().map_err(poisoned)?;
        Ok(guard.sessions.get(id).cloned())
    }

    async fn insert_session(&self, session: &QuizSession) -> Result<(), StorageError> {
        let mut guard = self.tables.write().map_err(poisoned)?;
        if guard.sessions.contains_key(session.id()) {
            return Err(StorageError::Conflict);
        }
        guard.sessions.insert(session.id().clone(), session.clone());
        Ok(())
    }

    async fn update_session(
        &self,
        id: &SessionId,
        mutation: SessionMutation,
    ) -> Result<QuizSession, StorageError> {
        let mut guard = self.tables.write().map_err(poisoned)?;
        let mut session = guard.sessions.get(id).cloned().ok_or(StorageError::NotFound)?;

        if mutation(&mut session) == OrderEffect::Discard {
            session.set_order_saved(false);
            guard.orders.remove(id);
        }
        guard.sessions.insert(id.clone(), session.clone());
        Ok(session)
    }

    async fn delete_session(&self, id: &SessionId) -> Result<bool, StorageError> {
        let mut guard = self.tables.write().map_err(poisoned)?;
        guard.orders.remove(id);
        Ok(guard.sessions.remove(id).is_some())
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepository {
    async fn get_order(&self, id: &SessionId) -> Result<Option<OrderRecord>, StorageError> {
        let guard = self.tables.read().map_err(poisoned)?;
        Ok(guard.orders.get(id).cloned())
    }

    async fn replace_order(&self, order: &OrderRecord) -> Result<(), StorageError> {
        let mut guard = self.tables.write().map_err(poisoned)?;
        guard
            .orders
            .insert(order.session_id().clone(), order.clone());
        if let Some(session) = guard.sessions.get_mut(order.session_id()) {
            session.set_order_saved(true);
        }
        Ok(())
    }

    async fn delete_order(&self, id: &SessionId) -> Result<bool, StorageError> {
        let mut guard = self.tables.write().map_err(poisoned)?;
        let removed = guard.orders.remove(id).is_some();
        if let Some(session) = guard.sessions.get_mut(id) {
            session.set_order_saved(false);
        }
        Ok(removed)
    }
}

/// Aggregates the session and order repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
    pub orders: Arc<dyn OrderRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo.clone());
        let orders: Arc<dyn OrderRepository> = Arc::new(repo);
        Self { sessions, orders }
    }
}
