use std::sync::Arc;

use quiz_core::QuizPolicy;
use storage::repository::Storage;
use storage::sqlite::SqliteSettings;

use crate::Clock;
use crate::error::QuizServicesError;
use crate::progress::{OrderStore, SessionStore};
use crate::quiz::QuizController;

/// Assembles the progress stores over one storage backend and hands out controllers.
#[derive(Clone)]
pub struct QuizServices {
    policy: QuizPolicy,
    session_store: Arc<SessionStore>,
    order_store: Arc<OrderStore>,
}

impl QuizServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizServicesError` if connecting or migrating fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        policy: QuizPolicy,
    ) -> Result<Self, QuizServicesError> {
        Self::new_sqlite_with(db_url, SqliteSettings::default(), clock, policy).await
    }

    /// # Errors
    ///
    /// Returns `QuizServicesError` if connecting or migrating fails.
    pub async fn new_sqlite_with(
        db_url: &str,
        settings: SqliteSettings,
        clock: Clock,
        policy: QuizPolicy,
    ) -> Result<Self, QuizServicesError> {
        let storage = Storage::sqlite_with(db_url, settings).await?;
        Ok(Self::from_storage(&storage, clock, policy))
    }

    /// Build services over a fresh in-memory backend.
    #[must_use]
    pub fn in_memory(clock: Clock, policy: QuizPolicy) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, policy)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, policy: QuizPolicy) -> Self {
        let session_store = Arc::new(
            SessionStore::new(clock, Arc::clone(&storage.sessions)).with_policy(policy),
        );
        let order_store = Arc::new(OrderStore::new(
            Arc::clone(&storage.orders),
            Arc::clone(&storage.sessions),
        ));
        Self {
            policy,
            session_store,
            order_store,
        }
    }

    #[must_use]
    pub fn policy(&self) -> QuizPolicy {
        self.policy
    }

    #[must_use]
    pub fn session_store(&self) -> Arc<SessionStore> {
        Arc::clone(&self.session_store)
    }

    #[must_use]
    pub fn order_store(&self) -> Arc<OrderStore> {
        Arc::clone(&self.order_store)
    }

    /// A controller with an OS-seeded shuffle.
    #[must_use]
    pub fn controller(&self) -> QuizController {
        QuizController::new(self.session_store(), self.order_store())
    }

    /// A controller whose shuffles are reproducible from `seed`.
    #[must_use]
    pub fn seeded_controller(&self, seed: u64) -> QuizController {
        QuizController::with_seed(self.session_store(), self.order_store(), seed)
    }
}
