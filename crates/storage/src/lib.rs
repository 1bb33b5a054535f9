#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, OrderEffect, OrderRepository, SessionMutation, SessionRepository, Storage,
    StorageError,
};
pub use sqlite::{SqliteInitError, SqliteRepository, SqliteSettings};
