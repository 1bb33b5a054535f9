use std::collections::BTreeSet;

use quiz_core::model::{QuizSession, SessionId};
use sqlx::SqliteConnection;

use super::SqliteRepository;
use super::mapping::{conn, map_item_ids, map_session_row};
use crate::repository::{OrderEffect, SessionMutation, SessionRepository, StorageError};

async fn fetch_session(
    db: &mut SqliteConnection,
    id: &SessionId,
) -> Result<Option<QuizSession>, StorageError> {
    let row = sqlx::query(
        r"
        SELECT session_id, set_identity, mode, score, current_index, total_questions,
               correct_count, incorrect_count, has_order_saved, last_accessed
        FROM quiz_sessions
        WHERE session_id = ?1
        ",
    )
    .bind(id.as_str())
    .fetch_optional(&mut *db)
    .await
    .map_err(conn)?;

    let Some(row) = row else {
        return Ok(None);
    };

    let answer_rows = sqlx::query(
        r"
        SELECT item_id FROM quiz_session_answers
        WHERE session_id = ?1
        ",
    )
    .bind(id.as_str())
    .fetch_all(&mut *db)
    .await
    .map_err(conn)?;

    let answered: BTreeSet<_> = map_item_ids(&answer_rows)?.into_iter().collect();
    map_session_row(&row, answered).map(Some)
}

async fn write_answers(db: &mut SqliteConnection, session: &QuizSession) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM quiz_session_answers WHERE session_id = ?1")
        .bind(session.id().as_str())
        .execute(&mut *db)
        .await
        .map_err(conn)?;

    for item in session.answered_item_ids() {
        sqlx::query(
            r"
            INSERT INTO quiz_session_answers (session_id, item_id)
            VALUES (?1, ?2)
            ",
        )
        .bind(session.id().as_str())
        .bind(item.to_string())
        .execute(&mut *db)
        .await
        .map_err(conn)?;
    }
    Ok(())
}

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn get_session(&self, id: &SessionId) -> Result<Option<QuizSession>, StorageError> {
        let mut db = self.pool.acquire().await.map_err(conn)?;
        fetch_session(&mut db, id).await
    }

    async fn insert_session(&self, session: &QuizSession) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO quiz_sessions (
                session_id, set_identity, mode, score, current_index, total_questions,
                correct_count, incorrect_count, has_order_saved, last_accessed
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(session.id().as_str())
        .bind(session.set_identity().as_str())
        .bind(session.mode().slug())
        .bind(i64::from(session.score()))
        .bind(i64::from(session.current_index()))
        .bind(i64::from(session.total_questions()))
        .bind(i64::from(session.correct_count()))
        .bind(i64::from(session.incorrect_count()))
        .bind(i64::from(session.has_order_saved()))
        .bind(session.last_accessed())
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => conn(other),
        })?;

        write_answers(&mut tx, session).await?;
        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn update_session(
        &self,
        id: &SessionId,
        mutation: SessionMutation,
    ) -> Result<QuizSession, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let mut session = fetch_session(&mut tx, id)
            .await?
            .ok_or(StorageError::NotFound)?;

        if mutation(&mut session) == OrderEffect::Discard {
            session.set_order_saved(false);
            sqlx::query("DELETE FROM quiz_orders WHERE session_id = ?1")
                .bind(id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }

        sqlx::query(
            r"
            UPDATE quiz_sessions SET
                score = ?2,
                current_index = ?3,
                total_questions = ?4,
                correct_count = ?5,
                incorrect_count = ?6,
                has_order_saved = ?7,
                last_accessed = ?8
            WHERE session_id = ?1
            ",
        )
        .bind(id.as_str())
        .bind(i64::from(session.score()))
        .bind(i64::from(session.current_index()))
        .bind(i64::from(session.total_questions()))
        .bind(i64::from(session.correct_count()))
        .bind(i64::from(session.incorrect_count()))
        .bind(i64::from(session.has_order_saved()))
        .bind(session.last_accessed())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        write_answers(&mut tx, &session).await?;
        tx.commit().await.map_err(conn)?;
        Ok(session)
    }

    async fn delete_session(&self, id: &SessionId) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query("DELETE FROM quiz_orders WHERE session_id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        let res = sqlx::query("DELETE FROM quiz_sessions WHERE session_id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(res.rows_affected() > 0)
    }
}
