use quiz_core::model::{OrderRecord, SessionId};

use super::SqliteRepository;
use super::mapping::{conn, map_item_ids, ser};
use crate::repository::{OrderRepository, StorageError};

#[async_trait::async_trait]
impl OrderRepository for SqliteRepository {
    async fn get_order(&self, id: &SessionId) -> Result<Option<OrderRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT item_id FROM quiz_orders
            WHERE session_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        if rows.is_empty() {
            return Ok(None);
        }
        let item_ids = map_item_ids(&rows)?;
        Ok(Some(OrderRecord::from_persisted(id.clone(), item_ids)))
    }

    async fn replace_order(&self, order: &OrderRecord) -> Result<(), StorageError> {
        let session_id = order.session_id().as_str();
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query("DELETE FROM quiz_orders WHERE session_id = ?1")
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, item) in order.item_ids().iter().enumerate() {
            let position = i64::try_from(position).map_err(ser)?;
            sqlx::query(
                r"
                INSERT INTO quiz_orders (session_id, position, item_id)
                VALUES (?1, ?2, ?3)
                ",
            )
            .bind(session_id)
            .bind(position)
            .bind(item.to_string())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        sqlx::query("UPDATE quiz_sessions SET has_order_saved = 1 WHERE session_id = ?1")
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn delete_order(&self, id: &SessionId) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query("DELETE FROM quiz_orders WHERE session_id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        sqlx::query("UPDATE quiz_sessions SET has_order_saved = 0 WHERE session_id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(res.rows_affected() > 0)
    }
}
