use std::collections::BTreeSet;

use quiz_core::model::{ItemId, QuizMode, QuizSession, SessionId, SetIdentity};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn item_id_from_str(raw: &str) -> Result<ItemId, StorageError> {
    raw.parse::<ItemId>().map_err(ser)
}

pub(crate) fn map_item_ids(rows: &[SqliteRow]) -> Result<Vec<ItemId>, StorageError> {
    rows.iter()
        .map(|row| {
            let raw: String = row.try_get("item_id").map_err(ser)?;
            item_id_from_str(&raw)
        })
        .collect()
}

pub(crate) fn map_session_row(
    row: &SqliteRow,
    answered_item_ids: BTreeSet<ItemId>,
) -> Result<QuizSession, StorageError> {
    let stored_id: String = row.try_get("session_id").map_err(ser)?;
    let set_identity = SetIdentity::from_persisted(row.try_get::<String, _>("set_identity").map_err(ser)?);
    let mode: QuizMode = row
        .try_get::<String, _>("mode")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;

    let session = QuizSession::from_persisted(
        set_identity,
        mode,
        i64_to_u32("score", row.try_get("score").map_err(ser)?)?,
        i64_to_u32("current_index", row.try_get("current_index").map_err(ser)?)?,
        i64_to_u32("total_questions", row.try_get("total_questions").map_err(ser)?)?,
        i64_to_u32("correct_count", row.try_get("correct_count").map_err(ser)?)?,
        i64_to_u32("incorrect_count", row.try_get("incorrect_count").map_err(ser)?)?,
        answered_item_ids,
        row.try_get::<i64, _>("has_order_saved").map_err(ser)? != 0,
        row.try_get("last_accessed").map_err(ser)?,
    )
    .map_err(ser)?;

    if session.id() != &SessionId::from_persisted(stored_id.clone()) {
        return Err(StorageError::Serialization(format!(
            "session key {stored_id} does not match {}",
            session.id()
        )));
    }
    Ok(session)
}
