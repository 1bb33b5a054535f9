use chrono::Duration;
use quiz_core::model::{ItemId, OrderRecord, QuizMode, QuizSession, SetIdentity};
use quiz_core::time::fixed_now;
use storage::repository::{OrderEffect, OrderRepository, SessionRepository, StorageError};
use storage::sqlite::{SqliteRepository, SqliteSettings};

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn build_session(mode: QuizMode, total: u32) -> QuizSession {
    QuizSession::new(SetIdentity::from_parts("N5", "Bab1"), mode, total, fixed_now())
}

#[tokio::test]
async fn sqlite_roundtrip_persists_progress_and_answers() {
    let repo = connect("memdb_session_roundtrip").await;
    let session = build_session(QuizMode::MultipleChoice, 3);
    repo.insert_session(&session).await.unwrap();

    let answered = ItemId::random();
    let later = fixed_now() + Duration::minutes(3);
    let updated = repo
        .update_session(
            session.id(),
            Box::new(move |s| {
                s.record_answer(Some(true), 10, later);
                s.mark_answered(answered);
                s.advance(later);
                OrderEffect::Keep
            }),
        )
        .await
        .unwrap();

    let fetched = repo.get_session(session.id()).await.unwrap().unwrap();
    assert_eq!(fetched, updated);
    assert_eq!(fetched.score(), 10);
    assert_eq!(fetched.current_index(), 1);
    assert!(fetched.is_answered(answered));
    assert_eq!(fetched.last_accessed(), later);
    assert_eq!(fetched.mode(), QuizMode::MultipleChoice);
}

#[tokio::test]
async fn sqlite_insert_conflict_is_reported() {
    let repo = connect("memdb_session_conflict").await;
    let session = build_session(QuizMode::TextInput, 2);
    repo.insert_session(&session).await.unwrap();

    let err = repo.insert_session(&session).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_order_replace_and_discard_toggle_flag() {
    let repo = connect("memdb_order_flag").await;
    let session = build_session(QuizMode::MultipleChoice, 3);
    repo.insert_session(&session).await.unwrap();

    let ids = vec![ItemId::random(), ItemId::random(), ItemId::random()];
    let order = OrderRecord::new(session.id().clone(), ids.clone()).unwrap();
    repo.replace_order(&order).await.unwrap();

    let loaded = repo.get_order(session.id()).await.unwrap().unwrap();
    assert_eq!(loaded.item_ids(), ids.as_slice());
    assert!(repo.get_session(session.id()).await.unwrap().unwrap().has_order_saved());

    // A shorter replacement must not leave trailing positions behind.
    let shorter = OrderRecord::new(session.id().clone(), vec![ids[2]]).unwrap();
    repo.replace_order(&shorter).await.unwrap();
    assert_eq!(repo.get_order(session.id()).await.unwrap().unwrap().len(), 1);

    let reset = repo
        .update_session(
            session.id(),
            Box::new(|s| {
                s.reset_progress(2, fixed_now());
                OrderEffect::Discard
            }),
        )
        .await
        .unwrap();
    assert!(!reset.has_order_saved());
    assert!(repo.get_order(session.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_delete_session_cascades() {
    let repo = connect("memdb_session_delete").await;
    let session = build_session(QuizMode::TextInput, 1);
    repo.insert_session(&session).await.unwrap();

    let item = ItemId::random();
    repo.update_session(
        session.id(),
        Box::new(move |s| {
            s.mark_answered(item);
            OrderEffect::Keep
        }),
    )
    .await
    .unwrap();
    let order = OrderRecord::new(session.id().clone(), vec![item]).unwrap();
    repo.replace_order(&order).await.unwrap();

    assert!(repo.delete_session(session.id()).await.unwrap());
    assert!(repo.get_session(session.id()).await.unwrap().is_none());
    assert!(repo.get_order(session.id()).await.unwrap().is_none());

    let answers: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM quiz_session_answers WHERE session_id = ?1")
            .bind(session.id().as_str())
            .fetch_one(repo.pool())
            .await
            .unwrap();
    assert_eq!(answers, 0);
}

#[tokio::test]
async fn sqlite_rejects_corrupt_item_ids() {
    let repo = connect("memdb_order_corrupt").await;
    let session = build_session(QuizMode::MultipleChoice, 1);

    sqlx::query("INSERT INTO quiz_orders (session_id, position, item_id) VALUES (?1, 0, 'nope')")
        .bind(session.id().as_str())
        .execute(repo.pool())
        .await
        .unwrap();

    let err = repo.get_order(session.id()).await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}

#[tokio::test]
async fn sqlite_failed_order_replace_rolls_back() {
    let repo = connect("memdb_order_rollback").await;
    let fresh = build_session(QuizMode::MultipleChoice, 2);
    let saved = build_session(QuizMode::TextInput, 2);
    repo.insert_session(&fresh).await.unwrap();
    repo.insert_session(&saved).await.unwrap();

    let original = OrderRecord::new(saved.id().clone(), vec![ItemId::random(), ItemId::random()])
        .unwrap();
    repo.replace_order(&original).await.unwrap();

    sqlx::query(
        "CREATE TRIGGER reject_second_position BEFORE INSERT ON quiz_orders
         WHEN NEW.position = 1
         BEGIN SELECT RAISE(ABORT, 'rejected'); END",
    )
    .execute(repo.pool())
    .await
    .unwrap();

    for session in [&fresh, &saved] {
        let order =
            OrderRecord::new(session.id().clone(), vec![ItemId::random(), ItemId::random()])
                .unwrap();
        assert!(repo.replace_order(&order).await.is_err());
    }

    assert!(repo.get_order(fresh.id()).await.unwrap().is_none());
    assert!(!repo.get_session(fresh.id()).await.unwrap().unwrap().has_order_saved());

    assert_eq!(repo.get_order(saved.id()).await.unwrap().unwrap(), original);
    assert!(repo.get_session(saved.id()).await.unwrap().unwrap().has_order_saved());
}

#[tokio::test]
async fn sqlite_settings_reach_every_connection() {
    let settings = SqliteSettings {
        max_connections: 2,
        busy_timeout: std::time::Duration::from_millis(1234),
        ..SqliteSettings::default()
    };
    let repo = SqliteRepository::connect_with(
        "sqlite:file:memdb_settings?mode=memory&cache=shared",
        settings,
    )
    .await
    .unwrap();

    assert_eq!(repo.pool().options().get_max_connections(), 2);
    let busy: i64 = sqlx::query_scalar("PRAGMA busy_timeout")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(busy, 1234);
}
