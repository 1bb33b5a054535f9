use std::sync::Arc;

use quiz_core::QuizPolicy;
use quiz_core::model::{Item, ItemId, ItemSet, QuizMode};
use quiz_core::quiz::Question;
use quiz_core::time::fixed_clock;
use services::{Answer, QuizPhase, QuizServices};
use storage::repository::{SessionRepository, Storage};
use storage::sqlite::SqliteRepository;

async fn sqlite_services(name: &str) -> (SqliteRepository, QuizServices) {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    let storage = Storage {
        sessions: Arc::new(repo.clone()),
        orders: Arc::new(repo.clone()),
    };
    let services = QuizServices::from_storage(&storage, fixed_clock(), QuizPolicy::default());
    (repo, services)
}

fn set() -> ItemSet {
    let items = [("山", "やま", "gunung"), ("川", "かわ", "sungai"), ("木", "き", "pohon")]
        .into_iter()
        .map(|(p, r, m)| Item::new(ItemId::derived(p), p, r, m).unwrap())
        .collect();
    ItemSet::new("N5", "alam", items).unwrap()
}

#[tokio::test]
async fn unreadable_order_is_discarded_and_regenerated() {
    let (repo, services) = sqlite_services("memdb_flow_unreadable_order").await;
    let set = set();

    let mut quiz = services.seeded_controller(3);
    quiz.setup_session(&set, QuizMode::TextInput).await.unwrap();
    let Some(Question::TextInput(q)) = quiz.current_question().cloned() else {
        panic!("expected a text question");
    };
    quiz.submit_answer(Answer::Text(q.correct_answer_text().to_string()))
        .await
        .unwrap();
    quiz.proceed().await.unwrap();
    let session_id = quiz.session().unwrap().id().clone();

    sqlx::query("UPDATE quiz_orders SET item_id = 'garbage' WHERE session_id = ?1")
        .bind(session_id.as_str())
        .execute(repo.pool())
        .await
        .unwrap();

    let mut again = services.seeded_controller(4);
    let view = again.setup_session(&set, QuizMode::TextInput).await.unwrap();
    assert_eq!(view.phase, QuizPhase::Active);
    assert_eq!(view.snapshot.current_index, 0);
    assert_eq!(view.snapshot.score, 0);
    assert_eq!(view.snapshot.total_questions, 3);

    let stored = repo.get_session(&session_id).await.unwrap().unwrap();
    assert!(stored.has_order_saved());
    let reloaded = services
        .order_store()
        .load(&session_id, set.items())
        .await
        .unwrap()
        .expect("fresh order saved");
    assert_eq!(reloaded.len(), 3);

    let mut third = services.seeded_controller(5);
    let view = third.setup_session(&set, QuizMode::TextInput).await.unwrap();
    assert_eq!(view.phase, QuizPhase::Active);
    let resumed: Vec<ItemId> = third.questions().iter().map(Question::source_item_id).collect();
    let fresh: Vec<ItemId> = reloaded.iter().map(Item::id).collect();
    assert_eq!(resumed, fresh);
}
