use quiz_core::model::{Question, QuestionId, QuizSession, SessionSnapshot, Settings};
use quiz_core::time::fixed_now;
use storage::repository::{
    NewQuestionSetRecord, QuestionSetRepository, SessionSnapshotRepository, SettingsRepository,
    Storage, StorageError,
};
use storage::sqlite::SqliteRepository;

fn build_question(id: u64, category: &str, correct: usize) -> Question {
    Question::new(
        QuestionId::new(id),
        format!("Question {id}?"),
        category,
        vec!["a".into(), "b".into(), "c".into(), "d".into()],
        correct,
        Some(format!("Explanation {id}")),
    )
    .unwrap()
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrips_question_sets_with_metadata() {
    let repo = connect("memdb_question_sets").await;

    let questions = vec![
        build_question(1, "History", 0),
        build_question(2, "Science", 3),
        build_question(3, "History", 1),
    ];
    let id = repo
        .insert_question_set(NewQuestionSetRecord::new(
            "World quiz",
            questions.clone(),
            fixed_now(),
        ))
        .await
        .expect("insert");

    let stored = repo
        .get_question_set(id)
        .await
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.name, "World quiz");
    assert_eq!(stored.questions, questions);
    assert_eq!(stored.categories, vec!["History", "Science"]);
    assert_eq!(stored.uploaded_at, fixed_now());

    let summaries = repo.list_question_sets().await.expect("list");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, id);
    assert_eq!(summaries[0].question_count, 3);

    repo.delete_question_set(id).await.expect("delete");
    assert!(repo.get_question_set(id).await.expect("fetch").is_none());
}

#[tokio::test]
async fn sqlite_keeps_a_single_session_snapshot() {
    let repo = connect("memdb_session").await;
    assert!(repo.load_session().await.expect("load").is_none());

    let questions = vec![build_question(1, "Geo", 2), build_question(2, "Geo", 0)];
    let mut session =
        QuizSession::start("Geo", questions.clone(), questions, fixed_now()).expect("start");
    repo.save_session(&SessionSnapshot::from_session(&session))
        .await
        .expect("save");

    session.select_answer(2).expect("select");
    session.submit(1_250).expect("submit");
    repo.save_session(&SessionSnapshot::from_session(&session))
        .await
        .expect("overwrite");

    let loaded = repo
        .load_session()
        .await
        .expect("load")
        .expect("present")
        .into_session()
        .expect("well formed");
    assert_eq!(loaded.current_index(), 0);
    assert_eq!(loaded.score(), 1);
    assert_eq!(loaded.answers(), session.answers());

    repo.clear_session().await.expect("clear");
    repo.clear_session().await.expect("clear twice");
    assert!(repo.load_session().await.expect("load").is_none());
}

#[tokio::test]
async fn sqlite_reports_corrupt_snapshot() {
    let repo = connect("memdb_corrupt").await;
    sqlx::query("INSERT INTO session_snapshot (id, snapshot) VALUES (1, '{broken')")
        .execute(repo.pool())
        .await
        .expect("raw insert");

    let err = repo.load_session().await.unwrap_err();
    assert!(matches!(err, StorageError::Corrupt(_)));
}

#[tokio::test]
async fn sqlite_snapshot_table_holds_only_the_snapshot() {
    let repo = connect("memdb_snapshot_schema").await;
    let columns: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info('session_snapshot') ORDER BY cid")
            .fetch_all(repo.pool())
            .await
            .expect("table info");
    assert_eq!(columns, ["id", "snapshot"]);
}

#[tokio::test]
async fn sqlite_settings_default_to_none_then_persist() {
    let repo = connect("memdb_settings").await;
    assert!(repo.load_settings().await.expect("load").is_none());

    let settings = Settings {
        show_explanations: false,
        randomize_questions: true,
        randomize_options: false,
        dark_mode: true,
    };
    repo.save_settings(&settings).await.expect("save");
    assert_eq!(repo.load_settings().await.expect("load"), Some(settings));
}

#[tokio::test]
async fn sqlite_storage_clear_all_empties_library_and_session() {
    let storage = Storage::sqlite("sqlite:file:memdb_clear_all?mode=memory&cache=shared")
        .await
        .expect("storage");

    let questions = vec![build_question(1, "Geo", 0)];
    storage
        .question_sets
        .insert_question_set(NewQuestionSetRecord::new("Geo", questions.clone(), fixed_now()))
        .await
        .expect("insert");
    let session = QuizSession::start("Geo", questions.clone(), questions, fixed_now()).expect("start");
    storage
        .sessions
        .save_session(&SessionSnapshot::from_session(&session))
        .await
        .expect("save");

    storage.clear_all().await.expect("clear all");

    assert!(storage.question_sets.list_question_sets().await.expect("list").is_empty());
    assert!(storage.sessions.load_session().await.expect("load").is_none());
}
