use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{
    Question, QuestionSet, QuestionSetId, SessionSnapshot, Settings, distinct_categories,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("stored data is corrupt: {0}")]
    Corrupt(String),
}

/// A question set as it is kept in the library, with upload metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredQuestionSet {
    pub id: QuestionSetId,
    pub name: String,
    pub questions: Vec<Question>,
    pub categories: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl StoredQuestionSet {
    #[must_use]
    pub fn summary(&self) -> QuestionSetSummary {
        QuestionSetSummary {
            id: self.id,
            name: self.name.clone(),
            question_count: self.questions.len(),
            categories: self.categories.clone(),
            uploaded_at: self.uploaded_at,
        }
    }

    #[must_use]
    pub fn into_question_set(self) -> QuestionSet {
        QuestionSet::new(self.name, self.questions).with_id(self.id)
    }
}

/// Listing entry for the question library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSetSummary {
    pub id: QuestionSetId,
    pub name: String,
    pub question_count: usize,
    pub categories: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Insert payload for a question set that has no id yet.
#[derive(Debug, Clone)]
pub struct NewQuestionSetRecord {
    pub name: String,
    pub questions: Vec<Question>,
    pub uploaded_at: DateTime<Utc>,
}

impl NewQuestionSetRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, questions: Vec<Question>, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            questions,
            uploaded_at,
        }
    }

    #[must_use]
    pub fn from_question_set(set: &QuestionSet, uploaded_at: DateTime<Utc>) -> Self {
        Self::new(set.name(), set.questions().to_vec(), uploaded_at)
    }

    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        distinct_categories(&self.questions)
    }

    #[must_use]
    pub fn into_stored(self, id: QuestionSetId) -> StoredQuestionSet {
        let categories = self.categories();
        StoredQuestionSet {
            id,
            name: self.name,
            questions: self.questions,
            categories,
            uploaded_at: self.uploaded_at,
        }
    }
}

/// Repository contract for the question library.
#[async_trait]
pub trait QuestionSetRepository: Send + Sync {
    /// Store a new question set and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be stored.
    async fn insert_question_set(
        &self,
        record: NewQuestionSetRecord,
    ) -> Result<QuestionSetId, StorageError>;

    /// Fetch a question set by id; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on access or decoding failures.
    async fn get_question_set(
        &self,
        id: QuestionSetId,
    ) -> Result<Option<StoredQuestionSet>, StorageError>;

    /// Summaries of every stored set, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on access or decoding failures.
    async fn list_question_sets(&self) -> Result<Vec<QuestionSetSummary>, StorageError>;

    /// Every stored set including its questions, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on access or decoding failures.
    async fn list_stored_question_sets(&self) -> Result<Vec<StoredQuestionSet>, StorageError>;

    /// Delete a set. Deleting a missing id succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn delete_question_set(&self, id: QuestionSetId) -> Result<(), StorageError>;

    /// Remove every stored set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn clear_question_sets(&self) -> Result<(), StorageError>;
}

/// Repository contract for the single in-progress session snapshot.
#[async_trait]
pub trait SessionSnapshotRepository: Send + Sync {
    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be written.
    async fn save_session(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError>;

    /// Load the stored snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupt` if the stored value cannot be decoded.
    async fn load_session(&self) -> Result<Option<SessionSnapshot>, StorageError>;

    /// Forget the stored snapshot. Clearing when nothing is stored succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn clear_session(&self) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Load persisted settings; `Ok(None)` when none were ever saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on access or decoding failures.
    async fn load_settings(&self) -> Result<Option<Settings>, StorageError>;

    /// Persist settings, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the settings cannot be written.
    async fn save_settings(&self, settings: &Settings) -> Result<(), StorageError>;
}

pub(crate) fn encode_snapshot(snapshot: &SessionSnapshot) -> Result<String, StorageError> {
    serde_json::to_string(snapshot).map_err(|e| StorageError::Corrupt(e.to_string()))
}

pub(crate) fn decode_snapshot(raw: &str) -> Result<SessionSnapshot, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Corrupt(e.to_string()))
}

#[derive(Default)]
struct MemoryState {
    next_id: u64,
    question_sets: BTreeMap<QuestionSetId, StoredQuestionSet>,
    session: Option<String>,
    settings: Option<Settings>,
}

/// In-memory adapter for tests and throwaway runs.
///
/// The session snapshot is kept as serialized JSON, like a key-value store.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored session value with raw text.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the lock is poisoned.
    pub fn store_raw_session(&self, raw: impl Into<String>) -> Result<(), StorageError> {
        self.lock()?.session = Some(raw.into());
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl QuestionSetRepository for InMemoryRepository {
    async fn insert_question_set(
        &self,
        record: NewQuestionSetRecord,
    ) -> Result<QuestionSetId, StorageError> {
        let mut guard = self.lock()?;
        guard.next_id += 1;
        let id = QuestionSetId::new(guard.next_id);
        guard.question_sets.insert(id, record.into_stored(id));
        Ok(id)
    }

    async fn get_question_set(
        &self,
        id: QuestionSetId,
    ) -> Result<Option<StoredQuestionSet>, StorageError> {
        Ok(self.lock()?.question_sets.get(&id).cloned())
    }

    async fn list_question_sets(&self) -> Result<Vec<QuestionSetSummary>, StorageError> {
        Ok(self
            .lock()?
            .question_sets
            .values()
            .map(StoredQuestionSet::summary)
            .collect())
    }

    async fn list_stored_question_sets(&self) -> Result<Vec<StoredQuestionSet>, StorageError> {
        Ok(self.lock()?.question_sets.values().cloned().collect())
    }

    async fn delete_question_set(&self, id: QuestionSetId) -> Result<(), StorageError> {
        self.lock()?.question_sets.remove(&id);
        Ok(())
    }

    async fn clear_question_sets(&self) -> Result<(), StorageError> {
        self.lock()?.question_sets.clear();
        Ok(())
    }
}

#[async_trait]
impl SessionSnapshotRepository for InMemoryRepository {
    async fn save_session(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        let raw = encode_snapshot(snapshot)?;
        self.lock()?.session = Some(raw);
        Ok(())
    }

    async fn load_session(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        let guard = self.lock()?;
        guard.session.as_deref().map(decode_snapshot).transpose()
    }

    async fn clear_session(&self) -> Result<(), StorageError> {
        self.lock()?.session = None;
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for InMemoryRepository {
    async fn load_settings(&self) -> Result<Option<Settings>, StorageError> {
        Ok(self.lock()?.settings)
    }

    async fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        self.lock()?.settings = Some(*settings);
        Ok(())
    }
}

/// The persistence adapter: repositories behind trait objects so the
/// backend can be swapped.
#[derive(Clone)]
pub struct Storage {
    pub question_sets: Arc<dyn QuestionSetRepository>,
    pub sessions: Arc<dyn SessionSnapshotRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Use one repository value for every concern.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: QuestionSetRepository + SessionSnapshotRepository + SettingsRepository + Clone + 'static,
    {
        let question_sets: Arc<dyn QuestionSetRepository> = Arc::new(repo.clone());
        let sessions: Arc<dyn SessionSnapshotRepository> = Arc::new(repo.clone());
        let settings: Arc<dyn SettingsRepository> = Arc::new(repo);
        Self {
            question_sets,
            sessions,
            settings,
        }
    }

    /// Remove every stored question set and the in-progress session.
    /// Settings are kept.
    ///
    /// # Errors
    ///
    /// Returns the first `StorageError` encountered.
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        self.question_sets.clear_question_sets().await?;
        self.sessions.clear_session().await?;
        tracing::info!("cleared question library and session snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuestionId, QuizSession};
    use quiz_core::time::fixed_now;

    fn question(id: u64, category: &str) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            category,
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            0,
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn inserted_sets_get_increasing_ids_and_metadata() {
        let repo = InMemoryRepository::new();
        let first = repo
            .insert_question_set(NewQuestionSetRecord::new(
                "One",
                vec![question(1, "Geo"), question(2, "Art"), question(3, "Geo")],
                fixed_now(),
            ))
            .await
            .unwrap();
        let second = repo
            .insert_question_set(NewQuestionSetRecord::new("Two", vec![question(1, "Art")], fixed_now()))
            .await
            .unwrap();
        assert!(first < second);

        let list = repo.list_question_sets().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].question_count, 3);
        assert_eq!(list[0].categories, vec!["Geo", "Art"]);

        repo.delete_question_set(first).await.unwrap();
        repo.delete_question_set(first).await.unwrap();
        assert!(repo.get_question_set(first).await.unwrap().is_none());
        assert_eq!(repo.list_question_sets().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_session_is_reported() {
        let repo = InMemoryRepository::new();
        repo.store_raw_session("{not json").unwrap();
        let err = repo.load_session().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }

    #[tokio::test]
    async fn clear_all_keeps_settings() {
        let repo = InMemoryRepository::new();
        let storage = Storage::from_repository(repo.clone());

        let questions = vec![question(1, "Geo")];
        storage
            .question_sets
            .insert_question_set(NewQuestionSetRecord::new("One", questions.clone(), fixed_now()))
            .await
            .unwrap();
        let session = QuizSession::start("One", questions.clone(), questions, fixed_now()).unwrap();
        storage
            .sessions
            .save_session(&SessionSnapshot::from_session(&session))
            .await
            .unwrap();
        let settings = Settings {
            dark_mode: true,
            ..Settings::default()
        };
        storage.settings.save_settings(&settings).await.unwrap();

        storage.clear_all().await.unwrap();

        assert!(storage.question_sets.list_question_sets().await.unwrap().is_empty());
        assert!(storage.sessions.load_session().await.unwrap().is_none());
        assert_eq!(storage.settings.load_settings().await.unwrap(), Some(settings));
    }
}
