//! Whole-library backup as a single JSON document.

use serde_json::{Value, json};

use quiz_core::model::{SessionSnapshot, Settings};
use quiz_core::validation::{ValidationMode, parse_question_set};
use storage::repository::{NewQuestionSetRecord, Storage, StorageError};

use crate::Clock;
use crate::error::BackupError;
use crate::library_service::quiz_file_json;

pub const BACKUP_VERSION: &str = "1.0.0";

/// Exports and restores every question set, the settings and the saved session.
#[derive(Clone)]
pub struct BackupService {
    clock: Clock,
    storage: Storage,
}

impl BackupService {
    #[must_use]
    pub fn new(clock: Clock, storage: Storage) -> Self {
        Self { clock, storage }
    }

    /// Serialize the library as pretty-printed JSON.
    ///
    /// An unreadable session snapshot is exported as `null`.
    ///
    /// # Errors
    ///
    /// Returns `BackupError::Storage` if question sets or settings cannot be read.
    pub async fn export(&self) -> Result<String, BackupError> {
        let sets = self.storage.question_sets.list_stored_question_sets().await?;
        let settings = self
            .storage
            .settings
            .load_settings()
            .await?
            .unwrap_or_default();
        let current = match self.storage.sessions.load_session().await {
            Ok(snapshot) => snapshot,
            Err(StorageError::Corrupt(reason)) => {
                tracing::warn!(%reason, "leaving unreadable session out of backup");
                None
            }
            Err(err) => return Err(err.into()),
        };

        let document = json!({
            "exportDate": self.clock.now(),
            "version": BACKUP_VERSION,
            "quizFiles": sets.iter().map(quiz_file_json).collect::<Vec<_>>(),
            "settings": settings,
            "currentQuiz": current,
        });
        tracing::info!(files = sets.len(), "library exported");
        serde_json::to_string_pretty(&document).map_err(|err| BackupError::Parse(err.to_string()))
    }

    /// Remove every question set and the saved session. Settings are kept.
    ///
    /// # Errors
    ///
    /// Returns `BackupError::Storage` if clearing fails.
    pub async fn clear_all(&self) -> Result<(), BackupError> {
        self.storage.clear_all().await?;
        Ok(())
    }

    /// Replace the whole library with the contents of a backup.
    ///
    /// Every quiz file is validated strictly before anything is cleared, so a
    /// rejected backup leaves storage untouched. Writes are not atomic: a
    /// storage failure after the clear leaves the library partly restored.
    /// Settings and the saved session
    /// are restored when present; a session that does not hold together is
    /// skipped. Returns the number of restored quiz files.
    ///
    /// # Errors
    ///
    /// Returns `BackupError::Parse` for non-JSON input,
    /// `BackupError::InvalidFormat` without a `quizFiles` array,
    /// `BackupError::InvalidQuestionSets` listing every problem, and
    /// `BackupError::Storage` if writing fails.
    pub async fn import(&self, raw: &str) -> Result<usize, BackupError> {
        let document: Value =
            serde_json::from_str(raw).map_err(|err| BackupError::Parse(err.to_string()))?;
        let files = document
            .get("quizFiles")
            .and_then(Value::as_array)
            .ok_or(BackupError::InvalidFormat)?;

        let mut sets = Vec::with_capacity(files.len());
        let mut errors = Vec::new();
        for (index, file) in files.iter().enumerate() {
            let name = file
                .get("name")
                .and_then(Value::as_str)
                .map_or_else(|| format!("Quiz file {}", index + 1), str::to_owned);
            let questions = json!({ "questions": file.get("questions").cloned().unwrap_or(Value::Null) });
            match parse_question_set(&name, &questions, ValidationMode::Strict) {
                Ok((set, _)) => sets.push(set),
                Err(report) => errors.extend(
                    report
                        .into_errors()
                        .into_iter()
                        .map(|message| format!("{name}: {message}")),
                ),
            }
        }
        if !errors.is_empty() {
            return Err(BackupError::InvalidQuestionSets(errors));
        }

        let settings = document
            .get("settings")
            .filter(|value| !value.is_null())
            .and_then(|value| match serde_json::from_value::<Settings>(value.clone()) {
                Ok(settings) => Some(settings),
                Err(err) => {
                    tracing::warn!(%err, "ignoring unreadable settings in backup");
                    None
                }
            });
        let snapshot = document
            .get("currentQuiz")
            .filter(|value| !value.is_null())
            .and_then(|value| restorable_snapshot(value.clone()));

        self.storage.clear_all().await?;
        let now = self.clock.now();
        for set in &sets {
            self.storage
                .question_sets
                .insert_question_set(NewQuestionSetRecord::from_question_set(set, now))
                .await?;
        }
        if let Some(settings) = settings {
            self.storage.settings.save_settings(&settings).await?;
        }
        if let Some(snapshot) = snapshot {
            self.storage.sessions.save_session(&snapshot).await?;
        }

        tracing::info!(files = sets.len(), "library restored from backup");
        Ok(sets.len())
    }
}

fn restorable_snapshot(value: Value) -> Option<SessionSnapshot> {
    let snapshot = match serde_json::from_value::<SessionSnapshot>(value) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::warn!(%err, "ignoring unreadable session in backup");
            return None;
        }
    };
    match snapshot.clone().into_session() {
        Ok(_) => Some(snapshot),
        Err(err) => {
            tracing::warn!(%err, "ignoring malformed session in backup");
            None
        }
    }
}
