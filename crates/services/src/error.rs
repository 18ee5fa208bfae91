//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuestionSetId, SessionStateError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `SessionEngine`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// The question set cannot be played; the session was not touched.
    #[error("invalid question set: {}", .0.join("; "))]
    InvalidInput(Vec<String>),
    /// The operation is not allowed in the current session state.
    #[error(transparent)]
    IllegalState(#[from] SessionStateError),
}

impl SessionError {
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            SessionError::InvalidInput(messages) => messages.clone(),
            SessionError::IllegalState(err) => vec![err.to_string()],
        }
    }
}

/// Errors emitted by `LibraryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LibraryError {
    #[error("invalid question file: {}", .0.join("; "))]
    InvalidInput(Vec<String>),
    #[error("question set {0} not found")]
    NotFound(QuestionSetId),
    #[error("no question sets stored yet")]
    Empty,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl LibraryError {
    /// Human-readable messages, one per problem.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            LibraryError::InvalidInput(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// Errors emitted by `BackupService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackupError {
    #[error("invalid backup format")]
    InvalidFormat,
    #[error("backup is not valid JSON: {0}")]
    Parse(String),
    #[error("backup contains invalid question sets: {}", .0.join("; "))]
    InvalidQuestionSets(Vec<String>),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizCommands`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CommandError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error(transparent)]
    Settings(#[from] SettingsServiceError),
    #[error(transparent)]
    Backup(#[from] BackupError),
}

impl CommandError {
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            CommandError::Session(err) => err.messages(),
            CommandError::Library(err) => err.messages(),
            CommandError::Backup(BackupError::InvalidQuestionSets(messages)) => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
