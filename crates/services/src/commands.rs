//! Explicit command handlers invoked by a front-end.
//!
//! Each user action maps to one method. Confirmation prompts (for example
//! before replacing a running quiz) belong to the caller; the handlers only
//! perform what they are asked.

use quiz_core::model::{QuestionSet, QuestionSetId, SessionStateError, Settings};
use quiz_core::validation::ValidationMode;
use storage::repository::QuestionSetSummary;

use crate::backup_service::BackupService;
use crate::error::{CommandError, SessionError};
use crate::library_service::{FileSummary, LibraryService, LibraryStats};
use crate::sample::sample_quiz;
use crate::sessions::{AdvanceOutcome, SessionEngine, SubmitFeedback};
use crate::settings_service::SettingsService;

pub struct QuizCommands {
    engine: SessionEngine,
    library: LibraryService,
    settings: SettingsService,
    backup: BackupService,
}

impl QuizCommands {
    #[must_use]
    pub fn new(
        engine: SessionEngine,
        library: LibraryService,
        settings: SettingsService,
        backup: BackupService,
    ) -> Self {
        Self {
            engine,
            library,
            settings,
            backup,
        }
    }

    #[must_use]
    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    /// Load stored settings and hand them to the engine.
    pub async fn load_settings(&mut self) -> Settings {
        let settings = self.settings.load().await;
        self.engine.apply_settings(&settings);
        settings
    }

    /// Change settings, persist them and apply them to the engine.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Settings` if the settings cannot be saved.
    pub async fn update_settings(
        &mut self,
        change: impl FnOnce(&mut Settings),
    ) -> Result<Settings, CommandError> {
        let settings = self.settings.update(change).await?;
        self.engine.apply_settings(&settings);
        Ok(settings)
    }

    /// Strictly validate and store a question file, returning its new id and
    /// the counts found in it.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Library` with every validation message.
    pub async fn upload(
        &self,
        name: &str,
        raw: &str,
    ) -> Result<(QuestionSetId, FileSummary), CommandError> {
        Ok(self.library.import_json(name, raw).await?)
    }

    /// # Errors
    ///
    /// Returns `CommandError::Library` if the library cannot be read.
    pub async fn list(&self) -> Result<Vec<QuestionSetSummary>, CommandError> {
        Ok(self.library.list().await?)
    }

    /// # Errors
    ///
    /// Returns `CommandError::Library` if the delete fails.
    pub async fn delete(&self, id: QuestionSetId) -> Result<(), CommandError> {
        Ok(self.library.delete(id).await?)
    }

    pub async fn stats(&self) -> LibraryStats {
        self.library.stats().await
    }

    /// Start a session on the stored set `id`, named after the set.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Library` for an unknown id and
    /// `CommandError::Session` while another session is active.
    pub async fn start_stored(&mut self, id: QuestionSetId) -> Result<(), CommandError> {
        let set = self.library.get(id).await?;
        self.start_set(&set).await
    }

    /// Abort whatever is running and start the stored set `id`.
    ///
    /// The set is loaded first, so an unknown id leaves the running session
    /// alone.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Library` for an unknown id.
    pub async fn switch_quiz(&mut self, id: QuestionSetId) -> Result<(), CommandError> {
        let set = self.library.get(id).await?;
        self.engine.abort().await;
        self.start_set(&set).await
    }

    /// Start the first stored set.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Library` when the library is empty.
    pub async fn start_default(&mut self) -> Result<(), CommandError> {
        let set = self.library.first().await?;
        self.start_set(&set).await
    }

    /// # Errors
    ///
    /// Returns `CommandError::Session` while another session is active.
    pub async fn start_sample(&mut self) -> Result<(), CommandError> {
        let set = sample_quiz()?;
        self.start_set(&set).await
    }

    /// Play a question file once without adding it to the library.
    ///
    /// Returns the counts found in the file.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Library` when the file fails validation under
    /// `mode`.
    pub async fn play_file(
        &mut self,
        name: &str,
        raw: &str,
        mode: ValidationMode,
    ) -> Result<FileSummary, CommandError> {
        let (set, summary) = self.library.load_file(name, raw, mode)?;
        self.start_set(&set).await?;
        Ok(summary)
    }

    async fn start_set(&mut self, set: &QuestionSet) -> Result<(), CommandError> {
        Ok(self.engine.start(set, set.name()).await?)
    }

    /// # Errors
    ///
    /// Returns `CommandError::Session` outside an open question.
    pub fn select(&mut self, index: usize) -> Result<(), CommandError> {
        Ok(self.engine.select_answer(index)?)
    }

    /// # Errors
    ///
    /// Returns `CommandError::Session` without a selection.
    pub async fn submit(&mut self) -> Result<SubmitFeedback, CommandError> {
        Ok(self.engine.submit_answer().await?)
    }

    /// # Errors
    ///
    /// Returns `CommandError::Session` before the answer is submitted.
    pub async fn next(&mut self) -> Result<AdvanceOutcome, CommandError> {
        Ok(self.engine.advance().await?)
    }

    /// # Errors
    ///
    /// Returns `CommandError::Session` when there is nothing to restart.
    pub async fn restart(&mut self) -> Result<(), CommandError> {
        Ok(self.engine.restart().await?)
    }

    /// Leave the current quiz without a result.
    pub async fn new_quiz(&mut self) -> bool {
        self.engine.abort().await
    }

    /// # Errors
    ///
    /// Returns `CommandError::Session` unless the engine is idle.
    pub async fn resume(&mut self) -> Result<bool, CommandError> {
        Ok(self.engine.resume().await?)
    }

    /// # Errors
    ///
    /// Returns `CommandError::Backup` if the library cannot be read.
    pub async fn export(&self) -> Result<String, CommandError> {
        Ok(self.backup.export().await?)
    }

    /// Replace the library with a backup.
    ///
    /// Refused while a session is running, since the running session would
    /// overwrite the restored snapshot on its next save.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Session` while a session is active and
    /// `CommandError::Backup` for a rejected backup.
    pub async fn restore(&mut self, raw: &str) -> Result<usize, CommandError> {
        if self.engine.session().is_some() {
            return Err(SessionError::from(SessionStateError::AlreadyActive).into());
        }
        let restored = self.backup.import(raw).await?;
        self.load_settings().await;
        Ok(restored)
    }

    /// Wipe the library and the saved session, keeping settings.
    ///
    /// Refused while a session is running for the same reason as `restore`.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Session` while a session is active and
    /// `CommandError::Backup` if storage cannot be cleared.
    pub async fn clear_all(&mut self) -> Result<(), CommandError> {
        if self.engine.session().is_some() {
            return Err(SessionError::from(SessionStateError::AlreadyActive).into());
        }
        Ok(self.backup.clear_all().await?)
    }

    /// Messages about persistence failures since the last call.
    pub fn take_storage_warnings(&mut self) -> Vec<String> {
        self.engine.take_storage_warnings()
    }
}
