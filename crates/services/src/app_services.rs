use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::backup_service::BackupService;
use crate::commands::QuizCommands;
use crate::display::DisplaySurface;
use crate::error::AppServicesError;
use crate::library_service::LibraryService;
use crate::sessions::SessionEngine;
use crate::settings_service::SettingsService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    storage: Storage,
    library: Arc<LibraryService>,
    settings: Arc<SettingsService>,
    backup: Arc<BackupService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock))
    }

    /// Build services over volatile in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock) -> Self {
        let library = Arc::new(LibraryService::new(
            clock,
            Arc::clone(&storage.question_sets),
        ));
        let settings = Arc::new(SettingsService::new(Arc::clone(&storage.settings)));
        let backup = Arc::new(BackupService::new(clock, storage.clone()));
        Self {
            clock,
            storage,
            library,
            settings,
            backup,
        }
    }

    /// A fresh, idle session engine rendering to `display`.
    #[must_use]
    pub fn session_engine(&self, display: Arc<dyn DisplaySurface>) -> SessionEngine {
        SessionEngine::new(self.clock, Arc::clone(&self.storage.sessions), display)
    }

    /// Command handlers around a fresh engine, with stored settings applied.
    pub async fn commands(&self, display: Arc<dyn DisplaySurface>) -> QuizCommands {
        let mut commands = QuizCommands::new(
            self.session_engine(display),
            (*self.library).clone(),
            (*self.settings).clone(),
            (*self.backup).clone(),
        );
        commands.load_settings().await;
        commands
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings)
    }
}
