use std::sync::Arc;

use quiz_core::model::Settings;
use storage::repository::SettingsRepository;

use crate::error::SettingsServiceError;

#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted settings, falling back to defaults when none are
    /// stored or storage cannot be read.
    pub async fn load(&self) -> Settings {
        match self.repo.load_settings().await {
            Ok(settings) => settings.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(%err, "using default settings");
                Settings::default()
            }
        }
    }

    /// Persist `settings`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` if persistence fails.
    pub async fn save(&self, settings: Settings) -> Result<Settings, SettingsServiceError> {
        self.repo.save_settings(&settings).await?;
        tracing::debug!(?settings, "settings saved");
        Ok(settings)
    }

    /// Load, change and persist settings in one step.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` if persistence fails.
    pub async fn update(
        &self,
        change: impl FnOnce(&mut Settings),
    ) -> Result<Settings, SettingsServiceError> {
        let mut settings = self.load().await;
        change(&mut settings);
        self.save(settings).await
    }
}
