use async_trait::async_trait;
use quiz_core::model::Settings;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{corrupt, unavailable};
use crate::repository::{SettingsRepository, StorageError};

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn load_settings(&self) -> Result<Option<Settings>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT show_explanations, randomize_questions, randomize_options, dark_mode
            FROM settings
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Settings {
            show_explanations: row.try_get("show_explanations").map_err(corrupt)?,
            randomize_questions: row.try_get("randomize_questions").map_err(corrupt)?,
            randomize_options: row.try_get("randomize_options").map_err(corrupt)?,
            dark_mode: row.try_get("dark_mode").map_err(corrupt)?,
        }))
    }

    async fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO settings (
                id,
                show_explanations,
                randomize_questions,
                randomize_options,
                dark_mode
            )
            VALUES (1, ?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                show_explanations = excluded.show_explanations,
                randomize_questions = excluded.randomize_questions,
                randomize_options = excluded.randomize_options,
                dark_mode = excluded.dark_mode
            ",
        )
        .bind(settings.show_explanations)
        .bind(settings.randomize_questions)
        .bind(settings.randomize_options)
        .bind(settings.dark_mode)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }
}
