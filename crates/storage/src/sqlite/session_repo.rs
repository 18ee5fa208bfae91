use async_trait::async_trait;
use quiz_core::model::SessionSnapshot;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{corrupt, unavailable};
use crate::repository::{SessionSnapshotRepository, StorageError, decode_snapshot, encode_snapshot};

#[async_trait]
impl SessionSnapshotRepository for SqliteRepository {
    async fn save_session(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        let raw = encode_snapshot(snapshot)?;
        sqlx::query(
            r"
            INSERT INTO session_snapshot (id, snapshot)
            VALUES (1, ?1)
            ON CONFLICT(id) DO UPDATE SET snapshot = excluded.snapshot
            ",
        )
        .bind(raw)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(())
    }

    async fn load_session(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        let row = sqlx::query("SELECT snapshot FROM session_snapshot WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("snapshot").map_err(corrupt)?;
        decode_snapshot(&raw).map(Some)
    }

    async fn clear_session(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_snapshot WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}
