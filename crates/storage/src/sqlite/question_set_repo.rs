use async_trait::async_trait;
use quiz_core::model::QuestionSetId;

use super::SqliteRepository;
use super::mapping::{
    corrupt, map_stored_row, map_summary_row, set_id_from_i64, set_id_to_i64, unavailable,
};
use crate::repository::{
    NewQuestionSetRecord, QuestionSetRepository, QuestionSetSummary, StorageError,
    StoredQuestionSet,
};

#[async_trait]
impl QuestionSetRepository for SqliteRepository {
    async fn insert_question_set(
        &self,
        record: NewQuestionSetRecord,
    ) -> Result<QuestionSetId, StorageError> {
        let categories = serde_json::to_string(&record.categories()).map_err(corrupt)?;
        let questions = serde_json::to_string(&record.questions).map_err(corrupt)?;
        let count = i64::try_from(record.questions.len())
            .map_err(|_| StorageError::Corrupt("question count overflow".into()))?;

        let res = sqlx::query(
            r"
            INSERT INTO question_sets (name, questions, categories, question_count, uploaded_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(&record.name)
        .bind(questions)
        .bind(categories)
        .bind(count)
        .bind(record.uploaded_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        set_id_from_i64(res.last_insert_rowid())
    }

    async fn get_question_set(
        &self,
        id: QuestionSetId,
    ) -> Result<Option<StoredQuestionSet>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, questions, categories, uploaded_at
            FROM question_sets WHERE id = ?1
            ",
        )
        .bind(set_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.as_ref().map(map_stored_row).transpose()
    }

    async fn list_question_sets(&self) -> Result<Vec<QuestionSetSummary>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, categories, question_count, uploaded_at
            FROM question_sets
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.iter().map(map_summary_row).collect()
    }

    async fn list_stored_question_sets(&self) -> Result<Vec<StoredQuestionSet>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, questions, categories, uploaded_at
            FROM question_sets
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.iter().map(map_stored_row).collect()
    }

    async fn delete_question_set(&self, id: QuestionSetId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM question_sets WHERE id = ?1")
            .bind(set_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn clear_question_sets(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM question_sets")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}
