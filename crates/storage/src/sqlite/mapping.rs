use quiz_core::model::{Question, QuestionSetId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{QuestionSetSummary, StorageError, StoredQuestionSet};

pub(crate) fn corrupt<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Corrupt(e.to_string())
}

pub(crate) fn unavailable<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Unavailable(e.to_string())
}

pub(crate) fn set_id_to_i64(id: QuestionSetId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Corrupt("question set id overflow".into()))
}

pub(crate) fn set_id_from_i64(v: i64) -> Result<QuestionSetId, StorageError> {
    u64::try_from(v)
        .map(QuestionSetId::new)
        .map_err(|_| StorageError::Corrupt(format!("invalid question set id: {v}")))
}

fn categories_from_row(row: &SqliteRow) -> Result<Vec<String>, StorageError> {
    let raw: String = row.try_get("categories").map_err(corrupt)?;
    serde_json::from_str(&raw).map_err(corrupt)
}

pub(crate) fn map_summary_row(row: &SqliteRow) -> Result<QuestionSetSummary, StorageError> {
    let count: i64 = row.try_get("question_count").map_err(corrupt)?;
    Ok(QuestionSetSummary {
        id: set_id_from_i64(row.try_get("id").map_err(corrupt)?)?,
        name: row.try_get("name").map_err(corrupt)?,
        question_count: usize::try_from(count)
            .map_err(|_| StorageError::Corrupt(format!("invalid question_count: {count}")))?,
        categories: categories_from_row(row)?,
        uploaded_at: row.try_get("uploaded_at").map_err(corrupt)?,
    })
}

pub(crate) fn map_stored_row(row: &SqliteRow) -> Result<StoredQuestionSet, StorageError> {
    let raw_questions: String = row.try_get("questions").map_err(corrupt)?;
    let questions: Vec<Question> = serde_json::from_str(&raw_questions).map_err(corrupt)?;
    Ok(StoredQuestionSet {
        id: set_id_from_i64(row.try_get("id").map_err(corrupt)?)?,
        name: row.try_get("name").map_err(corrupt)?,
        questions,
        categories: categories_from_row(row)?,
        uploaded_at: row.try_get("uploaded_at").map_err(corrupt)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ids_are_corrupt() {
        assert!(matches!(set_id_from_i64(-1), Err(StorageError::Corrupt(_))));
        assert_eq!(set_id_from_i64(9).unwrap(), QuestionSetId::new(9));
    }

    #[test]
    fn oversized_ids_do_not_fit_sqlite() {
        assert!(set_id_to_i64(QuestionSetId::new(u64::MAX)).is_err());
    }
}
