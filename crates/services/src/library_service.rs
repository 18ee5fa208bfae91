use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use quiz_core::model::{QuestionSet, QuestionSetId};
use quiz_core::validation::{ValidationMode, ValidationReport, parse_question_set};
use storage::repository::{
    NewQuestionSetRecord, QuestionSetRepository, QuestionSetSummary, StoredQuestionSet,
};

use crate::Clock;
use crate::error::LibraryError;

/// Aggregate numbers about the stored question library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub file_count: usize,
    pub total_questions: usize,
    pub total_categories: usize,
    #[serde(rename = "estimatedSizeKB")]
    pub estimated_size_kb: usize,
}

/// Counts shown for a file that passed validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub question_count: usize,
    pub category_count: usize,
}

impl From<&ValidationReport> for FileSummary {
    fn from(report: &ValidationReport) -> Self {
        Self {
            question_count: report.question_count(),
            category_count: report.category_count(),
        }
    }
}

/// Orchestrates validation and persistence of named question sets.
#[derive(Clone)]
pub struct LibraryService {
    clock: Clock,
    question_sets: Arc<dyn QuestionSetRepository>,
}

impl LibraryService {
    #[must_use]
    pub fn new(clock: Clock, question_sets: Arc<dyn QuestionSetRepository>) -> Self {
        Self {
            clock,
            question_sets,
        }
    }

    /// Parse `raw` as a question file without storing it.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::InvalidInput` with every problem found, including
    /// a single message when `raw` is not JSON at all.
    pub fn load_file(
        &self,
        name: &str,
        raw: &str,
        mode: ValidationMode,
    ) -> Result<(QuestionSet, FileSummary), LibraryError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| LibraryError::InvalidInput(vec![format!("invalid JSON: {err}")]))?;
        parse_question_set(name, &value, mode)
            .map(|(set, report)| (set, FileSummary::from(&report)))
            .map_err(|report| LibraryError::InvalidInput(report.into_errors()))
    }

    /// Strictly validate `raw` and add it to the library under `name`.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::InvalidInput` for a file that fails strict
    /// validation and `LibraryError::Storage` if it cannot be saved.
    pub async fn import_json(
        &self,
        name: &str,
        raw: &str,
    ) -> Result<(QuestionSetId, FileSummary), LibraryError> {
        let (set, summary) = self.load_file(name, raw, ValidationMode::Strict)?;
        let id = self.save(&set).await?;
        Ok((id, summary))
    }

    /// Store an already-typed question set.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::InvalidInput` for an empty set and
    /// `LibraryError::Storage` if persistence fails.
    pub async fn save(&self, set: &QuestionSet) -> Result<QuestionSetId, LibraryError> {
        set.ensure_playable()
            .map_err(|err| LibraryError::InvalidInput(vec![err.to_string()]))?;
        let record = NewQuestionSetRecord::from_question_set(set, self.clock.now());
        let id = self.question_sets.insert_question_set(record).await?;
        tracing::info!(%id, name = set.name(), questions = set.question_count(), "question set saved");
        Ok(id)
    }

    /// Summaries of every stored set, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Storage` if the library cannot be read.
    pub async fn list(&self) -> Result<Vec<QuestionSetSummary>, LibraryError> {
        Ok(self.question_sets.list_question_sets().await?)
    }

    /// Fetch a stored set by id.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::NotFound` when no set has `id`.
    pub async fn get(&self, id: QuestionSetId) -> Result<QuestionSet, LibraryError> {
        self.question_sets
            .get_question_set(id)
            .await?
            .map(StoredQuestionSet::into_question_set)
            .ok_or(LibraryError::NotFound(id))
    }

    /// Remove a stored set. Removing a missing id is not an error.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Storage` if the delete fails.
    pub async fn delete(&self, id: QuestionSetId) -> Result<(), LibraryError> {
        self.question_sets.delete_question_set(id).await?;
        tracing::info!(%id, "question set deleted");
        Ok(())
    }

    /// The set with the lowest id, used for a quick start.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Empty` when nothing is stored.
    pub async fn first(&self) -> Result<QuestionSet, LibraryError> {
        let summaries = self.question_sets.list_question_sets().await?;
        let first = summaries.first().ok_or(LibraryError::Empty)?;
        self.get(first.id).await
    }

    /// Library totals. Storage failures degrade to all zeros.
    pub async fn stats(&self) -> LibraryStats {
        let sets = match self.question_sets.list_stored_question_sets().await {
            Ok(sets) => sets,
            Err(err) => {
                tracing::warn!(%err, "library statistics unavailable");
                return LibraryStats::default();
            }
        };

        let mut categories: Vec<&str> = sets
            .iter()
            .flat_map(|set| set.categories.iter().map(String::as_str))
            .collect();
        categories.sort_unstable();
        categories.dedup();

        let files: Vec<Value> = sets.iter().map(quiz_file_json).collect();
        let bytes = serde_json::to_string(&files).map_or(0, |json| json.len());

        LibraryStats {
            file_count: sets.len(),
            total_questions: sets.iter().map(|set| set.questions.len()).sum(),
            total_categories: categories.len(),
            estimated_size_kb: (bytes + 512) / 1024,
        }
    }
}

/// A stored set in the `quizFiles` backup shape.
pub(crate) fn quiz_file_json(set: &StoredQuestionSet) -> Value {
    serde_json::json!({
        "id": set.id,
        "name": set.name,
        "questions": set.questions,
        "uploadDate": set.uploaded_at,
        "questionCount": set.questions.len(),
        "categories": set.categories,
    })
}
