use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Question, QuestionSetId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionSetError {
    #[error("question set has no questions")]
    Empty,
}

/// A named collection of questions that can drive one quiz session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<QuestionSetId>,
    #[serde(default)]
    name: String,
    questions: Vec<Question>,
}

impl QuestionSet {
    #[must_use]
    pub fn new(name: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            id: None,
            name: name.into(),
            questions,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: QuestionSetId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<QuestionSetId> {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Distinct non-empty categories, in order of first appearance.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        distinct_categories(&self.questions)
    }

    /// Fails with `QuestionSetError::Empty` when there is nothing to quiz on.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSetError::Empty` if the set has no questions.
    pub fn ensure_playable(&self) -> Result<(), QuestionSetError> {
        if self.questions.is_empty() {
            return Err(QuestionSetError::Empty);
        }
        Ok(())
    }
}

/// Distinct non-empty categories of `questions`, in order of first appearance.
#[must_use]
pub fn distinct_categories(questions: &[Question]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for question in questions {
        let category = question.category();
        if !category.is_empty() && !out.iter().any(|c| c == category) {
            out.push(category.to_owned());
        }
    }
    out
}
