use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyText,

    #[error("at least 2 answer options required (found {count})")]
    TooFewOptions { count: usize },

    #[error("correct answer {index} is outside the {options} available options")]
    CorrectAnswerOutOfRange { index: usize, options: usize },

    #[error("option permutation does not match the {options} available options")]
    InvalidPermutation { options: usize },
}

/// A single multiple-choice question.
///
/// `correct_answer` is always a valid index into `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord")]
pub struct Question {
    id: QuestionId,
    question: String,
    category: String,
    options: Vec<String>,
    correct_answer: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
}

/// Wire shape accepted when deserializing; checked by `TryFrom`.
#[derive(Deserialize)]
struct QuestionRecord {
    id: QuestionId,
    question: String,
    #[serde(default)]
    category: String,
    options: Vec<String>,
    correct_answer: usize,
    #[serde(default)]
    explanation: Option<String>,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuestionError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        Question::new(
            record.id,
            record.question,
            record.category,
            record.options,
            record.correct_answer,
            record.explanation,
        )
    }
}

impl Question {
    /// Build a question, checking text, option count and answer index.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, fewer than two options are
    /// given, or `correct_answer` does not index into `options`.
    pub fn new(
        id: QuestionId,
        question: impl Into<String>,
        category: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                count: options.len(),
            });
        }
        if correct_answer >= options.len() {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                index: correct_answer,
                options: options.len(),
            });
        }

        Ok(Self {
            id,
            question,
            category: category.into(),
            options,
            correct_answer,
            explanation: explanation.filter(|text| !text.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_answer
    }

    /// Reorder the options so that new position `i` holds old option `order[i]`.
    ///
    /// The correct answer follows its option to the new position.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidPermutation` unless `order` is a
    /// permutation of `0..options.len()`.
    pub fn permute_options(&mut self, order: &[usize]) -> Result<(), QuestionError> {
        let len = self.options.len();
        let mut seen = vec![false; len];
        for &idx in order {
            if idx >= len || seen[idx] {
                return Err(QuestionError::InvalidPermutation { options: len });
            }
            seen[idx] = true;
        }
        if order.len() != len {
            return Err(QuestionError::InvalidPermutation { options: len });
        }

        let reordered = order.iter().map(|&idx| self.options[idx].clone()).collect();
        let correct = order
            .iter()
            .position(|&idx| idx == self.correct_answer)
            .ok_or(QuestionError::InvalidPermutation { options: len })?;

        self.options = reordered;
        self.correct_answer = correct;
        Ok(())
    }
}
