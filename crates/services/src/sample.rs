//! The quiz bundled with the binary, playable without uploading anything.

use serde_json::Value;

use quiz_core::model::QuestionSet;
use quiz_core::validation::{ValidationMode, parse_question_set};

use crate::error::LibraryError;

pub const SAMPLE_QUIZ_NAME: &str = "Sample Quiz";

const SAMPLE_QUIZ_JSON: &str = include_str!("../assets/sample_quiz.json");

/// Parse the bundled sample quiz with strict validation.
///
/// # Errors
///
/// Returns `LibraryError::InvalidInput` if the bundled file is broken.
pub fn sample_quiz() -> Result<QuestionSet, LibraryError> {
    let raw: Value = serde_json::from_str(SAMPLE_QUIZ_JSON)
        .map_err(|err| LibraryError::InvalidInput(vec![format!("invalid JSON: {err}")]))?;
    parse_question_set(SAMPLE_QUIZ_NAME, &raw, ValidationMode::Strict)
        .map(|(set, _)| set)
        .map_err(|report| LibraryError::InvalidInput(report.into_errors()))
}
