//! Structural checks for uploaded question-set JSON.
//!
//! Two strictness levels exist and callers must pick one:
//!
//! - [`ValidationMode::Strict`] is the canonical check for anything that is
//!   stored: every question needs a non-zero `id`, a `question`, a `category`,
//!   exactly four `options` and a `correct_answer` in `0..=3`.
//! - [`ValidationMode::Lenient`] only needs question text, at least two
//!   options and a `correct_answer` inside the options. It is meant for
//!   playing a file once without saving it.
//!
//! All per-question problems are collected; only a missing or empty
//! `questions` array stops the check early.

use serde_json::{Map, Value};

use crate::model::{Question, QuestionId, QuestionSet};

pub const STRICT_OPTION_COUNT: usize = 4;
pub const LENIENT_MIN_OPTIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Lenient,
    Strict,
}

/// Outcome of validating raw question-set JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    errors: Vec<String>,
    question_count: usize,
    category_count: usize,
}

impl ValidationReport {
    fn structural(message: &str) -> Self {
        Self {
            errors: vec![message.to_owned()],
            question_count: 0,
            category_count: 0,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    #[must_use]
    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    /// Number of entries in `questions`, for display only.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    /// Distinct non-empty categories, for display only.
    #[must_use]
    pub fn category_count(&self) -> usize {
        self.category_count
    }
}

/// Check `raw` against the rules of `mode`, collecting every violation.
#[must_use]
pub fn validate(raw: &Value, mode: ValidationMode) -> ValidationReport {
    let Some(questions) = raw.get("questions").and_then(Value::as_array) else {
        return ValidationReport::structural("JSON must contain a \"questions\" array");
    };
    if questions.is_empty() {
        return ValidationReport::structural("\"questions\" must not be empty");
    }

    let mut errors = Vec::new();
    let mut categories: Vec<&str> = Vec::new();

    for (index, entry) in questions.iter().enumerate() {
        let number = index + 1;
        let Some(question) = entry.as_object() else {
            errors.push(format!("Question {number}: must be an object"));
            continue;
        };

        if let Some(category) = question.get("category").and_then(Value::as_str) {
            if !category.is_empty() && !categories.contains(&category) {
                categories.push(category);
            }
        }

        check_question(number, question, mode, &mut errors);
    }

    ValidationReport {
        errors,
        question_count: questions.len(),
        category_count: categories.len(),
    }
}

fn check_question(
    number: usize,
    question: &Map<String, Value>,
    mode: ValidationMode,
    errors: &mut Vec<String>,
) {
    if mode == ValidationMode::Strict {
        match question.get("id") {
            None | Some(Value::Null) => errors.push(format!("Question {number}: \"id\" is missing")),
            Some(id) if id.as_u64().is_none() => {
                errors.push(format!("Question {number}: \"id\" must be a whole number"));
            }
            Some(id) if id.as_u64() == Some(0) => {
                errors.push(format!("Question {number}: \"id\" must not be zero"));
            }
            Some(_) => {}
        }
    }

    let has_text = question
        .get("question")
        .and_then(Value::as_str)
        .is_some_and(|text| !text.trim().is_empty());
    if !has_text {
        errors.push(format!("Question {number}: \"question\" is missing or empty"));
    }

    if mode == ValidationMode::Strict {
        let has_category = question
            .get("category")
            .and_then(Value::as_str)
            .is_some_and(|c| !c.trim().is_empty());
        if !has_category {
            errors.push(format!("Question {number}: \"category\" is missing"));
        }
    }

    let option_count = match question.get("options").and_then(Value::as_array) {
        None => {
            errors.push(format!("Question {number}: \"options\" must be an array"));
            None
        }
        Some(options) => {
            match mode {
                ValidationMode::Strict if options.len() != STRICT_OPTION_COUNT => {
                    errors.push(format!(
                        "Question {number}: exactly {STRICT_OPTION_COUNT} answer options required (found {})",
                        options.len()
                    ));
                }
                ValidationMode::Lenient if options.len() < LENIENT_MIN_OPTIONS => {
                    errors.push(format!(
                        "Question {number}: at least {LENIENT_MIN_OPTIONS} answer options required (found {})",
                        options.len()
                    ));
                }
                _ => {}
            }
            if let Some(position) = options.iter().position(|o| !o.is_string()) {
                errors.push(format!(
                    "Question {number}: option {} must be text",
                    position + 1
                ));
            }
            Some(options.len())
        }
    };

    match question.get("correct_answer") {
        Some(Value::Number(number_value)) => match number_value.as_f64() {
            Some(value) if value.fract() != 0.0 => {
                errors.push(format!(
                    "Question {number}: \"correct_answer\" must be a whole number"
                ));
            }
            Some(value) => {
                let upper = match mode {
                    ValidationMode::Strict => Some(STRICT_OPTION_COUNT),
                    ValidationMode::Lenient => option_count,
                };
                let in_range = value >= 0.0 && upper.is_none_or(|len| value < len as f64);
                if !in_range {
                    let message = match upper {
                        Some(0) | None => "\"correct_answer\" must not be negative".to_owned(),
                        Some(len) => format!("\"correct_answer\" must be between 0 and {}", len - 1),
                    };
                    errors.push(format!("Question {number}: {message}"));
                }
            }
            None => errors.push(format!("Question {number}: \"correct_answer\" must be a number")),
        },
        _ => errors.push(format!("Question {number}: \"correct_answer\" must be a number")),
    }

    if let Some(explanation) = question.get("explanation") {
        if !explanation.is_null() && !explanation.is_string() {
            errors.push(format!("Question {number}: \"explanation\" must be text"));
        }
    }
}

/// Validate `raw` and, if it passes, build a typed `QuestionSet` named `name`.
///
/// The passing report comes back alongside the set so callers can show its
/// question and category counts.
///
/// In lenient mode a missing or unusable `id` becomes the 1-based position
/// and a missing `category` becomes empty.
///
/// # Errors
///
/// Returns the full `ValidationReport` when any rule of `mode` is violated.
pub fn parse_question_set(
    name: &str,
    raw: &Value,
    mode: ValidationMode,
) -> Result<(QuestionSet, ValidationReport), ValidationReport> {
    let report = validate(raw, mode);
    if !report.is_valid() {
        return Err(report);
    }

    let entries = raw
        .get("questions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut questions = Vec::with_capacity(entries.len());
    let mut errors = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let number = index + 1;
        match build_question(number, entry) {
            Ok(question) => questions.push(question),
            Err(message) => errors.push(format!("Question {number}: {message}")),
        }
    }

    if !errors.is_empty() {
        return Err(ValidationReport {
            errors,
            ..report
        });
    }

    Ok((QuestionSet::new(name, questions), report))
}

fn build_question(number: usize, entry: &Value) -> Result<Question, String> {
    let id = entry
        .get("id")
        .and_then(Value::as_u64)
        .unwrap_or(number as u64);
    let text = entry
        .get("question")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let category = entry
        .get("category")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let options = entry
        .get("options")
        .and_then(Value::as_array)
        .map(|opts| {
            opts.iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let correct = entry
        .get("correct_answer")
        .and_then(Value::as_f64)
        .map_or(usize::MAX, |v| v as usize);
    let explanation = entry
        .get("explanation")
        .and_then(Value::as_str)
        .map(str::to_owned);

    Question::new(
        QuestionId::new(id),
        text,
        category,
        options,
        correct,
        explanation,
    )
    .map_err(|err| err.to_string())
}
