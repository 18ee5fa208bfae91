use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::AnsweredRecord;

/// Share of correct answers as a whole percentage, rounding halves up.
///
/// Returns 0 when `total` is 0.
#[must_use]
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score);
    let total = u64::from(total);
    let rounded = (200 * score + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Summary produced when a session finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub quiz_name: String,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub answers: Vec<AnsweredRecord>,
}

impl QuizResult {
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.completed_at - self.started_at
    }
}
