use quiz_core::model::{AnsweredRecord, QuizResult};

/// Externally visible lifecycle state of the session engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session has been started, or the last one was aborted.
    Idle,
    /// Active, current question open for an answer.
    InProgress,
    /// Active, current question locked.
    Answered,
    /// Terminal; a result is available.
    Finished,
}

/// What the caller learns after submitting an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFeedback {
    pub record: AnsweredRecord,
    pub score: u32,
    /// Present only when explanations are enabled and the question has one.
    pub explanation: Option<String>,
    /// True when advancing will finish the quiz.
    pub is_last: bool,
}

/// Result of moving past an answered question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Question { index: usize },
    Finished(QuizResult),
}
