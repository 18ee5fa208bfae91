use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Question, QuestionId, QuestionSetError, QuizResult, percentage};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("no quiz session is active")]
    NotStarted,

    #[error("a quiz session is already in progress")]
    AlreadyActive,

    #[error("no answer has been selected")]
    NoSelection,

    #[error("the current question has already been answered")]
    AlreadyAnswered,

    #[error("the current question has not been answered yet")]
    NotAnswered,

    #[error("option {index} does not exist (question has {options} options)")]
    OptionOutOfRange { index: usize, options: usize },

    #[error("the quiz is already finished")]
    Finished,
}

/// Immutable record of one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredRecord {
    #[serde(rename = "questionId")]
    pub question_id: QuestionId,
    #[serde(rename = "questionText", default)]
    pub question_text: String,
    #[serde(rename = "selectedAnswer")]
    pub selected_index: usize,
    #[serde(rename = "correctAnswer")]
    pub correct_index: usize,
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
    /// Milliseconds since the session started.
    #[serde(rename = "timeSpent", default)]
    pub elapsed_ms: u64,
}

/// Where an active session stands on its current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    InProgress,
    Answered,
    Complete,
}

/// Outcome of moving past an answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    Complete,
}

/// Live quiz-taking state for one attempt at a question set.
///
/// `source` is the question list as handed in (used for restarts), while
/// `questions` is the private, possibly reordered copy being played.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    name: String,
    source: Vec<Question>,
    questions: Vec<Question>,
    current_index: usize,
    score: u32,
    answers: Vec<AnsweredRecord>,
    selected_answer: Option<usize>,
    has_answered: bool,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Begin a session on `questions` (already arranged by the caller).
    ///
    /// # Errors
    ///
    /// Returns `QuestionSetError::Empty` if there are no questions to play.
    pub fn start(
        name: impl Into<String>,
        source: Vec<Question>,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, QuestionSetError> {
        if questions.is_empty() {
            return Err(QuestionSetError::Empty);
        }
        Ok(Self {
            name: name.into(),
            source,
            questions,
            current_index: 0,
            score: 0,
            answers: Vec::new(),
            selected_answer: None,
            has_answered: false,
            started_at,
        })
    }

    /// Rebuild a session from already-checked parts.
    pub(crate) fn restore(
        name: String,
        source: Vec<Question>,
        questions: Vec<Question>,
        current_index: usize,
        answers: Vec<AnsweredRecord>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let score = count_correct(&answers);
        let has_answered = answers.len() == current_index + 1;
        let selected_answer = if has_answered {
            answers.last().map(|a| a.selected_index)
        } else {
            None
        };
        Self {
            name,
            source,
            questions,
            current_index,
            score,
            answers,
            selected_answer,
            has_answered,
            started_at,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn source_questions(&self) -> &[Question] {
        &self.source
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn answers(&self) -> &[AnsweredRecord] {
        &self.answers
    }

    #[must_use]
    pub fn selected_answer(&self) -> Option<usize> {
        self.selected_answer
    }

    #[must_use]
    pub fn has_answered(&self) -> bool {
        self.has_answered
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.current_index >= self.questions.len() {
            SessionPhase::Complete
        } else if self.has_answered {
            SessionPhase::Answered
        } else {
            SessionPhase::InProgress
        }
    }

    /// Fraction of questions already moved past, in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = self.current_index as f64 / self.questions.len() as f64;
        fraction.min(1.0)
    }

    /// Mark `index` as the chosen option for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::AlreadyAnswered` once the answer is locked,
    /// `SessionStateError::Finished` after the last question, and
    /// `SessionStateError::OptionOutOfRange` for an index past the options.
    pub fn select_answer(&mut self, index: usize) -> Result<(), SessionStateError> {
        let options = match self.phase() {
            SessionPhase::Complete => return Err(SessionStateError::Finished),
            SessionPhase::Answered => return Err(SessionStateError::AlreadyAnswered),
            SessionPhase::InProgress => self
                .current_question()
                .map_or(0, |question| question.options().len()),
        };
        if index >= options {
            return Err(SessionStateError::OptionOutOfRange { index, options });
        }
        self.selected_answer = Some(index);
        Ok(())
    }

    /// Lock the selected answer, score it and append the record.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::NoSelection` if nothing is selected,
    /// `SessionStateError::AlreadyAnswered` on re-submission and
    /// `SessionStateError::Finished` after the last question.
    pub fn submit(&mut self, elapsed_ms: u64) -> Result<&AnsweredRecord, SessionStateError> {
        match self.phase() {
            SessionPhase::Complete => return Err(SessionStateError::Finished),
            SessionPhase::Answered => return Err(SessionStateError::AlreadyAnswered),
            SessionPhase::InProgress => {}
        }
        let selected = self.selected_answer.ok_or(SessionStateError::NoSelection)?;
        let question = self
            .questions
            .get(self.current_index)
            .ok_or(SessionStateError::Finished)?;

        let is_correct = question.is_correct(selected);
        self.answers.push(AnsweredRecord {
            question_id: question.id(),
            question_text: question.text().to_owned(),
            selected_index: selected,
            correct_index: question.correct_answer(),
            is_correct,
            elapsed_ms,
        });
        if is_correct {
            self.score = self.score.saturating_add(1);
        }
        self.has_answered = true;

        self.answers.last().ok_or(SessionStateError::NotAnswered)
    }

    /// Move past the answered question.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::NotAnswered` if the current question is
    /// still open and `SessionStateError::Finished` if already complete.
    pub fn advance(&mut self) -> Result<Advance, SessionStateError> {
        match self.phase() {
            SessionPhase::Complete => return Err(SessionStateError::Finished),
            SessionPhase::InProgress => return Err(SessionStateError::NotAnswered),
            SessionPhase::Answered => {}
        }

        self.current_index += 1;
        self.selected_answer = None;
        self.has_answered = false;

        if self.current_index < self.questions.len() {
            Ok(Advance::Next {
                index: self.current_index,
            })
        } else {
            Ok(Advance::Complete)
        }
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        percentage(self.score, total_u32(self.questions.len()))
    }

    /// Summarize the attempt as of `completed_at`.
    #[must_use]
    pub fn result(&self, completed_at: DateTime<Utc>) -> QuizResult {
        QuizResult {
            quiz_name: self.name.clone(),
            score: self.score,
            total_questions: total_u32(self.questions.len()),
            percentage: self.percentage(),
            started_at: self.started_at,
            completed_at,
            answers: self.answers.clone(),
        }
    }
}

pub(crate) fn count_correct(answers: &[AnsweredRecord]) -> u32 {
    let correct = answers.iter().filter(|a| a.is_correct).count();
    u32::try_from(correct).unwrap_or(u32::MAX)
}

fn total_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionId;
    use crate::time::fixed_now;

    fn question(id: u64, correct: usize) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Question {id}"),
            "General",
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct,
            None,
        )
        .unwrap()
    }

    fn two_question_session() -> QuizSession {
        let questions = vec![question(1, 0), question(2, 2)];
        QuizSession::start("Pair", questions.clone(), questions, fixed_now()).unwrap()
    }

    #[test]
    fn start_requires_questions() {
        let err = QuizSession::start("Empty", Vec::new(), Vec::new(), fixed_now()).unwrap_err();
        assert_eq!(err, QuestionSetError::Empty);
    }

    #[test]
    fn submit_without_selection_leaves_answers_untouched() {
        let mut session = two_question_session();
        assert_eq!(session.submit(0), Err(SessionStateError::NoSelection));
        assert!(session.answers().is_empty());
        assert_eq!(session.phase(), SessionPhase::InProgress);
    }

    #[test]
    fn selecting_out_of_range_is_rejected() {
        let mut session = two_question_session();
        assert_eq!(
            session.select_answer(4),
            Err(SessionStateError::OptionOutOfRange {
                index: 4,
                options: 4
            })
        );
        assert_eq!(session.selected_answer(), None);
    }

    #[test]
    fn answers_track_index_and_score() {
        let mut session = two_question_session();

        session.select_answer(0).unwrap();
        let record = session.submit(1_000).unwrap().clone();
        assert!(record.is_correct);
        assert_eq!(record.elapsed_ms, 1_000);
        assert_eq!(session.answers().len(), session.current_index() + 1);
        assert_eq!(session.phase(), SessionPhase::Answered);

        assert_eq!(session.select_answer(1), Err(SessionStateError::AlreadyAnswered));
        assert_eq!(
            session.submit(1_200).unwrap_err(),
            SessionStateError::AlreadyAnswered
        );

        assert_eq!(session.advance(), Ok(Advance::Next { index: 1 }));
        assert_eq!(session.selected_answer(), None);
        assert_eq!(session.answers().len(), session.current_index());

        session.select_answer(1).unwrap();
        assert!(!session.submit(2_000).unwrap().is_correct);
        assert_eq!(session.score(), 1);

        assert_eq!(session.advance(), Ok(Advance::Complete));
        assert_eq!(session.phase(), SessionPhase::Complete);
        assert_eq!(session.percentage(), 50);
        assert!((session.progress() - 1.0).abs() < f64::EPSILON);
        assert_eq!(session.select_answer(0), Err(SessionStateError::Finished));
    }

    #[test]
    fn advance_requires_an_answer() {
        let mut session = two_question_session();
        assert_eq!(session.advance(), Err(SessionStateError::NotAnswered));
    }

    #[test]
    fn restore_rederives_answered_flag() {
        let mut session = two_question_session();
        session.select_answer(0).unwrap();
        session.submit(10).unwrap();

        let restored = QuizSession::restore(
            session.name().to_owned(),
            session.source_questions().to_vec(),
            session.questions().to_vec(),
            session.current_index(),
            session.answers().to_vec(),
            session.started_at(),
        );
        assert!(restored.has_answered());
        assert_eq!(restored.score(), 1);
        assert_eq!(restored.selected_answer(), Some(0));
        assert_eq!(restored.phase(), SessionPhase::Answered);
    }

    #[test]
    fn result_reports_totals() {
        let mut session = two_question_session();
        session.select_answer(0).unwrap();
        session.submit(0).unwrap();
        session.advance().unwrap();
        session.select_answer(2).unwrap();
        session.submit(0).unwrap();
        session.advance().unwrap();

        let result = session.result(fixed_now() + chrono::Duration::seconds(30));
        assert_eq!(result.score, 2);
        assert_eq!(result.total_questions, 2);
        assert_eq!(result.percentage, 100);
        assert_eq!(result.elapsed(), chrono::Duration::seconds(30));
        assert_eq!(result.answers.len(), 2);
    }
}
