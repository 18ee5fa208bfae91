use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::session::count_correct;
use crate::model::{AnsweredRecord, Question, QuizSession};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("snapshot has no questions")]
    NoQuestions,

    #[error("snapshot index {index} is past the last of {total} questions")]
    IndexOutOfRange { index: usize, total: usize },

    #[error("snapshot has {answers} answers for question index {index}")]
    AnswerCountMismatch { answers: usize, index: usize },

    #[error("snapshot score {score} does not match {correct} correct answers")]
    ScoreMismatch { score: u32, correct: u32 },

    #[error("answer {position} refers to a different question")]
    QuestionMismatch { position: usize },
}

/// The quiz being played, as stored inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotQuiz {
    pub name: String,
    pub questions: Vec<Question>,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
}

/// Durable form of an in-progress session.
///
/// Serialized as
/// `{quiz: {name, questions, startTime}, currentQuestionIndex, score, userAnswers, startTime, questions}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub quiz: SnapshotQuiz,
    #[serde(default)]
    pub current_question_index: usize,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub user_answers: Vec<AnsweredRecord>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    pub questions: Vec<Question>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Self {
        Self {
            quiz: SnapshotQuiz {
                name: session.name().to_owned(),
                questions: session.source_questions().to_vec(),
                start_time: session.started_at(),
            },
            current_question_index: session.current_index(),
            score: session.score(),
            user_answers: session.answers().to_vec(),
            start_time: session.started_at(),
            questions: session.questions().to_vec(),
        }
    }

    /// Check structure and rebuild the session exactly as it was saved.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` when the snapshot could not have come from a
    /// live session (index past the end, answer count not matching the index,
    /// score disagreeing with the answers, or answers for other questions).
    pub fn into_session(self) -> Result<QuizSession, SnapshotError> {
        let total = self.questions.len();
        if total == 0 {
            return Err(SnapshotError::NoQuestions);
        }
        let index = self.current_question_index;
        if index >= total {
            return Err(SnapshotError::IndexOutOfRange { index, total });
        }
        let answers = self.user_answers.len();
        if answers != index && answers != index + 1 {
            return Err(SnapshotError::AnswerCountMismatch { answers, index });
        }
        let correct = count_correct(&self.user_answers);
        if correct != self.score {
            return Err(SnapshotError::ScoreMismatch {
                score: self.score,
                correct,
            });
        }
        for (position, (answer, question)) in
            self.user_answers.iter().zip(&self.questions).enumerate()
        {
            if answer.question_id != question.id() {
                return Err(SnapshotError::QuestionMismatch { position });
            }
        }

        let source = if self.quiz.questions.is_empty() {
            self.questions.clone()
        } else {
            self.quiz.questions
        };

        Ok(QuizSession::restore(
            self.quiz.name,
            source,
            self.questions,
            index,
            self.user_answers,
            self.start_time,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionId, SessionPhase};
    use crate::time::fixed_now;

    fn session() -> QuizSession {
        let questions: Vec<Question> = (1..=3)
            .map(|id| {
                Question::new(
                    QuestionId::new(id),
                    format!("Q{id}"),
                    "Cat",
                    vec!["w".into(), "x".into(), "y".into(), "z".into()],
                    1,
                    None,
                )
                .unwrap()
            })
            .collect();
        QuizSession::start("Snap", questions.clone(), questions, fixed_now()).unwrap()
    }

    #[test]
    fn snapshot_uses_documented_keys() {
        let json = serde_json::to_value(SessionSnapshot::from_session(&session())).unwrap();
        for key in [
            "quiz",
            "currentQuestionIndex",
            "score",
            "userAnswers",
            "startTime",
            "questions",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json["quiz"].get("startTime").is_some());
        assert_eq!(json["startTime"], fixed_now().timestamp_millis());
    }

    #[test]
    fn round_trip_after_one_answer_keeps_progress() {
        let mut live = session();
        live.select_answer(1).unwrap();
        live.submit(500).unwrap();

        let raw = serde_json::to_string(&SessionSnapshot::from_session(&live)).unwrap();
        let restored = serde_json::from_str::<SessionSnapshot>(&raw)
            .unwrap()
            .into_session()
            .unwrap();

        assert_eq!(restored.current_index(), live.current_index());
        assert_eq!(restored.score(), live.score());
        assert_eq!(restored.answers(), live.answers());
        assert_eq!(restored.phase(), SessionPhase::Answered);
    }

    #[test]
    fn tampered_score_is_rejected() {
        let mut snapshot = SessionSnapshot::from_session(&session());
        snapshot.score = 2;
        assert_eq!(
            snapshot.into_session().unwrap_err(),
            SnapshotError::ScoreMismatch {
                score: 2,
                correct: 0
            }
        );
    }

    #[test]
    fn finished_index_is_not_resumable() {
        let mut snapshot = SessionSnapshot::from_session(&session());
        snapshot.current_question_index = 3;
        assert!(matches!(
            snapshot.into_session(),
            Err(SnapshotError::IndexOutOfRange { index: 3, total: 3 })
        ));
    }
}
