mod ids;
mod question;
mod question_set;
mod result;
mod session;
mod settings;
mod snapshot;

pub use ids::{ParseIdError, QuestionId, QuestionSetId};
pub use question::{Question, QuestionError};
pub use question_set::{QuestionSet, QuestionSetError, distinct_categories};
pub use result::{QuizResult, percentage};
pub use session::{AnsweredRecord, Advance, QuizSession, SessionPhase, SessionStateError};
pub use settings::Settings;
pub use snapshot::{SessionSnapshot, SnapshotError, SnapshotQuiz};
