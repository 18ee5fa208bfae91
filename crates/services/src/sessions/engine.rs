use std::fmt;
use std::sync::Arc;

use quiz_core::model::{
    Advance, Question, QuestionSet, QuizResult, QuizSession, SessionPhase, SessionSnapshot,
    SessionStateError, Settings,
};
use storage::repository::{SessionSnapshotRepository, StorageError};

use super::progress::SessionProgress;
use super::state::{AdvanceOutcome, SessionState, SubmitFeedback};
use crate::Clock;
use crate::display::DisplaySurface;
use crate::error::SessionError;
use crate::ordering::{KeepOrder, QuestionOrder, ordering_for};

enum EngineState {
    Idle,
    Active(QuizSession),
    Finished { quiz: QuestionSet, result: QuizResult },
}

/// Owns the quiz lifecycle: start, answer, advance, finish, restart, abort
/// and resume.
///
/// Every operation updates in-memory state first and only then talks to
/// storage. Storage failures never undo or block a transition; they are
/// logged and queued for `take_storage_warnings`.
pub struct SessionEngine {
    clock: Clock,
    sessions: Arc<dyn SessionSnapshotRepository>,
    display: Arc<dyn DisplaySurface>,
    ordering: Arc<dyn QuestionOrder>,
    show_explanations: bool,
    state: EngineState,
    storage_warnings: Vec<String>,
}

impl SessionEngine {
    #[must_use]
    pub fn new(
        clock: Clock,
        sessions: Arc<dyn SessionSnapshotRepository>,
        display: Arc<dyn DisplaySurface>,
    ) -> Self {
        Self {
            clock,
            sessions,
            display,
            ordering: Arc::new(KeepOrder),
            show_explanations: Settings::default().show_explanations,
            state: EngineState::Idle,
            storage_warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_ordering(mut self, ordering: Arc<dyn QuestionOrder>) -> Self {
        self.ordering = ordering;
        self
    }

    #[must_use]
    pub fn with_show_explanations(mut self, show: bool) -> Self {
        self.show_explanations = show;
        self
    }

    /// Take explanation and ordering preferences from `settings`.
    ///
    /// Ordering only affects sessions started afterwards.
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.show_explanations = settings.show_explanations;
        self.ordering = ordering_for(settings);
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        match &self.state {
            EngineState::Idle => SessionState::Idle,
            EngineState::Active(session) => match session.phase() {
                SessionPhase::InProgress => SessionState::InProgress,
                SessionPhase::Answered => SessionState::Answered,
                SessionPhase::Complete => SessionState::Finished,
            },
            EngineState::Finished { .. } => SessionState::Finished,
        }
    }

    /// The active session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        match &self.state {
            EngineState::Active(session) => Some(session),
            _ => None,
        }
    }

    /// The result of the last finished session, until another one starts.
    #[must_use]
    pub fn last_result(&self) -> Option<&QuizResult> {
        match &self.state {
            EngineState::Finished { result, .. } => Some(result),
            _ => None,
        }
    }

    #[must_use]
    pub fn progress(&self) -> Option<SessionProgress> {
        let session = self.session()?;
        Some(SessionProgress {
            state: self.state(),
            total: session.total(),
            answered: session.answers().len(),
            current_index: session.current_index(),
            score: session.score(),
            fraction: session.progress(),
        })
    }

    /// Drain messages about persistence failures since the last call.
    pub fn take_storage_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.storage_warnings)
    }

    /// Start a session on `set` under `name`.
    ///
    /// Allowed from `Idle` and `Finished`. A running session must be aborted
    /// explicitly first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` while another session is active
    /// and `SessionError::InvalidInput` when `set` has no questions. Neither
    /// case changes the engine.
    pub async fn start(&mut self, set: &QuestionSet, name: &str) -> Result<(), SessionError> {
        if matches!(self.state, EngineState::Active(_)) {
            return Err(SessionStateError::AlreadyActive.into());
        }
        self.begin(set.questions().to_vec(), name).await
    }

    async fn begin(&mut self, source: Vec<Question>, name: &str) -> Result<(), SessionError> {
        let mut questions = source.clone();
        self.ordering.arrange(&mut questions);
        let session = QuizSession::start(name, source, questions, self.clock.now())
            .map_err(|err| SessionError::InvalidInput(vec![err.to_string()]))?;

        tracing::info!(quiz = name, questions = session.total(), "quiz session started");
        self.state = EngineState::Active(session);
        self.render_current();
        self.persist().await;
        Ok(())
    }

    /// Choose an option for the current question. Nothing is scored yet.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` outside `InProgress` or for an
    /// option index the question does not have.
    pub fn select_answer(&mut self, index: usize) -> Result<(), SessionError> {
        self.active_mut()?.select_answer(index)?;
        tracing::debug!(index, "answer selected");
        Ok(())
    }

    /// Lock and score the selected answer, then persist the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` without a selection, when the
    /// question is already answered, or outside an active session. `answers`
    /// is unchanged in every error case.
    pub async fn submit_answer(&mut self) -> Result<SubmitFeedback, SessionError> {
        let clock = self.clock;
        let show_explanations = self.show_explanations;
        let session = self.active_mut()?;

        let elapsed_ms = clock.elapsed_ms(session.started_at());
        let record = session.submit(elapsed_ms)?.clone();
        let explanation = if show_explanations {
            session
                .current_question()
                .and_then(Question::explanation)
                .map(str::to_owned)
        } else {
            None
        };
        let feedback = SubmitFeedback {
            record,
            score: session.score(),
            explanation,
            is_last: session.current_index() + 1 >= session.total(),
        };

        tracing::debug!(
            question = %feedback.record.question_id,
            correct = feedback.record.is_correct,
            score = feedback.score,
            "answer submitted"
        );
        self.persist().await;
        Ok(feedback)
    }

    /// Move to the next question, or finish after the last one.
    ///
    /// Finishing renders the result and clears the stored snapshot, so a
    /// finished session can never be resumed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` unless the current question has
    /// been answered.
    pub async fn advance(&mut self) -> Result<AdvanceOutcome, SessionError> {
        match self.active_mut()?.advance()? {
            Advance::Next { index } => {
                self.render_current();
                self.persist().await;
                Ok(AdvanceOutcome::Question { index })
            }
            Advance::Complete => {
                let result = self.finish().await?;
                Ok(AdvanceOutcome::Finished(result))
            }
        }
    }

    async fn finish(&mut self) -> Result<QuizResult, SessionError> {
        let EngineState::Active(session) = std::mem::replace(&mut self.state, EngineState::Idle)
        else {
            return Err(SessionStateError::NotStarted.into());
        };

        let result = session.result(self.clock.now());
        let quiz = QuestionSet::new(session.name(), session.source_questions().to_vec());
        self.state = EngineState::Finished {
            quiz,
            result: result.clone(),
        };

        self.display.render_progress(1.0);
        self.display
            .render_result(result.score, result.total_questions, result.percentage);
        tracing::info!(
            quiz = %result.quiz_name,
            score = result.score,
            total = result.total_questions,
            percentage = result.percentage,
            elapsed_ms = result.elapsed().num_milliseconds(),
            "quiz finished"
        );

        if let Err(err) = self.sessions.clear_session().await {
            self.report_storage("clear finished session", &err);
        }
        Ok(result)
    }

    /// Start over on the same questions and name, discarding prior answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` when there is nothing to restart.
    pub async fn restart(&mut self) -> Result<(), SessionError> {
        let (source, name) = match &self.state {
            EngineState::Active(session) => (
                session.source_questions().to_vec(),
                session.name().to_owned(),
            ),
            EngineState::Finished { quiz, .. } => {
                (quiz.questions().to_vec(), quiz.name().to_owned())
            }
            EngineState::Idle => return Err(SessionStateError::NotStarted.into()),
        };
        self.begin(source, &name).await
    }

    /// Drop the current session without recording a result.
    ///
    /// Returns whether an active session was aborted. Calling it again, or
    /// while idle, does nothing. A finished result is dismissed.
    pub async fn abort(&mut self) -> bool {
        match std::mem::replace(&mut self.state, EngineState::Idle) {
            EngineState::Active(session) => {
                tracing::info!(
                    quiz = session.name(),
                    answered = session.answers().len(),
                    "quiz session aborted"
                );
                if let Err(err) = self.sessions.clear_session().await {
                    self.report_storage("clear aborted session", &err);
                }
                true
            }
            EngineState::Finished { .. } => {
                tracing::debug!("finished result dismissed");
                false
            }
            EngineState::Idle => false,
        }
    }

    /// Restore a stored session, if one exists and is well formed.
    ///
    /// A snapshot that cannot be loaded or does not hold together counts as
    /// nothing to resume; a malformed one is cleared.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::IllegalState` unless the engine is idle.
    pub async fn resume(&mut self) -> Result<bool, SessionError> {
        match self.state {
            EngineState::Idle => {}
            EngineState::Active(_) => return Err(SessionStateError::AlreadyActive.into()),
            EngineState::Finished { .. } => return Err(SessionStateError::Finished.into()),
        }

        let snapshot = match self.sessions.load_session().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Ok(false),
            Err(err) => {
                self.report_storage("load saved progress", &err);
                return Ok(false);
            }
        };

        match snapshot.into_session() {
            Ok(session) => {
                tracing::info!(
                    quiz = session.name(),
                    index = session.current_index(),
                    score = session.score(),
                    "quiz session resumed"
                );
                self.state = EngineState::Active(session);
                self.render_current();
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(%err, "discarding malformed session snapshot");
                if let Err(err) = self.sessions.clear_session().await {
                    self.report_storage("clear malformed session", &err);
                }
                Ok(false)
            }
        }
    }

    fn active_mut(&mut self) -> Result<&mut QuizSession, SessionError> {
        match &mut self.state {
            EngineState::Active(session) => Ok(session),
            EngineState::Finished { .. } => Err(SessionStateError::Finished.into()),
            EngineState::Idle => Err(SessionStateError::NotStarted.into()),
        }
    }

    fn render_current(&self) {
        let EngineState::Active(session) = &self.state else {
            return;
        };
        if let Some(question) = session.current_question() {
            self.display
                .render_question(question, session.current_index(), session.total());
            self.display.render_progress(session.progress());
        }
    }

    async fn persist(&mut self) {
        let EngineState::Active(session) = &self.state else {
            return;
        };
        let snapshot = SessionSnapshot::from_session(session);
        if let Err(err) = self.sessions.save_session(&snapshot).await {
            self.report_storage("save progress", &err);
        }
    }

    fn report_storage(&mut self, action: &str, err: &StorageError) {
        tracing::warn!(%err, action, "session persistence failed");
        self.storage_warnings.push(format!("could not {action}: {err}"));
    }
}

impl fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("SessionEngine");
        debug
            .field("state", &self.state())
            .field("show_explanations", &self.show_explanations)
            .field("pending_warnings", &self.storage_warnings.len());
        if let Some(session) = self.session() {
            debug
                .field("quiz", &session.name())
                .field("current_index", &session.current_index())
                .field("score", &session.score());
        }
        debug.finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{RecordingDisplay, RenderEvent};
    use async_trait::async_trait;
    use quiz_core::model::QuestionId;
    use quiz_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn question(id: u64, correct: usize) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Question {id}"),
            "General",
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct,
            Some(format!("Because {id}")),
        )
        .unwrap()
    }

    fn pair() -> QuestionSet {
        QuestionSet::new("Pair", vec![question(1, 0), question(2, 3)])
    }

    fn build_engine(repo: &InMemoryRepository) -> (SessionEngine, Arc<RecordingDisplay>) {
        let display = Arc::new(RecordingDisplay::new());
        let engine = SessionEngine::new(fixed_clock(), Arc::new(repo.clone()), display.clone());
        (engine, display)
    }

    /// Snapshot store that always fails.
    struct BrokenStore;

    #[async_trait]
    impl SessionSnapshotRepository for BrokenStore {
        async fn save_session(&self, _: &SessionSnapshot) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk full".into()))
        }

        async fn load_session(&self) -> Result<Option<SessionSnapshot>, StorageError> {
            Err(StorageError::Unavailable("disk full".into()))
        }

        async fn clear_session(&self) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk full".into()))
        }
    }

    #[tokio::test]
    async fn start_renders_first_question_and_persists() {
        let repo = InMemoryRepository::new();
        let (mut engine, display) = build_engine(&repo);

        engine.start(&pair(), "Pair").await.unwrap();

        assert_eq!(engine.state(), SessionState::InProgress);
        let events = display.events();
        assert!(matches!(
            &events[0],
            RenderEvent::Question { index: 0, total: 2, .. }
        ));
        assert_eq!(events[1], RenderEvent::Progress(0.0));
        let stored = repo.load_session().await.unwrap().unwrap();
        assert_eq!(stored.quiz.name, "Pair");
        assert_eq!(stored.current_question_index, 0);
    }

    #[tokio::test]
    async fn empty_set_is_invalid_input_and_leaves_engine_idle() {
        let repo = InMemoryRepository::new();
        let (mut engine, display) = build_engine(&repo);

        let err = engine
            .start(&QuestionSet::new("Empty", Vec::new()), "Empty")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidInput(ref msgs) if msgs.len() == 1));
        assert_eq!(engine.state(), SessionState::Idle);
        assert!(display.events().is_empty());
        assert!(repo.load_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn starting_over_an_active_session_requires_abort() {
        let repo = InMemoryRepository::new();
        let (mut engine, _) = build_engine(&repo);
        engine.start(&pair(), "Pair").await.unwrap();

        let err = engine.start(&pair(), "Again").await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::IllegalState(SessionStateError::AlreadyActive)
        ));
        assert_eq!(engine.session().unwrap().name(), "Pair");

        assert!(engine.abort().await);
        engine.start(&pair(), "Again").await.unwrap();
        assert_eq!(engine.session().unwrap().name(), "Again");
    }

    #[tokio::test]
    async fn two_questions_one_right_scores_fifty_percent() {
        let repo = InMemoryRepository::new();
        let (mut engine, display) = build_engine(&repo);
        engine.start(&pair(), "Pair").await.unwrap();

        engine.select_answer(0).unwrap();
        let first = engine.submit_answer().await.unwrap();
        assert!(first.record.is_correct);
        assert_eq!(first.score, 1);
        assert_eq!(first.explanation.as_deref(), Some("Because 1"));
        assert!(!first.is_last);
        assert_eq!(engine.state(), SessionState::Answered);
        let progress = engine.progress().unwrap();
        assert_eq!(
            (progress.total, progress.answered, progress.current_index, progress.score),
            (2, 1, 0, 1)
        );

        assert_eq!(
            engine.advance().await.unwrap(),
            AdvanceOutcome::Question { index: 1 }
        );
        engine.select_answer(1).unwrap();
        let second = engine.submit_answer().await.unwrap();
        assert!(!second.record.is_correct);
        assert_eq!(second.score, 1);
        assert!(second.is_last);

        let AdvanceOutcome::Finished(result) = engine.advance().await.unwrap() else {
            panic!("expected the quiz to finish");
        };
        assert_eq!((result.score, result.total_questions, result.percentage), (1, 2, 50));
        assert_eq!(engine.state(), SessionState::Finished);
        assert_eq!(
            display.events().last(),
            Some(&RenderEvent::Result {
                score: 1,
                total: 2,
                percentage: 50
            })
        );
        assert!(repo.load_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn submit_without_selection_is_illegal_and_changes_nothing() {
        let repo = InMemoryRepository::new();
        let (mut engine, _) = build_engine(&repo);
        engine.start(&pair(), "Pair").await.unwrap();

        let err = engine.submit_answer().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::IllegalState(SessionStateError::NoSelection)
        ));
        assert!(engine.session().unwrap().answers().is_empty());
        assert_eq!(engine.state(), SessionState::InProgress);
    }

    #[tokio::test]
    async fn resubmission_is_rejected() {
        let repo = InMemoryRepository::new();
        let (mut engine, _) = build_engine(&repo);
        engine.start(&pair(), "Pair").await.unwrap();
        engine.select_answer(0).unwrap();
        engine.submit_answer().await.unwrap();

        assert!(matches!(
            engine.submit_answer().await,
            Err(SessionError::IllegalState(SessionStateError::AlreadyAnswered))
        ));
        assert!(matches!(
            engine.select_answer(1),
            Err(SessionError::IllegalState(SessionStateError::AlreadyAnswered))
        ));
        assert_eq!(engine.session().unwrap().answers().len(), 1);
        assert_eq!(engine.session().unwrap().score(), 1);
    }

    #[tokio::test]
    async fn idle_and_finished_reject_answers() {
        let repo = InMemoryRepository::new();
        let (mut engine, _) = build_engine(&repo);

        assert!(matches!(
            engine.select_answer(0),
            Err(SessionError::IllegalState(SessionStateError::NotStarted))
        ));
        assert!(matches!(
            engine.submit_answer().await,
            Err(SessionError::IllegalState(SessionStateError::NotStarted))
        ));

        let single = QuestionSet::new("One", vec![question(1, 2)]);
        engine.start(&single, "One").await.unwrap();
        engine.select_answer(2).unwrap();
        engine.submit_answer().await.unwrap();
        engine.advance().await.unwrap();

        assert!(matches!(
            engine.select_answer(0),
            Err(SessionError::IllegalState(SessionStateError::Finished))
        ));
        assert!(matches!(
            engine.submit_answer().await,
            Err(SessionError::IllegalState(SessionStateError::Finished))
        ));
    }

    #[tokio::test]
    async fn abort_twice_is_a_no_op() {
        let repo = InMemoryRepository::new();
        let (mut engine, _) = build_engine(&repo);
        engine.start(&pair(), "Pair").await.unwrap();

        assert!(engine.abort().await);
        assert!(!engine.abort().await);
        assert_eq!(engine.state(), SessionState::Idle);
        assert!(repo.load_session().await.unwrap().is_none());
        assert!(engine.take_storage_warnings().is_empty());
    }

    #[tokio::test]
    async fn restart_discards_answers() {
        let repo = InMemoryRepository::new();
        let (mut engine, _) = build_engine(&repo);
        engine.start(&pair(), "Pair").await.unwrap();
        engine.select_answer(0).unwrap();
        engine.submit_answer().await.unwrap();

        engine.restart().await.unwrap();
        let session = engine.session().unwrap();
        assert_eq!(session.name(), "Pair");
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert!(session.answers().is_empty());
    }

    #[tokio::test]
    async fn restart_after_finish_replays_same_quiz() {
        let repo = InMemoryRepository::new();
        let (mut engine, _) = build_engine(&repo);
        let single = QuestionSet::new("One", vec![question(1, 2)]);
        engine.start(&single, "One").await.unwrap();
        engine.select_answer(2).unwrap();
        engine.submit_answer().await.unwrap();
        engine.advance().await.unwrap();
        assert!(engine.last_result().is_some());

        engine.restart().await.unwrap();
        assert_eq!(engine.state(), SessionState::InProgress);
        assert_eq!(engine.session().unwrap().questions(), single.questions());
        assert!(engine.last_result().is_none());
    }

    #[tokio::test]
    async fn restart_while_idle_is_illegal() {
        let repo = InMemoryRepository::new();
        let (mut engine, _) = build_engine(&repo);
        assert!(matches!(
            engine.restart().await,
            Err(SessionError::IllegalState(SessionStateError::NotStarted))
        ));
    }

    #[tokio::test]
    async fn resume_restores_progress_after_restart() {
        let repo = InMemoryRepository::new();
        let (mut first, _) = build_engine(&repo);
        first.start(&pair(), "Pair").await.unwrap();
        first.select_answer(0).unwrap();
        first.submit_answer().await.unwrap();
        let before = first.session().unwrap().clone();
        drop(first);

        let (mut second, display) = build_engine(&repo);
        assert!(second.resume().await.unwrap());
        let after = second.session().unwrap();
        assert_eq!(after.current_index(), before.current_index());
        assert_eq!(after.score(), before.score());
        assert_eq!(after.answers(), before.answers());
        assert_eq!(second.state(), SessionState::Answered);
        assert_eq!(display.last_question_index(), Some(0));

        assert_eq!(
            second.advance().await.unwrap(),
            AdvanceOutcome::Question { index: 1 }
        );
    }

    #[tokio::test]
    async fn resume_with_nothing_stored_returns_false() {
        let repo = InMemoryRepository::new();
        let (mut engine, _) = build_engine(&repo);
        assert!(!engine.resume().await.unwrap());
        assert_eq!(engine.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn corrupt_snapshot_means_nothing_to_resume() {
        let repo = InMemoryRepository::new();
        repo.store_raw_session("{\"quiz\": 42").unwrap();
        let (mut engine, _) = build_engine(&repo);

        assert!(!engine.resume().await.unwrap());
        assert_eq!(engine.state(), SessionState::Idle);
        assert_eq!(engine.take_storage_warnings().len(), 1);
    }

    #[tokio::test]
    async fn malformed_snapshot_is_cleared() {
        let repo = InMemoryRepository::new();
        let (mut engine, _) = build_engine(&repo);
        engine.start(&pair(), "Pair").await.unwrap();
        let mut snapshot = repo.load_session().await.unwrap().unwrap();
        snapshot.score = 5;
        repo.save_session(&snapshot).await.unwrap();
        drop(engine);

        let (mut engine, _) = build_engine(&repo);
        assert!(!engine.resume().await.unwrap());
        assert!(repo.load_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resume_is_only_valid_when_idle() {
        let repo = InMemoryRepository::new();
        let (mut engine, _) = build_engine(&repo);
        engine.start(&pair(), "Pair").await.unwrap();
        assert!(matches!(
            engine.resume().await,
            Err(SessionError::IllegalState(SessionStateError::AlreadyActive))
        ));
    }

    #[tokio::test]
    async fn storage_failures_do_not_block_progress() {
        let display = Arc::new(RecordingDisplay::new());
        let mut engine = SessionEngine::new(fixed_clock(), Arc::new(BrokenStore), display);

        engine.start(&pair(), "Pair").await.unwrap();
        engine.select_answer(0).unwrap();
        engine.submit_answer().await.unwrap();
        engine.advance().await.unwrap();
        engine.select_answer(3).unwrap();
        engine.submit_answer().await.unwrap();
        let outcome = engine.advance().await.unwrap();

        assert!(matches!(outcome, AdvanceOutcome::Finished(ref r) if r.score == 2));
        let warnings = engine.take_storage_warnings();
        assert_eq!(warnings.len(), 5);
        assert!(warnings.iter().all(|w| w.contains("disk full")));
        assert!(engine.take_storage_warnings().is_empty());
    }

    #[tokio::test]
    async fn explanations_can_be_hidden() {
        let repo = InMemoryRepository::new();
        let (engine, _) = build_engine(&repo);
        let mut engine = engine.with_show_explanations(false);
        engine.start(&pair(), "Pair").await.unwrap();
        engine.select_answer(0).unwrap();
        assert_eq!(engine.submit_answer().await.unwrap().explanation, None);
    }

    #[tokio::test]
    async fn ordering_runs_on_a_private_copy() {
        struct Reverse;
        impl QuestionOrder for Reverse {
            fn arrange(&self, questions: &mut Vec<Question>) {
                questions.reverse();
            }
        }

        let repo = InMemoryRepository::new();
        let (engine, _) = build_engine(&repo);
        let mut engine = engine.with_ordering(Arc::new(Reverse));
        let set = pair();
        engine.start(&set, "Pair").await.unwrap();

        let session = engine.session().unwrap();
        assert_eq!(session.questions()[0].id(), QuestionId::new(2));
        assert_eq!(session.source_questions(), set.questions());
        assert_eq!(set.questions()[0].id(), QuestionId::new(1));
    }

    #[tokio::test]
    async fn elapsed_time_comes_from_the_clock() {
        let repo = InMemoryRepository::new();
        let display = Arc::new(RecordingDisplay::new());
        let mut clock = fixed_clock();
        let mut engine = SessionEngine::new(clock, Arc::new(repo.clone()), display.clone());
        engine.start(&pair(), "Pair").await.unwrap();
        drop(engine);

        clock.advance(chrono::Duration::seconds(4));
        let mut engine = SessionEngine::new(clock, Arc::new(repo), display);
        assert!(engine.resume().await.unwrap());
        engine.select_answer(0).unwrap();
        let feedback = engine.submit_answer().await.unwrap();
        assert_eq!(feedback.record.elapsed_ms, 4_000);
        assert_eq!(engine.session().unwrap().started_at(), fixed_now());
    }
}
