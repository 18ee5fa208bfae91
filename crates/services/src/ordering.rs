//! Optional reordering applied to a session's private copy of the questions.

use rand::rng;
use rand::seq::SliceRandom;
use std::sync::Arc;

use quiz_core::model::{Question, Settings};

/// A step that arranges the questions of a new session.
///
/// `start` always calls the configured order; `KeepOrder` is the no-op.
pub trait QuestionOrder: Send + Sync {
    fn arrange(&self, questions: &mut Vec<Question>);
}

/// Leaves questions and options exactly as loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepOrder;

impl QuestionOrder for KeepOrder {
    fn arrange(&self, _questions: &mut Vec<Question>) {}
}

/// Shuffles the order of the questions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShuffleQuestions;

impl QuestionOrder for ShuffleQuestions {
    fn arrange(&self, questions: &mut Vec<Question>) {
        let mut rng = rng();
        questions.as_mut_slice().shuffle(&mut rng);
    }
}

/// Shuffles the options of every question, keeping the correct answer attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShuffleOptions;

impl QuestionOrder for ShuffleOptions {
    fn arrange(&self, questions: &mut Vec<Question>) {
        let mut rng = rng();
        for question in questions.iter_mut() {
            let mut order: Vec<usize> = (0..question.options().len()).collect();
            order.shuffle(&mut rng);
            if let Err(err) = question.permute_options(&order) {
                tracing::warn!(%err, question = %question.id(), "option shuffle skipped");
            }
        }
    }
}

/// Applies several orders one after another.
#[derive(Clone, Default)]
pub struct ChainedOrder {
    steps: Vec<Arc<dyn QuestionOrder>>,
}

impl ChainedOrder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(mut self, step: Arc<dyn QuestionOrder>) -> Self {
        self.steps.push(step);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl QuestionOrder for ChainedOrder {
    fn arrange(&self, questions: &mut Vec<Question>) {
        for step in &self.steps {
            step.arrange(questions);
        }
    }
}

/// Build the order selected by the randomization settings.
#[must_use]
pub fn ordering_for(settings: &Settings) -> Arc<dyn QuestionOrder> {
    let mut chain = ChainedOrder::new();
    if settings.randomize_questions {
        chain = chain.then(Arc::new(ShuffleQuestions));
    }
    if settings.randomize_options {
        chain = chain.then(Arc::new(ShuffleOptions));
    }
    if chain.is_empty() {
        Arc::new(KeepOrder)
    } else {
        Arc::new(chain)
    }
}
