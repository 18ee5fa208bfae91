use std::sync::Mutex;

use quiz_core::model::Question;

/// Where the session engine sends what should be shown.
///
/// Implementations render; they never mutate session state.
pub trait DisplaySurface: Send + Sync {
    /// Show `question`, the `index`-th (0-based) of `total`.
    fn render_question(&self, question: &Question, index: usize, total: usize);

    /// Show the final score.
    fn render_result(&self, score: u32, total: u32, percentage: u32);

    /// Show progress as a fraction in `0.0..=1.0`.
    fn render_progress(&self, fraction: f64);
}

/// One call received by a `RecordingDisplay`.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Question {
        question: Question,
        index: usize,
        total: usize,
    },
    Result {
        score: u32,
        total: u32,
        percentage: u32,
    },
    Progress(f64),
}

/// Display surface that only remembers what it was asked to render.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<RenderEvent>>,
}

impl RecordingDisplay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<RenderEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Index of the most recently rendered question, if any.
    #[must_use]
    pub fn last_question_index(&self) -> Option<usize> {
        self.events().iter().rev().find_map(|event| match event {
            RenderEvent::Question { index, .. } => Some(*index),
            _ => None,
        })
    }

    fn push(&self, event: RenderEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl DisplaySurface for RecordingDisplay {
    fn render_question(&self, question: &Question, index: usize, total: usize) {
        self.push(RenderEvent::Question {
            question: question.clone(),
            index,
            total,
        });
    }

    fn render_result(&self, score: u32, total: u32, percentage: u32) {
        self.push(RenderEvent::Result {
            score,
            total,
            percentage,
        });
    }

    fn render_progress(&self, fraction: f64) {
        self.push(RenderEvent::Progress(fraction));
    }
}
