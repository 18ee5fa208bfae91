mod engine;
mod progress;
mod state;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use engine::SessionEngine;
pub use progress::SessionProgress;
pub use state::{AdvanceOutcome, SessionState, SubmitFeedback};
