use super::state::SessionState;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionProgress {
    pub state: SessionState,
    pub total: usize,
    pub answered: usize,
    pub current_index: usize,
    pub score: u32,
    pub fraction: f64,
}
