/// Errors returned by [`crate::CompletionTracker`] operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("Position {position} is out of range for a tracker of {total} marks")]
    PositionOutOfRange { position: usize, total: usize },
}
