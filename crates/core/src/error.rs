use thiserror::Error;

/// Caller bugs in the presentation layer. Returned, never clamped.
#[derive(Debug, Error)]
pub enum PresentationError {
    #[error("index {index} out of range for {len} item(s)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("viewer is not open")]
    ViewerClosed,
    #[error("no result set to view")]
    NoResults,
}
