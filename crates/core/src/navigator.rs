use crate::error::PresentationError;
use std::sync::Arc;

/// A read-only snapshot of an open viewer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerState {
    sequence: Arc<[String]>,
    current_index: usize,
}

impl ViewerState {
    pub fn sequence(&self) -> &[String] {
        &self.sequence
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Only built by an open navigator, so the index is always in range.
    pub fn current_path(&self) -> &str {
        &self.sequence[self.current_index]
    }
}

/// Stepping over a fixed sequence of image paths with wraparound.
///
/// A navigator only exists while the viewer is open: the closed state is the
/// absence of a navigator, and [`ViewerNavigator::close`] consumes it. The
/// sequence is captured at [`ViewerNavigator::open`] and never re-synced.
#[derive(Debug, Clone)]
pub struct ViewerNavigator {
    sequence: Arc<[String]>,
    current: usize,
}

impl ViewerNavigator {
    pub fn open(
        sequence: impl Into<Arc<[String]>>,
        start_index: usize,
    ) -> Result<Self, PresentationError> {
        let sequence = sequence.into();
        if start_index >= sequence.len() {
            return Err(PresentationError::IndexOutOfRange {
                index: start_index,
                len: sequence.len(),
            });
        }
        Ok(Self {
            sequence,
            current: start_index,
        })
    }

    pub fn sequence(&self) -> &[String] {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &str {
        &self.sequence[self.current]
    }

    /// Alt text for the displayed image, 1-based.
    pub fn label(&self) -> String {
        format!("Image {}", self.current + 1)
    }

    pub fn next(&mut self) -> &str {
        self.current = (self.current + 1) % self.sequence.len();
        self.current()
    }

    pub fn previous(&mut self) -> &str {
        let len = self.sequence.len();
        self.current = (self.current + len - 1) % len;
        self.current()
    }

    pub fn state(&self) -> ViewerState {
        ViewerState {
            sequence: Arc::clone(&self.sequence),
            current_index: self.current,
        }
    }

    pub fn close(self) {}
}
