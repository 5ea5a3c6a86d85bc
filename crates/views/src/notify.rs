//! Snackbar notifications queued by the views and drained by the caller.

use std::collections::VecDeque;

/// Oldest notifications are dropped beyond this many.
const MAX_QUEUED: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snackbar {
    pub message: String,
    pub severity: Severity,
}

impl Snackbar {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }
}

/// Bounded FIFO of pending snackbars.
#[derive(Debug, Default)]
pub struct Notifications {
    queue: VecDeque<Snackbar>,
}

impl Notifications {
    pub fn push(&mut self, snackbar: Snackbar) {
        if self.queue.len() == MAX_QUEUED {
            self.queue.pop_front();
        }
        self.queue.push_back(snackbar);
    }

    /// Remove and return everything queued, oldest first.
    pub fn take(&mut self) -> Vec<Snackbar> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
