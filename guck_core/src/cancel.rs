//! Cooperative cancellation shared between a caller and a running comparison.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{Error, Result};

/// Cloneable abort signal with an optional deadline.
///
/// Clones share the same flag, so a handle kept by the caller can stop a
/// comparison running on another thread. Comparators poll it between steps
/// and before every file they emit.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A handle that only trips when [`Cancellation::cancel`] is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that also trips once `deadline` has passed.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Some(deadline),
        }
    }

    /// A handle that trips `timeout` from now. An unrepresentable deadline is
    /// treated as no deadline.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Request that every holder of this handle stop.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Deadline attached to this handle, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the handle was cancelled or its deadline has passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
            || self
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Returns [`Error::Cancelled`] once the handle has tripped.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Cancelled`] when cancelled or past the deadline.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
