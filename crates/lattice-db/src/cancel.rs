//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{LatticeError, Result};

/// A shared cancellation flag checked before each per-document step in long
/// loops (rebuild, cascade deletes). Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns [`LatticeError::Cancelled`] once cancellation is requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(LatticeError::Cancelled)
        } else {
            Ok(())
        }
    }
}
