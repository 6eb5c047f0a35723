use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::image_pipeline::common::error::{DevelopError, Result};

/// Shared flag asking a running pipeline to stop at the next stage boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` naming the stage that would have run next.
    pub fn check(&self, stage: &'static str) -> Result<()> {
        if self.is_cancelled() {
            Err(DevelopError::Cancelled { stage })
        } else {
            Ok(())
        }
    }
}
