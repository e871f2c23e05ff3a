use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ConfigureError;

/// Cooperative cancellation flag shared between a host and a running
/// configurator. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Poll point for configurators: errors once the host asked to stop.
    pub fn check(&self, configurator: &str) -> Result<(), ConfigureError> {
        if self.is_cancelled() {
            return Err(ConfigureError::cancelled(configurator));
        }
        Ok(())
    }
}
