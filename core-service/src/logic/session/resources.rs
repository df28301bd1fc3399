//! Session-scoped resources
//!
//! Acquired on PRE_CHECK -> ACTIVE, released on any terminal transition.
//! `Drop` releases too, so an unwinding actor still frees camera and timers.

use tokio::task::JoinHandle;

use crate::logic::enforcement::{ActionRecord, EnforcementController};

pub struct SessionResources {
    analyzer: Option<JoinHandle<()>>,
    enforcement: EnforcementController,
    released: bool,
}

impl SessionResources {
    /// Takes over a running analyzer task and enters fullscreen
    pub fn acquire(mut enforcement: EnforcementController, analyzer: Option<JoinHandle<()>>) -> Self {
        enforcement.on_active();
        Self {
            analyzer,
            enforcement,
            released: false,
        }
    }

    pub fn enforcement(&mut self) -> &mut EnforcementController {
        &mut self.enforcement
    }

    pub fn history(&self) -> &[ActionRecord] {
        self.enforcement.history()
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if let Some(task) = self.analyzer.take() {
            task.abort();
        }
        self.enforcement.teardown();
        log::debug!("Session resources released");
    }
}

impl Drop for SessionResources {
    fn drop(&mut self) {
        self.release();
    }
}
