//! Enforcement Controller
//!
//! Reacts to specific violation classes with host side effects. Restoration
//! after a fullscreen exit runs on a cancelable timer that reports back to
//! the session; failures are logged into the history and never escalate.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::host::HostControls;
use super::types::{ActionRecord, ActionStatus, EnforcementAction, EnforcementError};
use crate::logic::config::MonitoringConfig;
use crate::logic::signals::HostVerdict;
use crate::logic::violation::ViolationClass;

/// Identifies one scheduled restore. Only the ticket of the timer currently
/// pending is honoured when it comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreTicket {
    pub generation: u64,
    pub attempt: u32,
}

/// Notifies the session that a restore is due; `false` once closed
pub type RestoreSink = Arc<dyn Fn(RestoreTicket) -> bool + Send + Sync>;

/// Synchronous verdict for the host handler that raised `class`
pub fn host_verdict(class: ViolationClass) -> HostVerdict {
    match class {
        ViolationClass::CopyPaste => HostVerdict::SuppressDefault,
        _ => HostVerdict::Recorded,
    }
}

pub struct EnforcementController {
    host: Arc<dyn HostControls>,
    restore_sink: RestoreSink,
    restore_delay: Duration,
    max_attempts: u32,
    pending_restore: Option<(u64, JoinHandle<()>)>,
    next_generation: u64,
    history: Vec<ActionRecord>,
    torn_down: bool,
}

impl EnforcementController {
    pub fn new(host: Arc<dyn HostControls>, config: &MonitoringConfig, restore_sink: RestoreSink) -> Self {
        Self {
            host,
            restore_sink,
            restore_delay: config.fullscreen_restore_delay(),
            max_attempts: config.fullscreen_restore_attempts,
            pending_restore: None,
            next_generation: 0,
            history: Vec::new(),
            torn_down: false,
        }
    }

    /// Session entered ACTIVE
    pub fn on_active(&mut self) {
        let result = self.host.request_fullscreen();
        if let Err(e) = &result {
            log::warn!("Fullscreen request failed: {}", e);
        }
        self.record(EnforcementAction::EnterFullscreen, &result);
    }

    pub fn on_violation(&mut self, class: ViolationClass) {
        if self.torn_down {
            return;
        }
        match class {
            ViolationClass::FullscreenExit => self.schedule_restore(1),
            ViolationClass::CopyPaste => {
                // the host already cancelled the action from the verdict
                self.history.push(ActionRecord::new(
                    EnforcementAction::SuppressClipboard,
                    ActionStatus::Success,
                    "Clipboard action blocked",
                ));
            }
            _ => {}
        }
    }

    /// Host reports fullscreen is back on its own
    pub fn on_fullscreen_entered(&mut self) {
        if self.cancel_restore() {
            self.history.push(ActionRecord::new(
                EnforcementAction::CancelRestore,
                ActionStatus::Cancelled,
                "Fullscreen re-entered before restore",
            ));
        }
    }

    /// Monitoring lost its face analysis; nothing to drive on the host
    pub fn on_monitoring_degraded(&mut self, reason: &str) {
        self.history.push(ActionRecord::new(
            EnforcementAction::MonitoringDegraded,
            ActionStatus::Failed,
            reason,
        ));
    }

    /// A restore timer fired. Tickets from cancelled or superseded timers
    /// may still be queued and are dropped here.
    pub fn on_restore_due(&mut self, ticket: RestoreTicket) {
        if self.torn_down {
            return;
        }
        match self.pending_restore {
            Some((generation, _)) if generation == ticket.generation => {
                self.pending_restore = None;
            }
            _ => {
                log::debug!(
                    "Ignoring stale fullscreen restore (generation {}, attempt {})",
                    ticket.generation,
                    ticket.attempt
                );
                return;
            }
        }

        let attempt = ticket.attempt;
        let action = EnforcementAction::RestoreFullscreen { attempt };
        let result = self.host.request_fullscreen();
        self.record(action, &result);

        if let Err(e) = result {
            if attempt < self.max_attempts {
                log::warn!("Fullscreen restore attempt {} failed: {}; retrying", attempt, e);
                self.schedule_restore(attempt + 1);
            } else {
                log::error!("Fullscreen restore gave up after {} attempts: {}", attempt, e);
            }
        }
    }

    /// Terminal state: cancel timers, leave fullscreen, stop capture. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if self.cancel_restore() {
            self.history.push(ActionRecord::new(
                EnforcementAction::CancelRestore,
                ActionStatus::Cancelled,
                "Session ended",
            ));
        }

        let result = self.host.exit_fullscreen();
        if let Err(e) = &result {
            log::warn!("Exit fullscreen failed: {}", e);
        }
        self.record(EnforcementAction::ExitFullscreen, &result);

        let result = self.host.release_capture();
        if let Err(e) = &result {
            log::error!("Capture release failed: {}", e);
        }
        self.record(EnforcementAction::ReleaseCapture, &result);
    }

    pub fn has_pending_restore(&self) -> bool {
        self.pending_restore.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn history(&self) -> &[ActionRecord] {
        &self.history
    }

    fn schedule_restore(&mut self, attempt: u32) {
        self.cancel_restore();

        self.next_generation += 1;
        let ticket = RestoreTicket {
            generation: self.next_generation,
            attempt,
        };
        let delay = self.restore_delay;
        let sink = Arc::clone(&self.restore_sink);
        log::debug!("Fullscreen restore attempt {} in {:?}", attempt, delay);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sink(ticket);
        });
        self.pending_restore = Some((ticket.generation, handle));
    }

    fn cancel_restore(&mut self) -> bool {
        match self.pending_restore.take() {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    fn record(&mut self, action: EnforcementAction, result: &Result<(), EnforcementError>) {
        self.history.push(ActionRecord::from_result(action, result));
    }
}

impl Drop for EnforcementController {
    fn drop(&mut self) {
        self.cancel_restore();
    }
}
