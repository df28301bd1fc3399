//! Enforcement Module - Enforcement Controller
//!
//! Host side effects driven by the session: fullscreen enter/restore/exit,
//! clipboard suppression, capture release.
//!
//! ## Structure
//! - `types`: EnforcementAction, ActionRecord, EnforcementError
//! - `host`: HostControls trait and stock hosts
//! - `controller`: EnforcementController, verdicts

pub mod types;
pub mod host;
pub mod controller;

pub use controller::{host_verdict, EnforcementController, RestoreSink, RestoreTicket};
pub use host::{HostControls, LoggingHost, RecordingHost};
pub use types::{ActionRecord, ActionStatus, EnforcementAction, EnforcementError};
