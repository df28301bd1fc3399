//! Interview Proctor - Integrity Monitoring Core
//!
//! Fuses host signals and face-presence inference into one weighted
//! violation ledger and drives the interview session state machine.

pub mod constants;
pub mod logic;

pub use logic::config::MonitoringConfig;
pub use logic::session::{Collaborators, Disposition, Session, SessionHandle, SessionState};
