//! Session Module - Session State Machine
//!
//! ## Structure
//! - `state`: SessionState, EndReason, the per-step transition rule
//! - `precheck`: PreCheckReport evaluation
//! - `disposition`: final outcome record
//! - `resources`: session-scoped resources with release-on-drop
//! - `actor`: the single-consumer session task
//! - `handle`: SessionHandle

pub mod state;
pub mod precheck;
pub mod disposition;
pub mod resources;
pub mod actor;
pub mod handle;


use thiserror::Error;

use crate::logic::config::ConfigError;

pub use actor::{Collaborators, Session, SessionMessage};
pub use disposition::Disposition;
pub use handle::SessionHandle;
pub use precheck::{PreCheckReport, PreCheckVerdict};
pub use resources::SessionResources;
pub use state::{EndReason, SessionState};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("camera access is required to start the interview")]
    CameraUnavailable,

    #[error("pre-interview checks not met: {0}")]
    PreCheckFailed(String),

    #[error("monitoring can only start from PRE_CHECK (current: {0})")]
    NotInPreCheck(SessionState),

    #[error("session has ended")]
    Closed,

    #[error(transparent)]
    Config(#[from] ConfigError),
}
