//! Report Module - disposition delivery
//!
//! ## Structure
//! - `sink`: DispositionSink trait, LogSink
//! - `flag`: HTTP flag reporter for the interview backend

pub mod sink;
pub mod flag;

use thiserror::Error;

pub use flag::{FlagClient, FlagConfig, FlagRequest, FlagResponse};
pub use sink::{DispositionSink, LogSink};

#[derive(Debug, Clone, Error)]
pub enum ReportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {0}")]
    Server(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Flag rejected: {0}")]
    Rejected(String),
}
