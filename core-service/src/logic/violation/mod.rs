//! Violation Module
//!
//! Classified, weighted records of suspected cheating.
//!
//! ## Structure
//! - `types`: ViolationClass, SeverityTier, Violation

pub mod types;

pub use types::{SeverityTier, Violation, ViolationClass};
