//! Signals Module - Signal Collector
//!
//! Host-environment events (visibility, focus, clipboard, fullscreen).
//!
//! ## Structure
//! - `types`: HostEvent, HostVerdict, HostSignal
//! - `collector`: classification and the host-facing subscription

pub mod types;
pub mod collector;

pub use collector::{classify, SignalSink, SignalSubscription};
pub use types::{HostEvent, HostSignal, HostVerdict};
