//! Logic Module - Proctoring Engines
//!
//! Leaf-first: violations and the ledger, the face analyzer and host
//! signals that feed it, enforcement side effects, and the session actor
//! tying them together.

// Records
pub mod violation;
pub mod ledger;
pub mod config;

// Producers
pub mod face;
pub mod signals;

// Reactions and lifecycle
pub mod enforcement;
pub mod session;
pub mod events;

// Delivery
pub mod report;
pub mod replay;
