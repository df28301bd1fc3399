//! Host Signal Types
//!
//! Events pushed by the host environment (browser / webview bridge) and the
//! verdict handed back to the host's event handler.

use serde::{Deserialize, Serialize};

use crate::logic::violation::ViolationClass;

/// One host-level event, 1:1 with the DOM event that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    VisibilityChange { hidden: bool },
    WindowBlur,
    WindowFocus,
    Copy,
    Paste,
    Cut,
    FullscreenChange { fullscreen: bool },
}

impl HostEvent {
    /// DOM event name, for logs
    pub fn dom_name(&self) -> &'static str {
        match self {
            HostEvent::VisibilityChange { .. } => "visibilitychange",
            HostEvent::WindowBlur => "blur",
            HostEvent::WindowFocus => "focus",
            HostEvent::Copy => "copy",
            HostEvent::Paste => "paste",
            HostEvent::Cut => "cut",
            HostEvent::FullscreenChange { .. } => "fullscreenchange",
        }
    }
}

/// What the host handler must do with the event it just delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostVerdict {
    /// Not monitoring (not active, or torn down); let the event through
    Ignored,
    /// Monitored, no violation
    Allowed,
    /// Violation recorded; default action proceeds
    Recorded,
    /// Violation recorded; host must cancel the default action now
    SuppressDefault,
}

/// Classified event forwarded to the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostSignal {
    pub event: HostEvent,
    pub class: Option<ViolationClass>,
}
