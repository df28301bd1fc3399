//! Enforcement Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Host-side failure of an enforcement request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnforcementError {
    #[error("{action} rejected by host: {reason}")]
    Rejected { action: &'static str, reason: String },
}

// ============================================================================
// ACTIONS
// ============================================================================

/// Side effect requested from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EnforcementAction {
    EnterFullscreen,
    RestoreFullscreen { attempt: u32 },
    CancelRestore,
    SuppressClipboard,
    ExitFullscreen,
    ReleaseCapture,
    MonitoringDegraded,
}

impl EnforcementAction {
    pub fn description(&self) -> String {
        match self {
            EnforcementAction::EnterFullscreen => "Enter fullscreen".to_string(),
            EnforcementAction::RestoreFullscreen { attempt } => {
                format!("Restore fullscreen (attempt {})", attempt)
            }
            EnforcementAction::CancelRestore => "Cancel pending fullscreen restore".to_string(),
            EnforcementAction::SuppressClipboard => "Suppress clipboard action".to_string(),
            EnforcementAction::ExitFullscreen => "Exit fullscreen".to_string(),
            EnforcementAction::ReleaseCapture => "Release camera and microphone".to_string(),
            EnforcementAction::MonitoringDegraded => "Face monitoring unavailable".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Success,
    Failed,
    Cancelled,
}

/// One entry of the enforcement history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: EnforcementAction,
    pub status: ActionStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ActionRecord {
    pub fn new(action: EnforcementAction, status: ActionStatus, message: impl Into<String>) -> Self {
        Self {
            action,
            status,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn from_result(action: EnforcementAction, result: &Result<(), EnforcementError>) -> Self {
        match result {
            Ok(()) => Self::new(action, ActionStatus::Success, action.description()),
            Err(e) => Self::new(action, ActionStatus::Failed, e.to_string()),
        }
    }
}
