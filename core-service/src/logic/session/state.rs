//! Session lifecycle states and the transition rule

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    PreCheck,
    Active,
    Flagged,
    Completed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::PreCheck => "PRE_CHECK",
            SessionState::Active => "ACTIVE",
            SessionState::Flagged => "FLAGGED",
            SessionState::Completed => "COMPLETED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Flagged | SessionState::Completed)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why the session ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum EndReason {
    ThresholdReached,
    ConversationCompleted,
    Abandoned(String),
}

/// One evaluation step over everything drained in a single actor turn.
///
/// Threshold crossing is checked before completion, so a violation and a
/// completion arriving in the same step end FLAGGED.
pub fn evaluate(
    state: SessionState,
    cumulative_weight: f64,
    termination_threshold: f64,
    completion: Option<&EndReason>,
) -> Option<(SessionState, EndReason)> {
    match state {
        SessionState::Flagged | SessionState::Completed => None,
        SessionState::PreCheck => completion.map(|reason| (SessionState::Completed, reason.clone())),
        SessionState::Active => {
            if cumulative_weight >= termination_threshold {
                Some((SessionState::Flagged, EndReason::ThresholdReached))
            } else {
                completion.map(|reason| (SessionState::Completed, reason.clone()))
            }
        }
    }
}
