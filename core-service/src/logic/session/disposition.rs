//! Final session outcome

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::{EndReason, SessionState};
use crate::logic::enforcement::ActionRecord;
use crate::logic::violation::{Violation, ViolationClass};

/// Produced exactly once, on the terminal transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disposition {
    pub session_id: Uuid,
    pub interview_id: String,
    pub state: SessionState,
    pub violations: Vec<Violation>,
    pub total_weight: f64,
    pub counts: BTreeMap<ViolationClass, u32>,
    /// False once the flag threshold was reached at or before conclusion
    pub completed: bool,
    pub monitoring_degraded: bool,
    pub ended_at: DateTime<Utc>,
    pub end_reason: EndReason,
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
}

impl Disposition {
    pub fn is_flagged(&self) -> bool {
        !self.completed
    }

    /// One `"{TIER}: {description}"` line per violation
    pub fn flag_report(&self) -> String {
        self.violations
            .iter()
            .map(Violation::flag_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
