//! Violation Types
//!
//! Core types for integrity violations.
//! No scoring logic here - weights come from `MonitoringConfig`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// VIOLATION CLASS
// ============================================================================

/// What kind of suspicious behavior was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationClass {
    /// Interview tab became hidden
    TabSwitch,
    /// Interview window lost focus
    WindowBlur,
    /// Copy, cut or paste attempt
    CopyPaste,
    /// Fullscreen presentation was left
    FullscreenExit,
    /// No confident face for longer than the looking-away threshold
    FaceAbsent,
    /// More than one face in frame
    MultipleFaces,
}

impl ViolationClass {
    pub const ALL: [ViolationClass; 6] = [
        ViolationClass::TabSwitch,
        ViolationClass::WindowBlur,
        ViolationClass::CopyPaste,
        ViolationClass::FullscreenExit,
        ViolationClass::FaceAbsent,
        ViolationClass::MultipleFaces,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationClass::TabSwitch => "TAB_SWITCH",
            ViolationClass::WindowBlur => "WINDOW_BLUR",
            ViolationClass::CopyPaste => "COPY_PASTE",
            ViolationClass::FullscreenExit => "FULLSCREEN_EXIT",
            ViolationClass::FaceAbsent => "FACE_ABSENT",
            ViolationClass::MultipleFaces => "MULTIPLE_FACES",
        }
    }

    /// Fixed presentation tier for this class
    pub fn tier(&self) -> SeverityTier {
        match self {
            ViolationClass::TabSwitch | ViolationClass::WindowBlur => SeverityTier::Major,
            ViolationClass::CopyPaste
            | ViolationClass::FullscreenExit
            | ViolationClass::FaceAbsent => SeverityTier::Minor,
            ViolationClass::MultipleFaces => SeverityTier::Critical,
        }
    }

    /// Message shown to the candidate when this class is recorded
    pub fn default_description(&self) -> &'static str {
        match self {
            ViolationClass::TabSwitch => "Tab switching detected! This will be reported.",
            ViolationClass::WindowBlur => "Window minimization detected! This will be reported.",
            ViolationClass::CopyPaste => "Copy-paste attempt detected!",
            ViolationClass::FullscreenExit => "Exited full-screen mode! Restoring...",
            ViolationClass::FaceAbsent => "Face not detected for an extended period.",
            ViolationClass::MultipleFaces => "Multiple faces detected in camera view.",
        }
    }
}

impl std::fmt::Display for ViolationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// SEVERITY TIER
// ============================================================================

/// Qualitative bucket used by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityTier {
    Minor,
    Major,
    Critical,
}

impl SeverityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityTier::Minor => "MINOR",
            SeverityTier::Major => "MAJOR",
            SeverityTier::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// VIOLATION
// ============================================================================

/// One classified, weighted record. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub id: Uuid,
    pub class: ViolationClass,
    pub tier: SeverityTier,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub weight: f64,
}

impl Violation {
    pub fn new(class: ViolationClass, weight: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            class,
            tier: class.tier(),
            timestamp: Utc::now(),
            description: class.default_description().to_string(),
            details: None,
            weight,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// `"{TIER}: {description}"`, the line format the flag endpoint expects
    pub fn flag_line(&self) -> String {
        format!("{}: {}", self.tier, self.description)
    }
}
