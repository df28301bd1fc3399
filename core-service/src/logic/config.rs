//! Monitoring Configuration
//!
//! Per-session policy: weights, thresholds, timing and detector backend.
//! Loaded once at session start and never mutated afterwards.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::logic::face::scripted::ScriptedFrame;
use crate::logic::violation::{Violation, ViolationClass};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// WEIGHTS
// ============================================================================

/// Severity weight per violation class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViolationWeights {
    pub tab_switch: f64,
    pub window_blur: f64,
    pub copy_paste: f64,
    pub fullscreen_exit: f64,
    pub face_absent: f64,
    pub multiple_faces: f64,
}

impl Default for ViolationWeights {
    fn default() -> Self {
        Self {
            tab_switch: 2.0,
            window_blur: 2.0,
            copy_paste: 0.5,
            // Charged at the window-minimize weight
            fullscreen_exit: 2.0,
            face_absent: 0.5,
            multiple_faces: 3.0,
        }
    }
}

impl ViolationWeights {
    pub fn weight(&self, class: ViolationClass) -> f64 {
        match class {
            ViolationClass::TabSwitch => self.tab_switch,
            ViolationClass::WindowBlur => self.window_blur,
            ViolationClass::CopyPaste => self.copy_paste,
            ViolationClass::FullscreenExit => self.fullscreen_exit,
            ViolationClass::FaceAbsent => self.face_absent,
            ViolationClass::MultipleFaces => self.multiple_faces,
        }
    }
}

// ============================================================================
// DETECTOR BACKEND
// ============================================================================

/// Face model family; decides input size and default confidence floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelProfile {
    /// Lightweight detector, 320x240 input
    Tiny,
    /// SSD-style detector, 640x480 input
    Ssd,
}

impl ModelProfile {
    /// (width, height) expected by the model
    pub fn input_size(&self) -> (usize, usize) {
        match self {
            ModelProfile::Tiny => (320, 240),
            ModelProfile::Ssd => (640, 480),
        }
    }

    pub fn default_min_confidence(&self) -> f32 {
        match self {
            ModelProfile::Tiny => 0.6,
            ModelProfile::Ssd => 0.5,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "tiny" => Some(ModelProfile::Tiny),
            "ssd" => Some(ModelProfile::Ssd),
            _ => None,
        }
    }
}

/// Which inference backend drives the Face Presence Analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum DetectorConfig {
    Onnx {
        model_path: String,
        profile: ModelProfile,
        /// Hex SHA-256 the model file must match
        #[serde(default)]
        sha256: Option<String>,
        /// Overrides the profile's confidence floor
        #[serde(default)]
        min_confidence: Option<f32>,
    },
    /// Replays a recorded face timeline
    Scripted {
        #[serde(default)]
        timeline: Vec<ScriptedFrame>,
    },
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig::Onnx {
            model_path: constants::DEFAULT_MODEL_PATH.to_string(),
            profile: ModelProfile::Ssd,
            sha256: None,
            min_confidence: None,
        }
    }
}

// ============================================================================
// MONITORING CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub weights: ViolationWeights,
    /// Finishing at or above this weight yields `completed = false`
    pub flag_threshold: f64,
    /// Reaching this weight while active terminates the session as flagged
    pub termination_threshold: f64,
    pub looking_away_ms: u64,
    pub face_confidence_threshold: f32,
    pub sample_interval_ms: u64,
    pub model_load_timeout_ms: u64,
    pub fullscreen_restore_delay_ms: u64,
    pub fullscreen_restore_attempts: u32,
    pub warning_weight: f64,
    pub critical_weight: f64,
    pub detector: DetectorConfig,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            weights: ViolationWeights::default(),
            flag_threshold: constants::DEFAULT_FLAG_THRESHOLD,
            termination_threshold: constants::DEFAULT_TERMINATION_THRESHOLD,
            looking_away_ms: constants::DEFAULT_LOOKING_AWAY_MS,
            face_confidence_threshold: constants::DEFAULT_FACE_CONFIDENCE,
            sample_interval_ms: constants::DEFAULT_SAMPLE_INTERVAL_MS,
            model_load_timeout_ms: constants::DEFAULT_MODEL_LOAD_TIMEOUT_MS,
            fullscreen_restore_delay_ms: constants::DEFAULT_FULLSCREEN_RESTORE_DELAY_MS,
            fullscreen_restore_attempts: constants::DEFAULT_FULLSCREEN_RESTORE_ATTEMPTS,
            warning_weight: constants::DEFAULT_WARNING_WEIGHT,
            critical_weight: constants::DEFAULT_CRITICAL_WEIGHT,
            detector: DetectorConfig::default(),
        }
    }
}

impl MonitoringConfig {
    /// Reference policy: five weighted classes, threshold 18
    pub fn reference() -> Self {
        Self::default()
    }

    /// Earlier front-end policy: flag at 8, terminate at 10, tiny detector
    pub fn legacy() -> Self {
        Self {
            flag_threshold: 8.0,
            termination_threshold: 10.0,
            detector: DetectorConfig::Onnx {
                model_path: constants::DEFAULT_MODEL_PATH.to_string(),
                profile: ModelProfile::Tiny,
                sha256: None,
                min_confidence: None,
            },
            ..Default::default()
        }
    }

    /// Defaults overlaid with `PROCTOR_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self {
            flag_threshold: constants::get_flag_threshold(),
            termination_threshold: constants::get_termination_threshold(),
            looking_away_ms: constants::get_looking_away_ms(),
            face_confidence_threshold: constants::get_face_confidence(),
            ..Default::default()
        };

        if let DetectorConfig::Onnx { model_path, profile, .. } = &mut config.detector {
            *model_path = constants::get_model_path();
            if let Some(p) = constants::get_model_profile().and_then(|n| ModelProfile::parse(&n)) {
                *profile = p;
            }
        }
        config
    }

    /// Load from a JSON file; missing fields fall back to defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for class in ViolationClass::ALL {
            let w = self.weights.weight(class);
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::Invalid(format!("weight for {} must be >= 0, got {}", class, w)));
            }
        }
        if !(self.flag_threshold > 0.0) || !(self.termination_threshold > 0.0) {
            return Err(ConfigError::Invalid("thresholds must be positive".to_string()));
        }
        if self.flag_threshold > self.termination_threshold {
            return Err(ConfigError::Invalid(format!(
                "flag_threshold {} exceeds termination_threshold {}",
                self.flag_threshold, self.termination_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.face_confidence_threshold) {
            return Err(ConfigError::Invalid("face_confidence_threshold must be within [0, 1]".to_string()));
        }
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::Invalid("sample_interval_ms must be > 0".to_string()));
        }
        if let DetectorConfig::Onnx { min_confidence: Some(c), .. } = &self.detector {
            if !(0.0..=1.0).contains(c) {
                return Err(ConfigError::Invalid("detector min_confidence must be within [0, 1]".to_string()));
            }
        }
        Ok(())
    }

    pub fn weight_for(&self, class: ViolationClass) -> f64 {
        self.weights.weight(class)
    }

    /// Build a violation of `class` carrying the configured weight
    pub fn violation(&self, class: ViolationClass) -> Violation {
        Violation::new(class, self.weight_for(class))
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn model_load_timeout(&self) -> Duration {
        Duration::from_millis(self.model_load_timeout_ms)
    }

    pub fn fullscreen_restore_delay(&self) -> Duration {
        Duration::from_millis(self.fullscreen_restore_delay_ms)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reference_config() {
        let config = MonitoringConfig::reference();
        assert_eq!(config.flag_threshold, 18.0);
        assert_eq!(config.termination_threshold, 18.0);
        assert_eq!(config.looking_away_ms, 5_000);
        assert_eq!(config.weight_for(ViolationClass::CopyPaste), 0.5);
        assert_eq!(config.weight_for(ViolationClass::MultipleFaces), 3.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_legacy_config() {
        let config = MonitoringConfig::legacy();
        assert_eq!(config.flag_threshold, 8.0);
        assert_eq!(config.termination_threshold, 10.0);
        assert!(matches!(config.detector, DetectorConfig::Onnx { profile: ModelProfile::Tiny, .. }));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let config = MonitoringConfig {
            flag_threshold: 20.0,
            termination_threshold: 18.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_negative_weight() {
        let mut config = MonitoringConfig::default();
        config.weights.tab_switch = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_partial_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "termination_threshold": 12.0,
                "flag_threshold": 10.0,
                "weights": {{ "copy_paste": 1.0 }},
                "detector": {{ "backend": "scripted" }}
            }}"#
        )
        .unwrap();

        let config = MonitoringConfig::from_file(file.path()).unwrap();
        assert_eq!(config.termination_threshold, 12.0);
        assert_eq!(config.flag_threshold, 10.0);
        assert_eq!(config.weight_for(ViolationClass::CopyPaste), 1.0);
        // untouched fields keep defaults
        assert_eq!(config.weight_for(ViolationClass::TabSwitch), 2.0);
        assert_eq!(config.looking_away_ms, 5_000);
        assert!(matches!(config.detector, DetectorConfig::Scripted { .. }));
    }

    #[test]
    fn test_from_file_missing() {
        let err = MonitoringConfig::from_file("/nonexistent/proctor.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_model_profile_parse() {
        assert_eq!(ModelProfile::parse("TINY"), Some(ModelProfile::Tiny));
        assert_eq!(ModelProfile::parse("ssd"), Some(ModelProfile::Ssd));
        assert_eq!(ModelProfile::parse("yolo"), None);
        assert_eq!(ModelProfile::Tiny.input_size(), (320, 240));
    }
}
