//! Pre-check evaluation
//!
//! Camera, microphone and consent are always required. The face check is
//! waived in fallback mode (model did not load in time), which starts the
//! session with face monitoring degraded.

use serde::{Deserialize, Serialize};

use super::SessionError;
use crate::logic::face::FaceObservation;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreCheckReport {
    pub camera: bool,
    pub microphone: bool,
    pub consent: bool,
    /// Latest observation from the check screen; `None` while the model loads
    #[serde(default)]
    pub face: Option<FaceObservation>,
    #[serde(default)]
    pub looking_away: bool,
    #[serde(default)]
    pub fallback_mode: bool,
}

impl PreCheckReport {
    /// Everything granted, one clear face
    pub fn passing() -> Self {
        Self {
            camera: true,
            microphone: true,
            consent: true,
            face: Some(FaceObservation {
                face_count: 1,
                top_confidence: 1.0,
                timestamp_ms: 0,
            }),
            looking_away: false,
            fallback_mode: false,
        }
    }

    pub fn fallback() -> Self {
        Self {
            face: None,
            fallback_mode: true,
            ..Self::passing()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreCheckVerdict {
    Ready,
    /// Start anyway, face monitoring limited
    ReadyDegraded(String),
}

pub fn evaluate(report: &PreCheckReport, face_confidence: f32) -> Result<PreCheckVerdict, SessionError> {
    if !report.camera {
        return Err(SessionError::CameraUnavailable);
    }

    let mut unmet = Vec::new();
    if !report.microphone {
        unmet.push("microphone access".to_string());
    }
    if !report.consent {
        unmet.push("consent".to_string());
    }

    if !report.fallback_mode {
        match &report.face {
            None => unmet.push("face detection model still loading".to_string()),
            Some(obs) if obs.face_count == 0 => unmet.push("no face detected".to_string()),
            Some(obs) if obs.face_count > 1 => unmet.push("multiple faces detected".to_string()),
            Some(obs) if obs.top_confidence <= face_confidence => {
                unmet.push("poor lighting conditions".to_string())
            }
            Some(_) if report.looking_away => unmet.push("face not centered".to_string()),
            Some(_) => {}
        }
    }

    if !unmet.is_empty() {
        return Err(SessionError::PreCheckFailed(unmet.join(", ")));
    }

    if report.fallback_mode {
        Ok(PreCheckVerdict::ReadyDegraded(
            "basic camera check only; some anti-cheating features may be limited".to_string(),
        ))
    } else {
        Ok(PreCheckVerdict::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passing_report_ready() {
        assert_eq!(evaluate(&PreCheckReport::passing(), 0.6).unwrap(), PreCheckVerdict::Ready);
    }

    #[test]
    fn test_camera_required_even_in_fallback() {
        let report = PreCheckReport {
            camera: false,
            ..PreCheckReport::fallback()
        };
        assert!(matches!(evaluate(&report, 0.6), Err(SessionError::CameraUnavailable)));
    }

    #[test]
    fn test_unmet_checks_listed() {
        let report = PreCheckReport {
            microphone: false,
            consent: false,
            ..PreCheckReport::passing()
        };
        match evaluate(&report, 0.6) {
            Err(SessionError::PreCheckFailed(msg)) => {
                assert!(msg.contains("microphone"));
                assert!(msg.contains("consent"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_face_check() {
        let mut report = PreCheckReport::passing();
        report.face = Some(FaceObservation { face_count: 2, top_confidence: 0.9, timestamp_ms: 0 });
        assert!(evaluate(&report, 0.6).is_err());

        report.face = Some(FaceObservation { face_count: 1, top_confidence: 0.6, timestamp_ms: 0 });
        assert!(evaluate(&report, 0.6).is_err());

        report.face = None;
        assert!(evaluate(&report, 0.6).is_err());
    }

    #[test]
    fn test_fallback_waives_face_check() {
        assert!(matches!(
            evaluate(&PreCheckReport::fallback(), 0.6),
            Ok(PreCheckVerdict::ReadyDegraded(_))
        ));
    }
}
