//! Scripted Backend
//!
//! Replays a recorded face timeline instead of running a model.
//! Used by the replay tool and by tests; selected with `backend = "scripted"`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::detector::{FaceDetector, FaceError, FrameSource, LoadProgress};
use super::types::{FaceDetection, Frame};

/// From `at_ms` on, frames show faces with these confidences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedFrame {
    pub at_ms: u64,
    #[serde(default)]
    pub faces: Vec<f32>,
    /// Inference on this stretch fails (transient error)
    #[serde(default)]
    pub error: bool,
}

impl ScriptedFrame {
    pub fn faces(at_ms: u64, faces: &[f32]) -> Self {
        Self { at_ms, faces: faces.to_vec(), error: false }
    }

    pub fn failing(at_ms: u64) -> Self {
        Self { at_ms, faces: vec![], error: true }
    }
}

pub struct ScriptedFaceDetector {
    timeline: Vec<ScriptedFrame>,
    load_failure: Option<String>,
    load_delay: Duration,
}

impl ScriptedFaceDetector {
    pub fn new(mut timeline: Vec<ScriptedFrame>) -> Self {
        timeline.sort_by_key(|f| f.at_ms);
        Self {
            timeline,
            load_failure: None,
            load_delay: Duration::ZERO,
        }
    }

    /// Loading always fails with `reason`
    pub fn failing_load(reason: impl Into<String>) -> Self {
        Self {
            load_failure: Some(reason.into()),
            ..Self::new(vec![])
        }
    }

    /// Loading takes `delay` before it succeeds
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Entry in effect at `timestamp_ms`
    fn entry_at(&self, timestamp_ms: u64) -> Option<&ScriptedFrame> {
        self.timeline.iter().rev().find(|f| f.at_ms <= timestamp_ms)
    }
}

#[async_trait]
impl FaceDetector for ScriptedFaceDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    /// The tracker's own floor decides absence for replayed confidences
    fn min_confidence(&self) -> f32 {
        0.0
    }

    async fn load(&self, progress: LoadProgress<'_>) -> Result<(), FaceError> {
        progress(0);
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        if let Some(reason) = &self.load_failure {
            return Err(FaceError::Load(reason.clone()));
        }
        progress(100);
        Ok(())
    }

    async fn detect(&self, frame: &Frame, min_confidence: f32) -> Result<Vec<FaceDetection>, FaceError> {
        // Before the first entry the candidate sits in frame
        let Some(entry) = self.entry_at(frame.timestamp_ms) else {
            return Ok(vec![FaceDetection::with_confidence(1.0)]);
        };
        if entry.error {
            return Err(FaceError::Inference(format!("scripted failure at {}ms", frame.timestamp_ms)));
        }
        Ok(entry
            .faces
            .iter()
            .filter(|c| **c >= min_confidence)
            .map(|c| FaceDetection::with_confidence(*c))
            .collect())
    }
}

// ============================================================================
// SYNTHETIC FRAME SOURCE
// ============================================================================

/// Blank frames stamped with time since creation
pub struct SyntheticFrameSource {
    started: Instant,
    width: u32,
    height: u32,
    ends_at: Option<Duration>,
}

impl SyntheticFrameSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            started: Instant::now(),
            width,
            height,
            ends_at: None,
        }
    }

    /// Capture is lost after `after`
    pub fn ending_after(mut self, after: Duration) -> Self {
        self.ends_at = Some(after);
        self
    }
}

#[async_trait]
impl FrameSource for SyntheticFrameSource {
    async fn next_frame(&mut self) -> Result<Option<Frame>, FaceError> {
        let elapsed = self.started.elapsed();
        if let Some(end) = self.ends_at {
            if elapsed >= end {
                return Err(FaceError::Capture("video track ended".to_string()));
            }
        }
        Ok(Some(Frame::blank(self.width, self.height, elapsed.as_millis() as u64)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeline_lookup() {
        let detector = ScriptedFaceDetector::new(vec![
            ScriptedFrame::faces(1_000, &[]),
            ScriptedFrame::faces(0, &[0.9]),
            ScriptedFrame::faces(2_000, &[0.9, 0.8, 0.3]),
        ]);

        let at = |ms| Frame::blank(1, 1, ms);
        assert_eq!(detector.detect(&at(500), 0.5).await.unwrap().len(), 1);
        assert_eq!(detector.detect(&at(1_500), 0.5).await.unwrap().len(), 0);
        // 0.3 filtered by min confidence
        assert_eq!(detector.detect(&at(2_500), 0.5).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_entries_and_load() {
        let detector = ScriptedFaceDetector::new(vec![ScriptedFrame::failing(0)]);
        assert!(detector.detect(&Frame::blank(1, 1, 10), 0.5).await.is_err());

        let broken = ScriptedFaceDetector::failing_load("weights missing");
        assert!(matches!(broken.load(&|_| {}).await, Err(FaceError::Load(_))));
    }
}
