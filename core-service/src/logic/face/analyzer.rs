//! Face Presence Analyzer
//!
//! Loads the detector, then samples frames at a fixed interval, awaiting
//! each inference before the next tick. Observations go through the
//! looking-away tracker; only classified violations leave this loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use super::detector::{FaceDetector, FrameSource};
use super::tracker::LookingAwayTracker;
use super::types::FaceObservation;
use crate::logic::config::MonitoringConfig;
use crate::logic::violation::{Violation, ViolationClass};

/// What the analyzer reports to the session
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerEvent {
    ModelProgress(u8),
    ModelReady { backend: &'static str },
    Violation(Violation),
    /// Face checks are off for the rest of the session
    Degraded(String),
}

/// Delivers an event; `false` once the session stopped listening
pub type AnalyzerSink = Box<dyn Fn(AnalyzerEvent) -> bool + Send + Sync>;

pub struct FacePresenceAnalyzer {
    detector: Arc<dyn FaceDetector>,
    frames: Box<dyn FrameSource>,
    tracker: LookingAwayTracker,
    config: Arc<MonitoringConfig>,
    min_confidence: f32,
    sink: AnalyzerSink,
    frames_sampled: u64,
    transient_errors: u64,
}

impl FacePresenceAnalyzer {
    pub fn new(
        config: Arc<MonitoringConfig>,
        detector: Arc<dyn FaceDetector>,
        frames: Box<dyn FrameSource>,
        sink: AnalyzerSink,
    ) -> Self {
        let min_confidence = detector.min_confidence();
        Self {
            detector,
            frames,
            tracker: LookingAwayTracker::new(config.looking_away_ms, config.face_confidence_threshold),
            min_confidence,
            config,
            sink,
            frames_sampled: 0,
            transient_errors: 0,
        }
    }

    /// Runs until degraded or the sink closes; abort the task to stop early
    pub async fn run(mut self) {
        let timeout = self.config.model_load_timeout();
        if !Self::load_model(&self.detector, &self.sink, timeout).await {
            return;
        }

        let mut ticker = tokio::time::interval(self.config.sample_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let frame = match self.frames.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(e) => {
                    log::error!("Video capture lost: {}", e);
                    (self.sink)(AnalyzerEvent::Degraded(format!("video capture lost: {}", e)));
                    return;
                }
            };

            let detections = match self.detector.detect(&frame, self.min_confidence).await {
                Ok(d) => d,
                Err(e) => {
                    self.transient_errors += 1;
                    if self.transient_errors == 1 {
                        log::warn!("Face detection error: {}", e);
                    } else {
                        log::debug!("Face detection error #{}: {}", self.transient_errors, e);
                    }
                    continue;
                }
            };
            self.frames_sampled += 1;

            let obs = FaceObservation::from_detections(&detections, frame.timestamp_ms);
            if let Some(class) = self.tracker.observe(&obs) {
                let violation = self.describe(class, &obs);
                log::info!("[FACE] {} at {}ms ({} faces)", class, obs.timestamp_ms, obs.face_count);
                if !(self.sink)(AnalyzerEvent::Violation(violation)) {
                    log::debug!("Analyzer sink closed after {} frames", self.frames_sampled);
                    return;
                }
            }
        }
    }

    /// `false` when monitoring had to be degraded
    async fn load_model(detector: &Arc<dyn FaceDetector>, sink: &AnalyzerSink, timeout: Duration) -> bool {
        let progress = move |p: u8| {
            sink(AnalyzerEvent::ModelProgress(p));
        };

        match tokio::time::timeout(timeout, detector.load(&progress)).await {
            Ok(Ok(())) => {
                log::info!("Face detector '{}' ready", detector.name());
                sink(AnalyzerEvent::ModelReady { backend: detector.name() })
            }
            Ok(Err(e)) => {
                log::error!("Error loading face detection model: {}", e);
                sink(AnalyzerEvent::Degraded(format!("face model failed to load: {}", e)));
                false
            }
            Err(_) => {
                log::error!("Face detection model load timed out after {:?}", timeout);
                sink(AnalyzerEvent::Degraded(format!(
                    "face model load timed out after {}ms",
                    timeout.as_millis()
                )));
                false
            }
        }
    }

    fn describe(&self, class: ViolationClass, obs: &FaceObservation) -> Violation {
        let details = match class {
            ViolationClass::FaceAbsent => format!(
                "No face above {:.2} confidence for more than {}ms",
                self.config.face_confidence_threshold, self.config.looking_away_ms
            ),
            _ => format!("{} faces in frame", obs.face_count),
        };
        self.config.violation(class).with_details(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::config::DetectorConfig;
    use crate::logic::face::scripted::{ScriptedFaceDetector, ScriptedFrame, SyntheticFrameSource};
    use tokio::sync::mpsc;

    fn config() -> Arc<MonitoringConfig> {
        Arc::new(MonitoringConfig {
            detector: DetectorConfig::Scripted { timeline: vec![] },
            ..MonitoringConfig::reference()
        })
    }

    fn channel_sink() -> (AnalyzerSink, mpsc::UnboundedReceiver<AnalyzerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Box::new(move |ev| tx.send(ev).is_ok()), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AnalyzerEvent>) -> Vec<AnalyzerEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    fn violations(events: &[AnalyzerEvent]) -> Vec<ViolationClass> {
        events
            .iter()
            .filter_map(|e| match e {
                AnalyzerEvent::Violation(v) => Some(v.class),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_multiple_faces_on_first_frame() {
        let detector = Arc::new(ScriptedFaceDetector::new(vec![ScriptedFrame::faces(0, &[0.9, 0.8])]));
        let (sink, mut rx) = channel_sink();
        let analyzer = FacePresenceAnalyzer::new(config(), detector, Box::new(SyntheticFrameSource::new(8, 8)), sink);
        let task = tokio::spawn(analyzer.run());

        tokio::time::sleep(Duration::from_millis(1)).await;
        let events = drain(&mut rx);
        assert_eq!(events[0], AnalyzerEvent::ModelProgress(0));
        assert!(events.contains(&AnalyzerEvent::ModelReady { backend: "scripted" }));
        assert_eq!(violations(&events), vec![ViolationClass::MultipleFaces]);

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_absence_episode_through_loop() {
        let detector = Arc::new(ScriptedFaceDetector::new(vec![
            ScriptedFrame::faces(0, &[0.95]),
            ScriptedFrame::faces(1_000, &[]),
            ScriptedFrame::faces(4_000, &[0.95]),
            ScriptedFrame::faces(5_000, &[]),
        ]));
        let (sink, mut rx) = channel_sink();
        let analyzer = FacePresenceAnalyzer::new(config(), detector, Box::new(SyntheticFrameSource::new(8, 8)), sink);
        let task = tokio::spawn(analyzer.run());

        // 3s away then back: nothing
        tokio::time::sleep(Duration::from_millis(9_000)).await;
        assert!(violations(&drain(&mut rx)).is_empty());

        // second episode passes 5s at ~10s
        tokio::time::sleep(Duration::from_millis(6_000)).await;
        assert_eq!(violations(&drain(&mut rx)), vec![ViolationClass::FaceAbsent]);

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_emit_nothing() {
        let detector = Arc::new(ScriptedFaceDetector::new(vec![
            ScriptedFrame::failing(0),
            ScriptedFrame::faces(2_000, &[0.9, 0.9]),
        ]));
        let (sink, mut rx) = channel_sink();
        let analyzer = FacePresenceAnalyzer::new(config(), detector, Box::new(SyntheticFrameSource::new(8, 8)), sink);
        let task = tokio::spawn(analyzer.run());

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert!(violations(&drain(&mut rx)).is_empty());

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(violations(&drain(&mut rx)), vec![ViolationClass::MultipleFaces]);

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_failure_degrades() {
        let detector = Arc::new(ScriptedFaceDetector::failing_load("weights missing"));
        let (sink, mut rx) = channel_sink();
        let analyzer = FacePresenceAnalyzer::new(config(), detector, Box::new(SyntheticFrameSource::new(8, 8)), sink);

        analyzer.run().await;
        let events = drain(&mut rx);
        assert!(matches!(events.last(), Some(AnalyzerEvent::Degraded(_))));
        assert!(violations(&events).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_timeout_degrades() {
        let detector = Arc::new(ScriptedFaceDetector::new(vec![]).with_load_delay(Duration::from_secs(60)));
        let (sink, mut rx) = channel_sink();
        let analyzer = FacePresenceAnalyzer::new(config(), detector, Box::new(SyntheticFrameSource::new(8, 8)), sink);

        analyzer.run().await;
        match drain(&mut rx).last() {
            Some(AnalyzerEvent::Degraded(reason)) => assert!(reason.contains("timed out")),
            other => panic!("expected degraded, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_loss_degrades() {
        let detector = Arc::new(ScriptedFaceDetector::new(vec![]));
        let (sink, mut rx) = channel_sink();
        let frames = SyntheticFrameSource::new(8, 8).ending_after(Duration::from_millis(100));
        let analyzer = FacePresenceAnalyzer::new(config(), detector, Box::new(frames), sink);

        analyzer.run().await;
        assert!(matches!(drain(&mut rx).last(), Some(AnalyzerEvent::Degraded(_))));
    }
}
