//! Looking-Away Tracker
//!
//! Debounces per-frame observations into violations:
//! - absence (no face, or top confidence under the floor) must last longer
//!   than the looking-away threshold; one FACE_ABSENT per episode
//! - more than one face is reported on the first frame, once per episode

use super::types::FaceObservation;
use crate::logic::violation::ViolationClass;

#[derive(Debug, Clone)]
pub struct LookingAwayTracker {
    threshold_ms: u64,
    confidence_floor: f32,
    /// First absent frame of the current episode
    away_since: Option<u64>,
    absence_reported: bool,
    multiple_faces: bool,
}

impl LookingAwayTracker {
    pub fn new(threshold_ms: u64, confidence_floor: f32) -> Self {
        Self {
            threshold_ms,
            confidence_floor,
            away_since: None,
            absence_reported: false,
            multiple_faces: false,
        }
    }

    pub fn observe(&mut self, obs: &FaceObservation) -> Option<ViolationClass> {
        if obs.face_count > 1 {
            self.reset_absence();
            if self.multiple_faces {
                return None;
            }
            self.multiple_faces = true;
            return Some(ViolationClass::MultipleFaces);
        }
        self.multiple_faces = false;

        if !self.is_absent(obs) {
            self.reset_absence();
            return None;
        }

        let since = *self.away_since.get_or_insert(obs.timestamp_ms);
        if !self.absence_reported && obs.timestamp_ms.saturating_sub(since) > self.threshold_ms {
            self.absence_reported = true;
            return Some(ViolationClass::FaceAbsent);
        }
        None
    }

    pub fn is_absent(&self, obs: &FaceObservation) -> bool {
        obs.face_count == 0 || obs.top_confidence < self.confidence_floor
    }

    pub fn away_since(&self) -> Option<u64> {
        self.away_since
    }

    fn reset_absence(&mut self) {
        self.away_since = None;
        self.absence_reported = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(face_count: usize, top_confidence: f32, timestamp_ms: u64) -> FaceObservation {
        FaceObservation { face_count, top_confidence, timestamp_ms }
    }

    fn run(tracker: &mut LookingAwayTracker, frames: &[FaceObservation]) -> Vec<ViolationClass> {
        frames.iter().filter_map(|o| tracker.observe(o)).collect()
    }

    #[test]
    fn test_short_absence_not_reported() {
        let mut tracker = LookingAwayTracker::new(5_000, 0.6);
        let mut frames: Vec<_> = (0..=300).map(|i| obs(0, 0.0, i * 16)).collect(); // ~4.8s
        frames.push(obs(1, 0.9, 4_900));
        frames.extend((0..=400).map(|i| obs(0, 0.0, 5_000 + i * 10))); // new 4s episode

        assert!(run(&mut tracker, &frames).is_empty());
    }

    #[test]
    fn test_sustained_absence_reported_once() {
        let mut tracker = LookingAwayTracker::new(5_000, 0.6);
        let frames: Vec<_> = (0..1_000).map(|i| obs(0, 0.0, i * 16)).collect(); // ~16s

        let emitted = run(&mut tracker, &frames);
        assert_eq!(emitted, vec![ViolationClass::FaceAbsent]);
        assert_eq!(tracker.away_since(), Some(0));
    }

    #[test]
    fn test_absence_fires_only_after_threshold() {
        let mut tracker = LookingAwayTracker::new(5_000, 0.6);
        assert_eq!(tracker.observe(&obs(0, 0.0, 1_000)), None);
        assert_eq!(tracker.observe(&obs(0, 0.0, 6_000)), None); // exactly 5000, not beyond
        assert_eq!(tracker.observe(&obs(0, 0.0, 6_001)), Some(ViolationClass::FaceAbsent));
    }

    #[test]
    fn test_reappearance_rearms_episode() {
        let mut tracker = LookingAwayTracker::new(5_000, 0.6);
        let mut frames: Vec<_> = (0..=11).map(|i| obs(0, 0.0, i * 500)).collect();
        frames.push(obs(1, 0.95, 6_000));
        frames.extend((0..=11).map(|i| obs(0, 0.0, 7_000 + i * 500)));

        let emitted = run(&mut tracker, &frames);
        assert_eq!(emitted, vec![ViolationClass::FaceAbsent, ViolationClass::FaceAbsent]);
    }

    #[test]
    fn test_low_confidence_counts_as_absence() {
        let mut tracker = LookingAwayTracker::new(5_000, 0.6);
        let frames: Vec<_> = (0..=20).map(|i| obs(1, 0.4, i * 300)).collect();

        assert_eq!(run(&mut tracker, &frames), vec![ViolationClass::FaceAbsent]);
    }

    #[test]
    fn test_multiple_faces_immediate_once_per_episode() {
        let mut tracker = LookingAwayTracker::new(5_000, 0.6);
        assert_eq!(tracker.observe(&obs(2, 0.9, 0)), Some(ViolationClass::MultipleFaces));
        assert_eq!(tracker.observe(&obs(2, 0.9, 16)), None);
        assert_eq!(tracker.observe(&obs(3, 0.9, 32)), None);
        assert_eq!(tracker.observe(&obs(1, 0.9, 48)), None);
        assert_eq!(tracker.observe(&obs(2, 0.9, 64)), Some(ViolationClass::MultipleFaces));
    }

    #[test]
    fn test_multiple_faces_interrupts_absence() {
        let mut tracker = LookingAwayTracker::new(5_000, 0.6);
        tracker.observe(&obs(0, 0.0, 0));
        tracker.observe(&obs(2, 0.8, 3_000));
        assert_eq!(tracker.away_since(), None);
        assert_eq!(tracker.observe(&obs(0, 0.0, 6_000)), None);
    }
}
