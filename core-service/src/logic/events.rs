//! Live Feed - session status stream for UI banners
//!
//! One `watch` channel per session; observers always see the latest status
//! and never block the session actor.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::logic::config::MonitoringConfig;
use crate::logic::session::SessionState;
use crate::logic::violation::Violation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerLevel {
    Clear,
    Notice,
    Warning,
    Critical,
}

impl BannerLevel {
    pub fn for_weight(weight: f64, config: &MonitoringConfig) -> Self {
        if weight >= config.critical_weight {
            BannerLevel::Critical
        } else if weight >= config.warning_weight {
            BannerLevel::Warning
        } else if weight > 0.0 {
            BannerLevel::Notice
        } else {
            BannerLevel::Clear
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MonitoringHealth {
    /// Face model not loaded yet
    Starting,
    Healthy,
    Degraded { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveStatus {
    pub state: SessionState,
    pub cumulative_weight: f64,
    pub latest_violation: Option<Violation>,
    pub banner: BannerLevel,
    pub monitoring: MonitoringHealth,
    pub model_progress: u8,
}

impl Default for LiveStatus {
    fn default() -> Self {
        Self {
            state: SessionState::PreCheck,
            cumulative_weight: 0.0,
            latest_violation: None,
            banner: BannerLevel::Clear,
            monitoring: MonitoringHealth::Starting,
            model_progress: 0,
        }
    }
}

/// Writer side, owned by the session actor
pub struct LiveFeed {
    tx: watch::Sender<LiveStatus>,
}

impl LiveFeed {
    pub fn new() -> (Self, watch::Receiver<LiveStatus>) {
        let (tx, rx) = watch::channel(LiveStatus::default());
        (Self { tx }, rx)
    }

    /// Apply `f` and notify only when something changed
    pub fn update(&self, f: impl FnOnce(&mut LiveStatus)) {
        self.tx.send_if_modified(|status| {
            let before = status.clone();
            f(status);
            *status != before
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_levels() {
        let config = MonitoringConfig::reference();
        assert_eq!(BannerLevel::for_weight(0.0, &config), BannerLevel::Clear);
        assert_eq!(BannerLevel::for_weight(0.5, &config), BannerLevel::Notice);
        assert_eq!(BannerLevel::for_weight(3.0, &config), BannerLevel::Warning);
        assert_eq!(BannerLevel::for_weight(7.5, &config), BannerLevel::Critical);
    }

    #[test]
    fn test_update_notifies_on_change_only() {
        let (feed, mut rx) = LiveFeed::new();
        rx.borrow_and_update();

        feed.update(|s| s.model_progress = 0);
        assert!(!rx.has_changed().unwrap());

        feed.update(|s| s.model_progress = 50);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().model_progress, 50);
    }
}
