//! Host Controls
//!
//! The host environment's privileged operations. Calls are synchronous: the
//! host either performs them inline or queues them on its own UI thread.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::types::EnforcementError;

pub trait HostControls: Send + Sync {
    fn request_fullscreen(&self) -> Result<(), EnforcementError>;

    fn exit_fullscreen(&self) -> Result<(), EnforcementError>;

    /// Stop every camera and microphone track
    fn release_capture(&self) -> Result<(), EnforcementError>;
}

/// Host with no privileged surface; every request only logs
#[derive(Debug, Default)]
pub struct LoggingHost;

impl HostControls for LoggingHost {
    fn request_fullscreen(&self) -> Result<(), EnforcementError> {
        log::info!("[HOST] request fullscreen");
        Ok(())
    }

    fn exit_fullscreen(&self) -> Result<(), EnforcementError> {
        log::info!("[HOST] exit fullscreen");
        Ok(())
    }

    fn release_capture(&self) -> Result<(), EnforcementError> {
        log::info!("[HOST] release capture");
        Ok(())
    }
}

/// Records every call; fullscreen requests can be scripted to fail
#[derive(Debug, Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<&'static str>>,
    fullscreen_failures: Mutex<VecDeque<String>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next `n` fullscreen requests are rejected
    pub fn failing_fullscreen(self, n: usize) -> Self {
        {
            let mut failures = self.fullscreen_failures.lock();
            for _ in 0..n {
                failures.push_back("permission denied".to_string());
            }
        }
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }
}

impl HostControls for RecordingHost {
    fn request_fullscreen(&self) -> Result<(), EnforcementError> {
        self.calls.lock().push("request_fullscreen");
        match self.fullscreen_failures.lock().pop_front() {
            Some(reason) => Err(EnforcementError::Rejected {
                action: "request_fullscreen",
                reason,
            }),
            None => Ok(()),
        }
    }

    fn exit_fullscreen(&self) -> Result<(), EnforcementError> {
        self.calls.lock().push("exit_fullscreen");
        Ok(())
    }

    fn release_capture(&self) -> Result<(), EnforcementError> {
        self.calls.lock().push("release_capture");
        Ok(())
    }
}
