//! Session Replay
//!
//! Drives a session from a JSON-lines script, one timed step per line:
//!
//! ```text
//! {"at_ms": 0,    "action": {"type": "checks_complete"}}
//! {"at_ms": 1500, "action": {"type": "host", "event": {"type": "copy"}}}
//! {"at_ms": 2000, "action": {"type": "face", "faces": [0.9, 0.8]}}
//! {"at_ms": 9000, "action": {"type": "conversation_completed"}}
//! ```
//!
//! Face steps become the scripted detector's timeline; every other step is
//! applied to the session when its time comes. Blank lines and `#` comments
//! are skipped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;

use crate::logic::config::DetectorConfig;
use crate::logic::face::ScriptedFrame;
use crate::logic::session::{Disposition, PreCheckReport, SessionError, SessionHandle};
use crate::logic::signals::HostEvent;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("cannot read script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("script line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayAction {
    ChecksComplete {
        #[serde(default)]
        report: Option<PreCheckReport>,
    },
    Host {
        event: HostEvent,
    },
    Face {
        #[serde(default)]
        faces: Vec<f32>,
    },
    FaceError,
    ConversationCompleted,
    Abandon {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptLine {
    pub at_ms: u64,
    pub action: ReplayAction,
}

#[derive(Debug, Clone, Default)]
pub struct ReplayScript {
    lines: Vec<ScriptLine>,
}

impl ReplayScript {
    pub fn parse(text: &str) -> Result<Self, ReplayError> {
        let mut lines = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let raw = raw.trim();
            if raw.is_empty() || raw.starts_with('#') {
                continue;
            }
            let line: ScriptLine =
                serde_json::from_str(raw).map_err(|source| ReplayError::Parse { line: idx + 1, source })?;
            lines.push(line);
        }
        lines.sort_by_key(|l| l.at_ms);
        Ok(Self { lines })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn face_timeline(&self) -> Vec<ScriptedFrame> {
        self.lines
            .iter()
            .filter_map(|l| match &l.action {
                ReplayAction::Face { faces } => Some(ScriptedFrame::faces(l.at_ms, faces)),
                ReplayAction::FaceError => Some(ScriptedFrame::failing(l.at_ms)),
                _ => None,
            })
            .collect()
    }

    /// Replays never see a camera; face input always comes from the script
    pub fn detector_config(&self, configured: &DetectorConfig) -> DetectorConfig {
        let timeline = self.face_timeline();
        match configured {
            DetectorConfig::Scripted { .. } if timeline.is_empty() => configured.clone(),
            _ => DetectorConfig::Scripted { timeline },
        }
    }

    /// Apply every step on schedule, then wait for the disposition.
    /// A script without an ending step concludes the conversation after its last step.
    pub async fn run(&self, session: &SessionHandle) -> Result<Disposition, ReplayError> {
        let start = Instant::now();
        let signals = session.signals();

        for line in &self.lines {
            tokio::time::sleep_until(start + Duration::from_millis(line.at_ms)).await;

            match &line.action {
                ReplayAction::ChecksComplete { report } => {
                    let report = report.clone().unwrap_or_else(PreCheckReport::passing);
                    if let Err(e) = session.checks_complete(report).await {
                        log::warn!("[REPLAY] {}ms checks refused: {}", line.at_ms, e);
                    }
                }
                ReplayAction::Host { event } => {
                    let verdict = signals.dispatch(*event);
                    log::debug!("[REPLAY] {}ms {} -> {:?}", line.at_ms, event.dom_name(), verdict);
                }
                ReplayAction::ConversationCompleted => {
                    session.conversation_completed();
                }
                ReplayAction::Abandon { reason } => {
                    session.abandon(reason.clone());
                }
                ReplayAction::Face { .. } | ReplayAction::FaceError => {}
            }
        }

        if !session.state().is_terminal() {
            session.conversation_completed();
        }
        Ok(session.disposition().await?)
    }
}
