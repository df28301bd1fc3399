//! Session actor
//!
//! Single consumer of every producer (host signals, analyzer, restore
//! timers, lifecycle calls). Each turn drains all queued messages and runs
//! one evaluation step, so the ledger and state need no lock.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use super::disposition::Disposition;
use super::handle::SessionHandle;
use super::precheck::{self, PreCheckReport, PreCheckVerdict};
use super::resources::SessionResources;
use super::state::{self, EndReason, SessionState};
use super::SessionError;
use crate::logic::config::MonitoringConfig;
use crate::logic::enforcement::{EnforcementController, HostControls, RestoreSink, RestoreTicket};
use crate::logic::events::{BannerLevel, LiveFeed, MonitoringHealth};
use crate::logic::face::{build_detector, AnalyzerEvent, AnalyzerSink, FaceDetector, FacePresenceAnalyzer, FrameSource};
use crate::logic::ledger::ViolationLedger;
use crate::logic::report::DispositionSink;
use crate::logic::signals::{HostEvent, HostSignal};
use crate::logic::violation::Violation;

pub enum SessionMessage {
    ChecksComplete {
        report: PreCheckReport,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    ConversationCompleted,
    Abandon(String),
    Host(HostSignal),
    Face(AnalyzerEvent),
    RestoreDue(RestoreTicket),
}

/// External capabilities a session drives
pub struct Collaborators {
    pub host: Arc<dyn HostControls>,
    /// Replaces the backend named by `MonitoringConfig::detector`
    pub detector: Option<Arc<dyn FaceDetector>>,
    pub frames: Box<dyn FrameSource>,
    pub sink: Option<Arc<dyn DispositionSink>>,
}

pub struct Session;

impl Session {
    /// Validate the config and start the actor in PRE_CHECK
    pub fn spawn(
        interview_id: impl Into<String>,
        config: MonitoringConfig,
        collaborators: Collaborators,
    ) -> Result<SessionHandle, SessionError> {
        config.validate()?;
        let detector = collaborators
            .detector
            .unwrap_or_else(|| build_detector(&config.detector));

        let id = Uuid::new_v4();
        let interview_id = interview_id.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::PreCheck);
        let (disposition_tx, disposition_rx) = watch::channel(None);
        let (feed, live_rx) = LiveFeed::new();

        log::info!("Session {} created for interview '{}'", id, interview_id);

        let actor = SessionActor {
            id,
            interview_id,
            config: Arc::new(config),
            state: SessionState::PreCheck,
            state_tx,
            disposition_tx,
            ledger: ViolationLedger::new(),
            feed,
            self_tx: tx.downgrade(),
            host: collaborators.host,
            detector,
            frames: Some(collaborators.frames),
            sink: collaborators.sink,
            resources: None,
            monitoring_degraded: false,
        };
        tokio::spawn(actor.run(rx));

        Ok(SessionHandle::new(id, tx, state_rx, live_rx, disposition_rx))
    }
}

struct SessionActor {
    id: Uuid,
    interview_id: String,
    config: Arc<MonitoringConfig>,
    state: SessionState,
    state_tx: watch::Sender<SessionState>,
    disposition_tx: watch::Sender<Option<Disposition>>,
    ledger: ViolationLedger,
    feed: LiveFeed,
    // weak so producers owned by the actor do not keep its inbox open
    self_tx: mpsc::WeakUnboundedSender<SessionMessage>,
    host: Arc<dyn HostControls>,
    detector: Arc<dyn FaceDetector>,
    frames: Option<Box<dyn FrameSource>>,
    sink: Option<Arc<dyn DispositionSink>>,
    resources: Option<SessionResources>,
    monitoring_degraded: bool,
}

impl SessionActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<SessionMessage>) {
        while let Some(first) = rx.recv().await {
            let mut batch = vec![first];
            while let Ok(msg) = rx.try_recv() {
                batch.push(msg);
            }

            self.step(batch);

            if self.state.is_terminal() {
                rx.close();
                break;
            }
        }

        if !self.state.is_terminal() {
            log::warn!("Session {} lost every handle; ending", self.id);
            self.finish(
                SessionState::Completed,
                EndReason::Abandoned("all session handles dropped".to_string()),
            );
        }
        log::debug!("Session {} actor stopped", self.id);
    }

    fn step(&mut self, batch: Vec<SessionMessage>) {
        let mut completion: Option<EndReason> = None;

        for msg in batch {
            match msg {
                SessionMessage::ChecksComplete { report, reply } => {
                    let result = self.on_checks_complete(&report);
                    // caller may have stopped waiting
                    let _ = reply.send(result);
                }
                SessionMessage::ConversationCompleted => {
                    completion.get_or_insert(EndReason::ConversationCompleted);
                }
                SessionMessage::Abandon(reason) => {
                    completion.get_or_insert(EndReason::Abandoned(reason));
                }
                SessionMessage::Host(signal) => self.on_host_signal(signal),
                SessionMessage::Face(event) => self.on_analyzer_event(event),
                SessionMessage::RestoreDue(ticket) => {
                    if let Some(resources) = self.resources.as_mut() {
                        resources.enforcement().on_restore_due(ticket);
                    }
                }
            }
        }

        let transition = state::evaluate(
            self.state,
            self.ledger.cumulative_weight(),
            self.config.termination_threshold,
            completion.as_ref(),
        );
        if let Some((next, reason)) = transition {
            self.finish(next, reason);
        }
        self.publish();
    }

    fn on_checks_complete(&mut self, report: &PreCheckReport) -> Result<(), SessionError> {
        if self.state != SessionState::PreCheck {
            return Err(SessionError::NotInPreCheck(self.state));
        }

        let verdict = match precheck::evaluate(report, self.config.face_confidence_threshold) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Session {} pre-check refused: {}", self.id, e);
                return Err(e);
            }
        };

        self.activate();

        if let PreCheckVerdict::ReadyDegraded(reason) = verdict {
            log::warn!("Session {} starting in fallback mode: {}", self.id, reason);
            self.degrade(reason);
        }
        Ok(())
    }

    fn activate(&mut self) {
        self.state = SessionState::Active;
        self.state_tx.send_replace(SessionState::Active);

        let analyzer = match self.frames.take() {
            Some(frames) => {
                let analyzer = FacePresenceAnalyzer::new(
                    Arc::clone(&self.config),
                    Arc::clone(&self.detector),
                    frames,
                    self.analyzer_sink(),
                );
                Some(tokio::spawn(analyzer.run()))
            }
            None => None,
        };

        let enforcement = EnforcementController::new(Arc::clone(&self.host), &self.config, self.restore_sink());
        self.resources = Some(SessionResources::acquire(enforcement, analyzer));

        log::info!("Session {} ACTIVE", self.id);
    }

    fn on_host_signal(&mut self, signal: HostSignal) {
        if self.state != SessionState::Active {
            return;
        }

        if let HostEvent::FullscreenChange { fullscreen: true } = signal.event {
            if let Some(resources) = self.resources.as_mut() {
                resources.enforcement().on_fullscreen_entered();
            }
        }

        if let Some(class) = signal.class {
            let violation = self
                .config
                .violation(class)
                .with_details(format!("host event: {}", signal.event.dom_name()));
            self.record(violation);
        }
    }

    fn on_analyzer_event(&mut self, event: AnalyzerEvent) {
        match event {
            AnalyzerEvent::ModelProgress(p) => self.feed.update(|s| s.model_progress = p),
            AnalyzerEvent::ModelReady { backend } => {
                log::info!("Session {} face monitoring on '{}'", self.id, backend);
                self.feed.update(|s| {
                    s.model_progress = 100;
                    s.monitoring = MonitoringHealth::Healthy;
                });
            }
            AnalyzerEvent::Violation(violation) => {
                if self.state == SessionState::Active {
                    self.record(violation);
                }
            }
            AnalyzerEvent::Degraded(reason) => {
                log::warn!("Session {} monitoring degraded: {}", self.id, reason);
                self.degrade(reason);
            }
        }
    }

    fn degrade(&mut self, reason: String) {
        self.monitoring_degraded = true;
        if let Some(resources) = self.resources.as_mut() {
            resources.enforcement().on_monitoring_degraded(&reason);
        }
        self.feed.update(|s| s.monitoring = MonitoringHealth::Degraded { reason });
    }

    fn record(&mut self, violation: Violation) {
        let class = violation.class;
        match self.ledger.record(violation) {
            Ok(total) => {
                log::info!(
                    "[VIOLATION] session={} class={} tier={} total={:.1}",
                    self.id,
                    class,
                    class.tier(),
                    total
                );
                if let Some(resources) = self.resources.as_mut() {
                    resources.enforcement().on_violation(class);
                }
            }
            Err(e) => log::error!("Session {}: {}", self.id, e),
        }
    }

    fn finish(&mut self, next: SessionState, reason: EndReason) {
        self.state = next;
        self.state_tx.send_replace(next);

        let actions = match self.resources.as_mut() {
            Some(resources) => {
                resources.release();
                resources.history().to_vec()
            }
            None => Vec::new(),
        };
        self.ledger.seal();

        let snapshot = self.ledger.snapshot();
        let completed = next == SessionState::Completed && snapshot.cumulative_weight < self.config.flag_threshold;

        let disposition = Disposition {
            session_id: self.id,
            interview_id: self.interview_id.clone(),
            state: next,
            violations: snapshot.violations,
            total_weight: snapshot.cumulative_weight,
            counts: snapshot.counts,
            completed,
            monitoring_degraded: self.monitoring_degraded,
            ended_at: Utc::now(),
            end_reason: reason,
            actions,
        };

        log::info!(
            "Session {} ended {} ({:?}): weight={:.1} violations={} completed={}",
            self.id,
            next,
            disposition.end_reason,
            disposition.total_weight,
            disposition.violations.len(),
            completed
        );

        if let Some(sink) = self.sink.clone() {
            let delivered = disposition.clone();
            tokio::spawn(async move {
                if let Err(e) = sink.deliver(&delivered).await {
                    log::error!("Disposition delivery via '{}' failed: {}", sink.name(), e);
                }
            });
        }
        self.disposition_tx.send_replace(Some(disposition));
        self.publish();
    }

    fn publish(&self) {
        let weight = self.ledger.cumulative_weight();
        let latest = self.ledger.latest().cloned();
        let banner = BannerLevel::for_weight(weight, &self.config);
        let state = self.state;
        self.feed.update(|s| {
            s.state = state;
            s.cumulative_weight = weight;
            s.latest_violation = latest;
            s.banner = banner;
        });
    }

    fn analyzer_sink(&self) -> AnalyzerSink {
        let tx = self.self_tx.clone();
        Box::new(move |event| match tx.upgrade() {
            Some(tx) => tx.send(SessionMessage::Face(event)).is_ok(),
            None => false,
        })
    }

    fn restore_sink(&self) -> RestoreSink {
        let tx = self.self_tx.clone();
        Arc::new(move |ticket| match tx.upgrade() {
            Some(tx) => tx.send(SessionMessage::RestoreDue(ticket)).is_ok(),
            None => false,
        })
    }
}
