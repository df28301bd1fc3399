//! Caller-side handle to a running session

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use super::actor::SessionMessage;
use super::disposition::Disposition;
use super::precheck::PreCheckReport;
use super::state::SessionState;
use super::SessionError;
use crate::logic::events::LiveStatus;
use crate::logic::signals::{SignalSink, SignalSubscription};

#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    tx: mpsc::UnboundedSender<SessionMessage>,
    state: watch::Receiver<SessionState>,
    live: watch::Receiver<LiveStatus>,
    disposition: watch::Receiver<Option<Disposition>>,
}

impl SessionHandle {
    pub(super) fn new(
        id: Uuid,
        tx: mpsc::UnboundedSender<SessionMessage>,
        state: watch::Receiver<SessionState>,
        live: watch::Receiver<LiveStatus>,
        disposition: watch::Receiver<Option<Disposition>>,
    ) -> Self {
        Self { id, tx, state, live, disposition }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Latest-value stream for UI banners
    pub fn live(&self) -> watch::Receiver<LiveStatus> {
        self.live.clone()
    }

    /// Subscription for the host's event listeners
    pub fn signals(&self) -> SignalSubscription {
        let tx = self.tx.clone();
        let sink: SignalSink = Arc::new(move |signal| tx.send(SessionMessage::Host(signal)).is_ok());
        SignalSubscription::new(sink, self.state.clone())
    }

    /// PRE_CHECK -> ACTIVE; refused reports leave the session in PRE_CHECK
    pub async fn checks_complete(&self, report: PreCheckReport) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionMessage::ChecksComplete { report, reply })
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Natural conclusion; `false` when the session had already ended
    pub fn conversation_completed(&self) -> bool {
        self.send(SessionMessage::ConversationCompleted)
    }

    pub fn abandon(&self, reason: impl Into<String>) -> bool {
        self.send(SessionMessage::Abandon(reason.into()))
    }

    /// Waits for the terminal transition
    pub async fn disposition(&self) -> Result<Disposition, SessionError> {
        let mut rx = self.disposition.clone();
        let ready = rx
            .wait_for(|d| d.is_some())
            .await
            .map_err(|_| SessionError::Closed)?;
        (*ready).clone().ok_or(SessionError::Closed)
    }

    fn send(&self, msg: SessionMessage) -> bool {
        let delivered = self.tx.send(msg).is_ok();
        if !delivered {
            log::debug!("Session {} already ended; message ignored", self.id);
        }
        delivered
    }
}
