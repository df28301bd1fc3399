//! Signal Collector
//!
//! Classifies host events into violation classes and hands the host a
//! synchronous verdict. The subscription is live only while the session is
//! ACTIVE; after teardown every dispatch is ignored.

use std::sync::Arc;

use tokio::sync::watch;

use super::types::{HostEvent, HostSignal, HostVerdict};
use crate::logic::enforcement;
use crate::logic::session::SessionState;
use crate::logic::violation::ViolationClass;

/// Forwards a classified signal; `false` once the session stopped listening
pub type SignalSink = Arc<dyn Fn(HostSignal) -> bool + Send + Sync>;

/// Fixed host-event mapping; `None` means no violation
pub fn classify(event: &HostEvent) -> Option<ViolationClass> {
    match event {
        HostEvent::VisibilityChange { hidden: true } => Some(ViolationClass::TabSwitch),
        HostEvent::VisibilityChange { hidden: false } => None,
        HostEvent::WindowBlur => Some(ViolationClass::WindowBlur),
        HostEvent::WindowFocus => None,
        HostEvent::Copy | HostEvent::Paste | HostEvent::Cut => Some(ViolationClass::CopyPaste),
        HostEvent::FullscreenChange { fullscreen: false } => Some(ViolationClass::FullscreenExit),
        HostEvent::FullscreenChange { fullscreen: true } => None,
    }
}

/// Handle the host registers its listeners against
#[derive(Clone)]
pub struct SignalSubscription {
    sink: SignalSink,
    state: watch::Receiver<SessionState>,
}

impl SignalSubscription {
    pub fn new(sink: SignalSink, state: watch::Receiver<SessionState>) -> Self {
        Self { sink, state }
    }

    pub fn is_live(&self) -> bool {
        *self.state.borrow() == SessionState::Active
    }

    /// Called from inside the host's event handler
    pub fn dispatch(&self, event: HostEvent) -> HostVerdict {
        if !self.is_live() {
            return HostVerdict::Ignored;
        }

        let class = classify(&event);
        let verdict = match class {
            Some(class) => enforcement::host_verdict(class),
            None => HostVerdict::Allowed,
        };

        if !(self.sink)(HostSignal { event, class }) {
            log::debug!("Signal '{}' after teardown ignored", event.dom_name());
            return HostVerdict::Ignored;
        }

        if let Some(class) = class {
            log::debug!("[SIGNAL] {} -> {} ({:?})", event.dom_name(), class, verdict);
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc;

    #[test]
    fn test_fixed_mapping() {
        assert_eq!(classify(&HostEvent::VisibilityChange { hidden: true }), Some(ViolationClass::TabSwitch));
        assert_eq!(classify(&HostEvent::VisibilityChange { hidden: false }), None);
        assert_eq!(classify(&HostEvent::WindowBlur), Some(ViolationClass::WindowBlur));
        assert_eq!(classify(&HostEvent::WindowFocus), None);
        assert_eq!(classify(&HostEvent::Copy), Some(ViolationClass::CopyPaste));
        assert_eq!(classify(&HostEvent::Paste), Some(ViolationClass::CopyPaste));
        assert_eq!(classify(&HostEvent::Cut), Some(ViolationClass::CopyPaste));
        assert_eq!(classify(&HostEvent::FullscreenChange { fullscreen: false }), Some(ViolationClass::FullscreenExit));
        assert_eq!(classify(&HostEvent::FullscreenChange { fullscreen: true }), None);
    }

    fn subscription(state: SessionState) -> (SignalSubscription, mpsc::UnboundedReceiver<HostSignal>, watch::Sender<SessionState>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(state);
        let sink: SignalSink = Arc::new(move |s| tx.send(s).is_ok());
        (SignalSubscription::new(sink, state_rx), rx, state_tx)
    }

    #[test]
    fn test_clipboard_suppressed_when_active() {
        let (sub, mut rx, _state) = subscription(SessionState::Active);

        assert_eq!(sub.dispatch(HostEvent::Paste), HostVerdict::SuppressDefault);
        assert_eq!(sub.dispatch(HostEvent::WindowBlur), HostVerdict::Recorded);
        assert_eq!(sub.dispatch(HostEvent::WindowFocus), HostVerdict::Allowed);

        assert_eq!(rx.try_recv().unwrap().class, Some(ViolationClass::CopyPaste));
        assert_eq!(rx.try_recv().unwrap().class, Some(ViolationClass::WindowBlur));
        assert_eq!(rx.try_recv().unwrap().class, None);
    }

    #[test]
    fn test_ignored_outside_active() {
        let (sub, mut rx, state) = subscription(SessionState::PreCheck);
        assert_eq!(sub.dispatch(HostEvent::Copy), HostVerdict::Ignored);

        state.send(SessionState::Completed).unwrap();
        assert_eq!(sub.dispatch(HostEvent::WindowBlur), HostVerdict::Ignored);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_sink_ignores() {
        let open = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&open);
        let sink: SignalSink = Arc::new(move |_| flag.load(Ordering::SeqCst));
        let (_state_tx, state_rx) = watch::channel(SessionState::Active);
        let sub = SignalSubscription::new(sink, state_rx);

        assert_eq!(sub.dispatch(HostEvent::Copy), HostVerdict::SuppressDefault);
        open.store(false, Ordering::SeqCst);
        assert_eq!(sub.dispatch(HostEvent::Copy), HostVerdict::Ignored);
    }
}
