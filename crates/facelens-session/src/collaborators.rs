//! External collaborators, interfaces only
//!
//! The engine, the OS permission authority, the rendering surface and the
//! host screen are owned elsewhere. The controller talks to them through
//! these traits.

use tokio::sync::mpsc::UnboundedSender;

use facelens_core::{EventTag, FacelensResult, PermissionSet, SessionConfig};
use facelens_present::{Diagnostic, DisplayState};

use crate::{EventSink, Notice, NoticeKind};

/// Asynchronous inputs for the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    LicenseValidated,
    LicenseInvalidated,
}

/// One-shot license callback handed to the engine at initialization
///
/// Consuming `self` makes a second verdict impossible.
#[derive(Debug)]
pub struct LicenseReply {
    signals: UnboundedSender<SessionSignal>,
}

impl LicenseReply {
    pub(crate) fn new(signals: UnboundedSender<SessionSignal>) -> Self {
        Self { signals }
    }

    pub fn validated(self) {
        // A closed channel means the controller is gone; nothing to notify
        let _ = self.signals.send(SessionSignal::LicenseValidated);
    }

    pub fn invalidated(self) {
        let _ = self.signals.send(SessionSignal::LicenseInvalidated);
    }
}

/// The face-analysis engine
pub trait AnalysisEngine {
    /// Begin license validation; the verdict arrives later through `license`
    fn initialize(&mut self, app_id: &str, license: LicenseReply) -> FacelensResult<()>;

    /// Start emitting events into `events`, one at a time, until `stop`
    fn start(&mut self, config: &SessionConfig, events: EventSink) -> FacelensResult<()>;

    /// Cease callbacks. Must be idempotent.
    fn stop(&mut self);
}

/// Host OS permission authority
pub trait PermissionAuthority {
    fn check_granted(&self, permissions: &PermissionSet) -> bool;

    /// Prompt the user; the result comes back through the host
    fn request(&mut self, permissions: &PermissionSet);
}

/// Paints display state snapshots
///
/// Called with the lock of the delivering subscription held, so it must not
/// deliver events itself. Repeated identical snapshots must be a visual no-op.
pub trait Renderer: Send + Sync {
    fn render(&self, state: &DisplayState);
}

/// Fire-and-forget diagnostics, `(tag, record)` pairs
pub trait ObservabilitySink: Send + Sync {
    fn record(&self, tag: EventTag, diagnostic: &Diagnostic);
}

/// The screen hosting the session: dialogs, toasts, closing itself
pub trait HostSurface {
    fn show_notice(&mut self, notice: &Notice);
    fn dismiss_notice(&mut self, kind: NoticeKind);
    /// Close the host screen; the session is already stopped
    fn finish(&mut self);
}

/// Everything a controller talks to
pub struct Collaborators<E, P, H> {
    pub engine: E,
    pub permissions: P,
    pub host: H,
    pub renderer: std::sync::Arc<dyn Renderer>,
    pub sink: std::sync::Arc<dyn ObservabilitySink>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_license_reply_sends_one_signal() {
        let (tx, mut rx) = unbounded_channel();
        LicenseReply::new(tx.clone()).validated();
        LicenseReply::new(tx).invalidated();
        assert_eq!(rx.try_recv().ok(), Some(SessionSignal::LicenseValidated));
        assert_eq!(rx.try_recv().ok(), Some(SessionSignal::LicenseInvalidated));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_license_reply_after_receiver_dropped() {
        let (tx, rx) = unbounded_channel();
        drop(rx);
        // must not panic
        LicenseReply::new(tx).validated();
    }
}
