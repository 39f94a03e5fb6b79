//! Event subscription - the only path from the engine to a DisplayState
//!
//! The controller keeps the [`Subscription`]; the engine gets cloned
//! [`EventSink`]s. Cancelling the subscription takes the state out under the
//! same lock `deliver` uses, so once `cancel` returns no delivery can touch
//! the discarded state.

use std::sync::Arc;

use parking_lot::Mutex;

use facelens_core::{delivery_tag, EngineDelivery, SessionId};
use facelens_present::{reduce, Diagnostic, DisplayState};

use crate::{ObservabilitySink, Renderer};

/// What happened to one delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Reduced; `changed` tells whether the state moved
    Applied { changed: bool },
    /// Engine reported an error; state untouched
    Failed,
    /// Contract violation; state untouched
    Skipped,
    /// Arrived after the session stopped
    Dropped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub applied: u64,
    pub failed: u64,
    pub skipped: u64,
    pub dropped: u64,
}

impl DeliveryStats {
    pub fn total(&self) -> u64 {
        self.applied + self.failed + self.skipped + self.dropped
    }
}

struct Inner {
    session: SessionId,
    state: Option<DisplayState>,
    stats: DeliveryStats,
}

struct Shared {
    inner: Mutex<Inner>,
    renderer: Arc<dyn Renderer>,
    sink: Arc<dyn ObservabilitySink>,
}

/// Engine-facing handle; cheap to clone, dead after the session stops
#[derive(Clone)]
pub struct EventSink {
    shared: Arc<Shared>,
}

impl EventSink {
    /// Apply one delivery, in arrival order
    pub fn deliver(&self, delivery: EngineDelivery) -> DeliveryOutcome {
        let mut inner = self.shared.inner.lock();

        let Some(state) = inner.state.as_ref() else {
            inner.stats.dropped += 1;
            tracing::trace!(
                session = %inner.session,
                tag = %delivery_tag(&delivery),
                "delivery after stop dropped"
            );
            return DeliveryOutcome::Dropped;
        };

        let reduction = reduce(state, &delivery);
        self.shared
            .sink
            .record(reduction.diagnostic.tag(), &reduction.diagnostic);

        let outcome = match &reduction.diagnostic {
            Diagnostic::Observed { .. } => {
                inner.stats.applied += 1;
                DeliveryOutcome::Applied {
                    changed: reduction.changed,
                }
            }
            Diagnostic::EventFailed(_) => {
                inner.stats.failed += 1;
                DeliveryOutcome::Failed
            }
            Diagnostic::PayloadOutOfRange { .. } | Diagnostic::ProfileMismatch { .. } => {
                inner.stats.skipped += 1;
                DeliveryOutcome::Skipped
            }
        };

        self.shared.renderer.render(&reduction.state);
        inner.state = Some(reduction.state);
        outcome
    }

    pub fn is_open(&self) -> bool {
        self.shared.inner.lock().state.is_some()
    }

    pub fn session(&self) -> SessionId {
        self.shared.inner.lock().session
    }

    pub fn stats(&self) -> DeliveryStats {
        self.shared.inner.lock().stats
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("EventSink")
            .field("session", &inner.session)
            .field("open", &inner.state.is_some())
            .finish()
    }
}

/// Controller-owned side of a session's event stream
pub struct Subscription {
    shared: Arc<Shared>,
}

impl Subscription {
    /// Open a stream over a fresh state and paint it once
    pub fn open(
        session: SessionId,
        initial: DisplayState,
        renderer: Arc<dyn Renderer>,
        sink: Arc<dyn ObservabilitySink>,
    ) -> Self {
        renderer.render(&initial);
        Subscription {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    session,
                    state: Some(initial),
                    stats: DeliveryStats::default(),
                }),
                renderer,
                sink,
            }),
        }
    }

    pub fn sink(&self) -> EventSink {
        EventSink {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn session(&self) -> SessionId {
        self.shared.inner.lock().session
    }

    pub fn snapshot(&self) -> Option<DisplayState> {
        self.shared.inner.lock().state.clone()
    }

    pub fn stats(&self) -> DeliveryStats {
        self.shared.inner.lock().stats
    }

    /// Discard the state; later deliveries are dropped. Idempotent.
    pub fn cancel(&self) -> Option<DisplayState> {
        self.shared.inner.lock().state.take()
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.inner.lock().state.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
