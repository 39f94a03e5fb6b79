//! Recording collaborators
//!
//! Each double remembers what it was asked to do. They are `Send + Sync` so
//! they can sit behind the `Arc`s a controller holds, and the surface and
//! permission doubles are cheap clones sharing one log.

use std::sync::Arc;

use parking_lot::Mutex;

use facelens_core::{EventTag, PermissionSet};
use facelens_present::{Diagnostic, DisplayState};
use facelens_session::{HostSurface, Notice, NoticeKind, ObservabilitySink, PermissionAuthority, Renderer};

/// Keeps every rendered frame
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    frames: Mutex<Vec<DisplayState>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<DisplayState> {
        self.frames.lock().clone()
    }

    pub fn last(&self) -> Option<DisplayState> {
        self.frames.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.frames.lock().len()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, state: &DisplayState) {
        self.frames.lock().push(state.clone());
    }
}

/// Keeps every `(tag, diagnostic)` pair
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<(EventTag, Diagnostic)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(EventTag, Diagnostic)> {
        self.records.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.records.lock().len()
    }

    pub fn failures(&self) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|(_, d)| matches!(d, Diagnostic::EventFailed(_)))
            .count()
    }

    pub fn violations(&self) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|(_, d)| d.is_contract_violation())
            .count()
    }
}

impl ObservabilitySink for RecordingSink {
    fn record(&self, tag: EventTag, diagnostic: &Diagnostic) {
        self.records.lock().push((tag, diagnostic.clone()));
    }
}

#[derive(Debug, Default)]
struct SurfaceLog {
    notices: Vec<Notice>,
    dismissed: Vec<NoticeKind>,
    finished: usize,
}

/// Host surface recording notices and finish requests
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    log: Arc<Mutex<SurfaceLog>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.log.lock().notices.clone()
    }

    /// Kinds of every notice shown, in order
    pub fn shown(&self) -> Vec<NoticeKind> {
        self.log.lock().notices.iter().map(|n| n.kind).collect()
    }

    pub fn dismissed(&self) -> Vec<NoticeKind> {
        self.log.lock().dismissed.clone()
    }

    pub fn finished(&self) -> usize {
        self.log.lock().finished
    }
}

impl HostSurface for RecordingSurface {
    fn show_notice(&mut self, notice: &Notice) {
        self.log.lock().notices.push(notice.clone());
    }

    fn dismiss_notice(&mut self, kind: NoticeKind) {
        self.log.lock().dismissed.push(kind);
    }

    fn finish(&mut self) {
        self.log.lock().finished += 1;
    }
}

/// Shared log of permission requests
#[derive(Debug, Clone, Default)]
pub struct PermissionRequests(Arc<Mutex<Vec<PermissionSet>>>);

impl PermissionRequests {
    pub fn count(&self) -> usize {
        self.0.lock().len()
    }

    pub fn last(&self) -> Option<PermissionSet> {
        self.0.lock().last().cloned()
    }
}

/// Permission authority with a fixed answer
#[derive(Debug, Clone)]
pub struct StaticPermissions {
    granted: bool,
    requests: PermissionRequests,
}

impl StaticPermissions {
    pub fn granted() -> Self {
        StaticPermissions {
            granted: true,
            requests: PermissionRequests::default(),
        }
    }

    pub fn denied() -> Self {
        StaticPermissions {
            granted: false,
            requests: PermissionRequests::default(),
        }
    }

    pub fn requests(&self) -> PermissionRequests {
        self.requests.clone()
    }
}

impl PermissionAuthority for StaticPermissions {
    fn check_granted(&self, _permissions: &PermissionSet) -> bool {
        self.granted
    }

    fn request(&mut self, permissions: &PermissionSet) {
        self.requests.0.lock().push(permissions.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facelens_core::{EventError, ExpressionVariant};

    #[test]
    fn test_surface_clones_share_log() {
        let surface = RecordingSurface::new();
        let mut other = surface.clone();
        other.show_notice(&Notice::invalid_license());
        other.finish();
        assert_eq!(surface.shown(), vec![NoticeKind::InvalidLicense]);
        assert_eq!(surface.finished(), 1);
    }

    #[test]
    fn test_sink_counts() {
        let sink = RecordingSink::new();
        sink.record(
            EventTag::HeadPose,
            &Diagnostic::EventFailed(EventError::new(EventTag::HeadPose, 3, "lost")),
        );
        sink.record(
            EventTag::FacialExpression,
            &Diagnostic::ProfileMismatch {
                tag: EventTag::FacialExpression,
                expected: ExpressionVariant::Single,
                found: ExpressionVariant::Dual,
            },
        );
        assert_eq!(sink.count(), 2);
        assert_eq!(sink.failures(), 1);
        assert_eq!(sink.violations(), 1);
    }

    #[test]
    fn test_permission_requests_logged() {
        let mut permissions = StaticPermissions::denied();
        let requests = permissions.requests();
        assert!(!permissions.check_granted(&PermissionSet::required()));
        permissions.request(&PermissionSet::required());
        assert_eq!(requests.count(), 1);
        assert_eq!(requests.last(), Some(PermissionSet::required()));
    }
}
