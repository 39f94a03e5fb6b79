//! Session Scenarios - end-to-end controller runs
//!
//! A [`Scenario`] wires a real `SessionController` to the scripted engine and
//! the recording doubles, launches it and drains the license signal, leaving
//! a [`ScenarioRun`] to drive and inspect:
//! - permission gating
//! - license acceptance and rejection
//! - event delivery through the subscription
//! - drop-after-stop and idle teardown

use std::sync::Arc;
use std::time::Instant;

use facelens_core::{EngineDelivery, FacelensResult};
use facelens_present::DisplayState;
use facelens_session::{Collaborators, ControllerConfig, DeliveryOutcome, SessionController};

use crate::{
    EngineProbe, LicenseMode, PermissionRequests, RecordingRenderer, RecordingSink,
    RecordingSurface, ScriptedEngine, StaticPermissions,
};

// ============================================================================
// SCENARIO
// ============================================================================

pub type ScenarioController = SessionController<ScriptedEngine, StaticPermissions, RecordingSurface>;

/// Builder for one controller run
pub struct Scenario {
    config: ControllerConfig,
    script: Vec<EngineDelivery>,
    license: LicenseMode,
    permissions_granted: bool,
}

impl Scenario {
    pub fn new(config: ControllerConfig) -> Self {
        Scenario {
            config,
            script: Vec::new(),
            license: LicenseMode::Validate,
            permissions_granted: true,
        }
    }

    /// Flagged detection, basic + valence expressions
    pub fn flagged_dual() -> Self {
        Self::new(ControllerConfig::new("scenario"))
    }

    /// Split detection events, single expression model
    pub fn split_single() -> Self {
        Self::new(ControllerConfig::split_single("scenario"))
    }

    /// Deliveries the engine replays as soon as it starts
    pub fn with_script(mut self, script: Vec<EngineDelivery>) -> Self {
        self.script = script;
        self
    }

    pub fn with_license(mut self, license: LicenseMode) -> Self {
        self.license = license;
        self
    }

    pub fn with_permissions_denied(mut self) -> Self {
        self.permissions_granted = false;
        self
    }

    /// Build, launch at `now`, and handle whatever license signal is queued
    pub fn run(self, now: Instant) -> FacelensResult<ScenarioRun> {
        let engine = ScriptedEngine::new(self.script).with_license(self.license);
        let probe = engine.probe();
        let permissions = if self.permissions_granted {
            StaticPermissions::granted()
        } else {
            StaticPermissions::denied()
        };
        let permission_requests = permissions.requests();
        let renderer = Arc::new(RecordingRenderer::new());
        let sink = Arc::new(RecordingSink::new());
        let surface = RecordingSurface::new();

        let mut controller = SessionController::new(
            self.config,
            Collaborators {
                engine,
                permissions,
                host: surface.clone(),
                renderer: renderer.clone(),
                sink: sink.clone(),
            },
        )?;
        controller.launch(now)?;
        controller.drain_signals()?;

        Ok(ScenarioRun {
            controller,
            engine: probe,
            renderer,
            sink,
            surface,
            permission_requests,
        })
    }
}

// ============================================================================
// SCENARIO RUN
// ============================================================================

/// A launched controller plus every double it talks to
pub struct ScenarioRun {
    pub controller: ScenarioController,
    pub engine: EngineProbe,
    pub renderer: Arc<RecordingRenderer>,
    pub sink: Arc<RecordingSink>,
    pub surface: RecordingSurface,
    pub permission_requests: PermissionRequests,
}

impl ScenarioRun {
    /// Deliver one event as the engine would
    pub fn emit(&self, delivery: EngineDelivery) -> Option<DeliveryOutcome> {
        self.engine.emit(delivery)
    }

    /// Release a held license reply and let the controller handle it
    pub fn validate_license(&mut self) -> FacelensResult<bool> {
        if !self.engine.validate() {
            return Ok(false);
        }
        self.controller.drain_signals()?;
        Ok(true)
    }

    pub fn invalidate_license(&mut self) -> FacelensResult<bool> {
        if !self.engine.invalidate() {
            return Ok(false);
        }
        self.controller.drain_signals()?;
        Ok(true)
    }

    pub fn state(&self) -> Option<DisplayState> {
        self.controller.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use facelens_core::{
        AnalysisEvent, DetectionSignaling, EventError, EventTag, ExpressionVariant, FacelensError,
        Permission, PermissionGrants, PermissionSet,
    };
    use facelens_present::{AttentionPanel, EmotionIcon, ExpressionModel, FaceBox};
    use facelens_session::{IdleEvent, NoticeAction, NoticeKind, SessionPhase};

    use crate::{EventFuzzer, FuzzerConfig};

    #[test]
    fn test_face_then_attention_then_stop() {
        let mut run = Scenario::flagged_dual()
            .with_script(vec![
                Ok(AnalysisEvent::face(true)),
                Ok(AnalysisEvent::attention(true)),
            ])
            .run(Instant::now())
            .unwrap();

        assert_eq!(run.controller.phase(), SessionPhase::Running);
        let state = run.state().unwrap();
        assert!(state.face_box.highlighted);
        assert_eq!(state.face_box.stroke_width(), FaceBox::HIGHLIGHTED_STROKE);
        assert!(state.attention.visible);
        assert_eq!(state.attention.glyph, AttentionPanel::ATTENDING);

        run.controller.stop();
        assert_eq!(run.controller.phase(), SessionPhase::Stopped);
        assert_eq!(
            run.emit(Ok(AnalysisEvent::attention(false))),
            Some(DeliveryOutcome::Dropped)
        );
        let last = run.controller.last_state().unwrap();
        assert_eq!(last.attention.glyph, AttentionPanel::ATTENDING);
        // initial paint plus two reductions; nothing after stop
        assert_eq!(run.renderer.count(), 3);
        assert_eq!(run.sink.count(), 2);
    }

    #[test]
    fn test_late_deliveries_counted_after_stop() {
        let mut run = Scenario::flagged_dual()
            .with_script(vec![Ok(AnalysisEvent::face(true))])
            .run(Instant::now())
            .unwrap();

        run.controller.stop();
        assert!(run.controller.snapshot().is_none());
        for _ in 0..2 {
            assert_eq!(
                run.emit(Ok(AnalysisEvent::attention(true))),
                Some(DeliveryOutcome::Dropped)
            );
        }

        let stats = run.controller.delivery_stats();
        assert_eq!(stats.applied, 1);
        assert_eq!(stats.dropped, 2);
        assert_eq!(stats.total(), 3);
        assert!(run.controller.last_state().unwrap().face_box.highlighted);
    }

    #[test]
    fn test_expression_head_pose_and_out_of_range() {
        let run = Scenario::flagged_dual()
            .with_script(vec![
                Ok(AnalysisEvent::face(true)),
                Ok(AnalysisEvent::basic_expression(3, "happy")),
                Ok(AnalysisEvent::head_pose(2.5, -2.5, 0.49)),
                Ok(AnalysisEvent::basic_expression(9, "bogus")),
            ])
            .run(Instant::now())
            .unwrap();

        let state = run.state().unwrap();
        let basic = state.expression_panel(ExpressionModel::Basic).unwrap();
        assert!(basic.visible);
        assert_eq!(basic.icon(), Some(EmotionIcon::Happy));
        assert_eq!(basic.label, "happy");
        assert!(!state.expression_panel(ExpressionModel::Valence).unwrap().visible);
        assert_eq!(state.head_pose.text, "3, -2, 0");
        assert_eq!(run.sink.violations(), 1);
        assert_eq!(run.controller.delivery_stats().skipped, 1);
    }

    #[test]
    fn test_engine_errors_are_local() {
        let run = Scenario::flagged_dual()
            .with_script(vec![
                Ok(AnalysisEvent::face(true)),
                Err(EventError::new(EventTag::Attention, 7, "tracker reset")),
                Ok(AnalysisEvent::attention(false)),
            ])
            .run(Instant::now())
            .unwrap();

        assert_eq!(run.controller.phase(), SessionPhase::Running);
        assert_eq!(run.sink.failures(), 1);
        assert_eq!(run.state().unwrap().attention.glyph, AttentionPanel::NOT_ATTENDING);
    }

    #[test]
    fn test_split_single_profile() {
        let run = Scenario::split_single()
            .with_script(vec![
                Ok(AnalysisEvent::face(true)),
                Ok(AnalysisEvent::single_expression(5, "surprise")),
                Ok(AnalysisEvent::basic_expression(1, "wrong shape")),
                Ok(AnalysisEvent::FaceNotDetected),
            ])
            .run(Instant::now())
            .unwrap();

        let state = run.state().unwrap();
        assert_eq!(state.expression_variant(), ExpressionVariant::Single);
        assert!(!state.face_box.highlighted);
        assert!(!state.any_panel_visible());
        // content survives hiding
        assert_eq!(state.basic.icon(), Some(EmotionIcon::Surprise));
        assert_eq!(run.sink.violations(), 1);
        assert!(!run.engine.config().unwrap().recognize_valence_expression());
    }

    #[test]
    fn test_detection_shape_not_enforced() {
        let run = Scenario::split_single()
            .with_script(vec![
                Ok(AnalysisEvent::face(true)),
                Ok(AnalysisEvent::attention(true)),
            ])
            .run(Instant::now())
            .unwrap();
        assert_eq!(
            run.controller.config().profile.detection,
            DetectionSignaling::SplitEvents
        );

        assert_eq!(
            run.emit(Ok(AnalysisEvent::face(false))),
            Some(DeliveryOutcome::Applied { changed: true })
        );
        let state = run.state().unwrap();
        assert!(!state.face_box.highlighted);
        assert!(!state.any_panel_visible());
        assert_eq!(run.sink.violations(), 0);
    }

    #[test]
    fn test_disabled_features_are_not_emitted() {
        let config = ControllerConfig::new("scenario").with_session(
            facelens_core::SessionConfig::default().with_detect_face(false),
        );
        let run = Scenario::new(config)
            .with_script(vec![
                Ok(AnalysisEvent::face(true)),
                Ok(AnalysisEvent::attention(true)),
            ])
            .run(Instant::now())
            .unwrap();
        assert!(run.engine.outcomes().is_empty());
        assert_eq!(run.state(), Some(DisplayState::initial(ExpressionVariant::Dual)));
    }

    #[test]
    fn test_permission_flow() {
        let mut run = Scenario::flagged_dual()
            .with_permissions_denied()
            .run(Instant::now())
            .unwrap();
        assert_eq!(run.permission_requests.count(), 1);
        assert_eq!(run.controller.phase(), SessionPhase::Running);

        let set = PermissionSet::required();
        run.controller
            .on_permission_result(&PermissionGrants::denying(&set, &[Permission::Camera]));
        let notices = run.surface.notices();
        assert_eq!(notices.len(), 1);
        assert!(!notices[0].cancelable);

        run.controller
            .on_notice_action(NoticeKind::PermissionRequired, NoticeAction::Allow)
            .unwrap();
        assert_eq!(run.permission_requests.count(), 2);
        assert_eq!(run.controller.phase(), SessionPhase::Running);
    }

    #[test]
    fn test_manual_license_rejection() {
        let mut run = Scenario::flagged_dual()
            .with_license(LicenseMode::Manual)
            .with_script(vec![Ok(AnalysisEvent::face(true))])
            .run(Instant::now())
            .unwrap();
        assert_eq!(run.controller.phase(), SessionPhase::AwaitingLicense);
        assert!(run.state().is_none());

        assert!(run.invalidate_license().unwrap());
        assert_eq!(run.controller.phase(), SessionPhase::Rejected);
        assert_eq!(run.surface.shown(), vec![NoticeKind::InvalidLicense]);
        assert!(run.surface.notices()[0].transient);
        assert_eq!(run.engine.starts(), 0);
        assert_eq!(run.emit(Ok(AnalysisEvent::face(true))), None);
        assert!(!run.validate_license().unwrap());
    }

    #[test]
    fn test_engine_start_failure() {
        let engine = ScriptedEngine::silent().with_start_error("camera busy");
        let probe = engine.probe();
        let mut controller = SessionController::new(
            ControllerConfig::new("scenario"),
            Collaborators {
                engine,
                permissions: StaticPermissions::granted(),
                host: RecordingSurface::new(),
                renderer: Arc::new(RecordingRenderer::new()),
                sink: Arc::new(RecordingSink::new()),
            },
        )
        .unwrap();
        controller.launch(Instant::now()).unwrap();
        let err = controller.drain_signals().unwrap_err();
        assert!(matches!(err, FacelensError::Engine(_)));
        assert_eq!(controller.phase(), SessionPhase::Stopped);
        assert_eq!(probe.stops(), 1);
    }

    #[test]
    fn test_idle_timeout_after_running() {
        let start = Instant::now();
        let mut run = Scenario::flagged_dual()
            .with_script(vec![Ok(AnalysisEvent::face(true))])
            .run(start)
            .unwrap();

        assert_eq!(run.controller.next_deadline(), Some(start + Duration::from_secs(120)));
        assert_eq!(
            run.controller.tick(start + Duration::from_secs(120)),
            Some(IdleEvent::NoticeDue)
        );
        // still live during the grace period
        assert_eq!(
            run.emit(Ok(AnalysisEvent::attention(true))),
            Some(DeliveryOutcome::Applied { changed: true })
        );
        assert_eq!(
            run.controller.tick(start + Duration::from_secs(125)),
            Some(IdleEvent::GraceElapsed)
        );
        assert_eq!(run.controller.phase(), SessionPhase::Stopped);
        assert_eq!(run.surface.finished(), 1);
        assert_eq!(
            run.emit(Ok(AnalysisEvent::attention(false))),
            Some(DeliveryOutcome::Dropped)
        );
        assert_eq!(run.controller.delivery_stats().dropped, 1);
        assert_eq!(run.engine.stops(), 1);
    }

    #[test]
    fn test_fuzzed_stream_through_session() {
        let config = FuzzerConfig::light();
        let script = EventFuzzer::new(config.clone()).generate();
        let run = Scenario::flagged_dual()
            .with_script(script)
            .run(Instant::now())
            .unwrap();

        let stats = run.controller.delivery_stats();
        assert_eq!(stats.total() as usize, config.event_count);
        assert_eq!(stats.dropped, 0);
        assert_eq!(run.sink.count(), config.event_count);
        assert_eq!(run.renderer.count(), config.event_count + 1);
    }
}
