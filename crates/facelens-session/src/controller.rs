//! Session Controller - permission gating, license gate, start/stop, idle teardown
//!
//! The controller is driven from the outside: the host calls [`launch`],
//! forwards permission results and notice actions, feeds license signals
//! through [`drain_signals`] (or [`handle_signal`] when it owns the receiver)
//! and calls [`tick`] with the current time so the idle timer can fire.
//!
//! [`launch`]: SessionController::launch
//! [`drain_signals`]: SessionController::drain_signals
//! [`handle_signal`]: SessionController::handle_signal
//! [`tick`]: SessionController::tick

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use facelens_core::{
    FacelensError, FacelensResult, Permission, PermissionGrants, PermissionSet,
    PresentationProfile, SessionConfig, SessionId,
};
use facelens_present::DisplayState;

use crate::{
    AnalysisEngine, Collaborators, DeliveryStats, HostSurface, IdleEvent, IdleTimeoutConfig,
    IdleTimer, LicenseReply, Notice, NoticeAction, NoticeKind, ObservabilitySink,
    PermissionAuthority, Renderer, SessionSignal, Subscription,
};

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Unstarted,
    /// Permissions requested; does not block initialization
    PermissionPending,
    Initializing,
    AwaitingLicense,
    Running,
    Stopped,
    /// License invalid; absorbing
    Rejected,
}

impl SessionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Unstarted => "unstarted",
            SessionPhase::PermissionPending => "permission_pending",
            SessionPhase::Initializing => "initializing",
            SessionPhase::AwaitingLicense => "awaiting_license",
            SessionPhase::Running => "running",
            SessionPhase::Stopped => "stopped",
            SessionPhase::Rejected => "rejected",
        }
    }

    /// No further lifecycle transitions except teardown
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Stopped | SessionPhase::Rejected)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Controller configuration
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerConfig {
    /// Application identifier passed to the engine
    pub app_id: String,
    pub session: SessionConfig,
    pub profile: PresentationProfile,
    pub idle: IdleTimeoutConfig,
    pub permissions: PermissionSet,
    /// Body of the idle-timeout notice
    pub idle_message: String,
}

impl ControllerConfig {
    pub const DEFAULT_IDLE_MESSAGE: &'static str =
        "The session has been idle too long and will now close.";

    pub fn new(app_id: impl Into<String>) -> Self {
        ControllerConfig {
            app_id: app_id.into(),
            ..Default::default()
        }
    }

    /// Single expression model with split detection events
    pub fn split_single(app_id: impl Into<String>) -> Self {
        let profile = PresentationProfile::split_single();
        ControllerConfig {
            app_id: app_id.into(),
            session: SessionConfig::default().with_expression_variant(profile.expression),
            profile,
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub fn with_idle(mut self, idle: IdleTimeoutConfig) -> Self {
        self.idle = idle;
        self
    }

    pub fn with_idle_message(mut self, message: impl Into<String>) -> Self {
        self.idle_message = message.into();
        self
    }

    pub fn validate(&self) -> FacelensResult<()> {
        if self.app_id.trim().is_empty() {
            return Err(FacelensError::Config("app_id must not be empty".into()));
        }
        if self.session.expression_variant() != self.profile.expression {
            return Err(FacelensError::Config(format!(
                "session expression variant {:?} does not match profile {:?}",
                self.session.expression_variant(),
                self.profile.expression
            )));
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            app_id: String::new(),
            session: SessionConfig::default(),
            profile: PresentationProfile::flagged_dual(),
            idle: IdleTimeoutConfig::default(),
            permissions: PermissionSet::required(),
            idle_message: Self::DEFAULT_IDLE_MESSAGE.to_string(),
        }
    }
}

/// Drives one session from launch to teardown
pub struct SessionController<E: AnalysisEngine, P: PermissionAuthority, H: HostSurface> {
    config: ControllerConfig,
    engine: E,
    permissions: P,
    host: H,
    renderer: Arc<dyn Renderer>,
    sink: Arc<dyn ObservabilitySink>,

    phase: SessionPhase,
    idle: IdleTimer,
    signals_tx: UnboundedSender<SessionSignal>,
    signals_rx: Option<UnboundedReceiver<SessionSignal>>,

    /// Kept after cancellation so late deliveries stay counted
    subscription: Option<Subscription>,
    session_id: SessionId,
    last_state: Option<DisplayState>,

    engine_initialized: bool,
    released: bool,
}

impl<E: AnalysisEngine, P: PermissionAuthority, H: HostSurface> SessionController<E, P, H> {
    pub fn new(config: ControllerConfig, collaborators: Collaborators<E, P, H>) -> FacelensResult<Self> {
        config.validate()?;
        let (signals_tx, signals_rx) = unbounded_channel();
        Ok(SessionController {
            idle: IdleTimer::new(config.idle.clone()),
            config,
            engine: collaborators.engine,
            permissions: collaborators.permissions,
            host: collaborators.host,
            renderer: collaborators.renderer,
            sink: collaborators.sink,
            phase: SessionPhase::Unstarted,
            signals_tx,
            signals_rx: Some(signals_rx),
            subscription: None,
            session_id: SessionId::ZERO,
            last_state: None,
            engine_initialized: false,
            released: false,
        })
    }

    /// Check permissions, arm the idle timer and initialize the engine
    pub fn launch(&mut self, now: Instant) -> FacelensResult<()> {
        self.expect_phase(SessionPhase::Unstarted, "launch")?;

        if !self.permissions.check_granted(&self.config.permissions) {
            self.enter(SessionPhase::PermissionPending);
            self.permissions.request(&self.config.permissions);
        }

        self.enter(SessionPhase::Initializing);
        self.idle.arm(now);

        let reply = LicenseReply::new(self.signals_tx.clone());
        if let Err(e) = self.engine.initialize(&self.config.app_id, reply) {
            warn!(error = %e, "engine initialization failed");
            self.stop();
            return Err(e);
        }
        self.engine_initialized = true;
        self.enter(SessionPhase::AwaitingLicense);
        Ok(())
    }

    /// Result of a permission request; camera denial asks the user again
    pub fn on_permission_result(&mut self, grants: &PermissionGrants) {
        if self.phase.is_terminal() {
            debug!(phase = %self.phase, "permission result after teardown ignored");
            return;
        }
        for denial in grants.denials() {
            warn!(error = %denial, "permission request refused");
        }
        if grants.is_denied(Permission::Camera) {
            self.host.show_notice(&Notice::permission_required());
        }
    }

    /// The user picked an action on a notice
    pub fn on_notice_action(&mut self, kind: NoticeKind, action: NoticeAction) -> FacelensResult<()> {
        match (kind, action) {
            (NoticeKind::PermissionRequired, NoticeAction::Allow) => {
                self.host.dismiss_notice(kind);
                if !self.phase.is_terminal() {
                    self.permissions.request(&self.config.permissions);
                }
            }
            (NoticeKind::PermissionRequired, NoticeAction::Deny)
            | (NoticeKind::IdleTimeout, NoticeAction::Ok) => {
                self.host.dismiss_notice(kind);
                self.stop();
                self.host.finish();
            }
            (NoticeKind::InvalidLicense, _) => self.host.dismiss_notice(kind),
            _ => {
                return Err(FacelensError::InvalidTransition {
                    from: format!("{kind:?} notice"),
                    op: "notice action",
                })
            }
        }
        Ok(())
    }

    /// Receiver of license signals, for hosts that await them directly.
    /// Once taken, `drain_signals` has nothing to read.
    pub fn take_signals(&mut self) -> Option<UnboundedReceiver<SessionSignal>> {
        self.signals_rx.take()
    }

    /// Handle every signal queued so far; returns how many were handled
    pub fn drain_signals(&mut self) -> FacelensResult<usize> {
        let mut pending = Vec::new();
        if let Some(rx) = self.signals_rx.as_mut() {
            while let Ok(signal) = rx.try_recv() {
                pending.push(signal);
            }
        }
        for signal in &pending {
            self.handle_signal(*signal)?;
        }
        Ok(pending.len())
    }

    pub fn handle_signal(&mut self, signal: SessionSignal) -> FacelensResult<()> {
        match signal {
            SessionSignal::LicenseValidated => self.on_license_validated(),
            SessionSignal::LicenseInvalidated => self.on_license_invalidated(),
        }
    }

    /// License accepted: fresh state, subscribe, start the engine
    pub fn on_license_validated(&mut self) -> FacelensResult<()> {
        if self.phase == SessionPhase::Stopped {
            debug!("license validated after stop ignored");
            return Ok(());
        }
        self.expect_phase(SessionPhase::AwaitingLicense, "start")?;

        self.session_id = self.session_id.next();
        let initial = DisplayState::initial(self.config.session.expression_variant());
        let subscription = Subscription::open(
            self.session_id,
            initial,
            Arc::clone(&self.renderer),
            Arc::clone(&self.sink),
        );
        let events = subscription.sink();
        self.subscription = Some(subscription);
        self.enter(SessionPhase::Running);
        info!(
            session = %self.session_id,
            expression = ?self.config.profile.expression,
            detection = ?self.config.profile.detection,
            "starting engine"
        );

        if let Err(e) = self.engine.start(&self.config.session, events) {
            warn!(session = %self.session_id, error = %e, "engine failed to start");
            self.stop();
            return Err(e);
        }
        Ok(())
    }

    /// License refused: never start, tell the user
    pub fn on_license_invalidated(&mut self) -> FacelensResult<()> {
        if self.phase == SessionPhase::Stopped {
            debug!("license invalidated after stop ignored");
            return Ok(());
        }
        self.expect_phase(SessionPhase::AwaitingLicense, "reject")?;
        warn!(error = %FacelensError::LicenseRejected, "session rejected");
        self.enter(SessionPhase::Rejected);
        self.host.show_notice(&Notice::invalid_license());
        Ok(())
    }

    /// Advance the idle timer to `now`
    pub fn tick(&mut self, now: Instant) -> Option<IdleEvent> {
        let event = self.idle.poll(now)?;
        match event {
            IdleEvent::NoticeDue => {
                info!(phase = %self.phase, "idle timeout reached");
                self.host
                    .show_notice(&Notice::idle_timeout(self.config.idle_message.clone()));
            }
            IdleEvent::GraceElapsed => {
                info!("idle grace period elapsed, closing");
                self.host.dismiss_notice(NoticeKind::IdleTimeout);
                self.stop();
                self.host.finish();
            }
        }
        Some(event)
    }

    /// Unsubscribe, cancel the idle timer, release the engine. Idempotent.
    pub fn stop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.idle.cancel();

        if let Some(subscription) = self.subscription.as_ref() {
            self.last_state = subscription.cancel();
        }
        if self.engine_initialized {
            self.engine.stop();
        }
        if self.phase != SessionPhase::Rejected {
            self.enter(SessionPhase::Stopped);
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// `stop` has run; nothing further will happen in this session
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Live display state, while running
    pub fn snapshot(&self) -> Option<DisplayState> {
        self.subscription.as_ref().and_then(Subscription::snapshot)
    }

    /// The state as it was when the session stopped
    pub fn last_state(&self) -> Option<&DisplayState> {
        self.last_state.as_ref()
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn delivery_stats(&self) -> DeliveryStats {
        self.subscription
            .as_ref()
            .map(Subscription::stats)
            .unwrap_or_default()
    }

    /// When `tick` next needs to run
    pub fn next_deadline(&self) -> Option<Instant> {
        self.idle.next_deadline()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    fn enter(&mut self, phase: SessionPhase) {
        if self.phase != phase {
            info!(from = %self.phase, to = %phase, session = %self.session_id, "session phase");
            self.phase = phase;
        }
    }

    fn expect_phase(&self, expected: SessionPhase, op: &'static str) -> FacelensResult<()> {
        if self.phase != expected {
            return Err(FacelensError::InvalidTransition {
                from: self.phase.to_string(),
                op,
            });
        }
        Ok(())
    }
}

impl<E: AnalysisEngine, P: PermissionAuthority, H: HostSurface> Drop for SessionController<E, P, H> {
    fn drop(&mut self) {
        self.stop();
    }
}
