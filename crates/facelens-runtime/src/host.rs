//! Session host - async loop around a SessionController
//!
//! One task owns the controller. License signals, host commands and the idle
//! deadline are multiplexed with `tokio::select!`, in that priority order, so
//! the controller itself never needs a lock. Engine events do not pass
//! through here; they go straight into the subscription's `EventSink`.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use facelens_core::{FacelensError, FacelensResult, PermissionGrants, SessionId};
use facelens_present::DisplayState;
use facelens_session::{
    AnalysisEngine, DeliveryStats, HostSurface, NoticeAction, NoticeKind, PermissionAuthority,
    SessionController, SessionPhase, SessionSignal,
};

/// Input from the host screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Outcome of a permission prompt
    PermissionResult(PermissionGrants),
    /// The user chose an action on a notice
    NoticeAction { kind: NoticeKind, action: NoticeAction },
    /// The host screen is going away
    Teardown,
}

/// Sends commands to a running [`SessionHost`]
#[derive(Debug, Clone)]
pub struct HostHandle {
    commands: UnboundedSender<HostCommand>,
}

impl HostHandle {
    /// False once the host loop has exited
    pub fn send(&self, command: HostCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn permission_result(&self, grants: PermissionGrants) -> bool {
        self.send(HostCommand::PermissionResult(grants))
    }

    pub fn notice_action(&self, kind: NoticeKind, action: NoticeAction) -> bool {
        self.send(HostCommand::NoticeAction { kind, action })
    }

    pub fn teardown(&self) -> bool {
        self.send(HostCommand::Teardown)
    }
}

/// How a hosted session ended
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub phase: SessionPhase,
    pub session_id: SessionId,
    pub stats: DeliveryStats,
    pub last_state: Option<DisplayState>,
}

pub struct SessionHost<E: AnalysisEngine, P: PermissionAuthority, H: HostSurface> {
    controller: SessionController<E, P, H>,
    signals: UnboundedReceiver<SessionSignal>,
    commands: UnboundedReceiver<HostCommand>,
}

impl<E: AnalysisEngine, P: PermissionAuthority, H: HostSurface> SessionHost<E, P, H> {
    /// Wrap an unstarted controller
    pub fn new(mut controller: SessionController<E, P, H>) -> FacelensResult<(Self, HostHandle)> {
        if controller.phase() != SessionPhase::Unstarted {
            return Err(FacelensError::InvalidTransition {
                from: controller.phase().to_string(),
                op: "host",
            });
        }
        let signals = controller.take_signals().ok_or_else(|| FacelensError::InvalidTransition {
            from: "signals taken".to_string(),
            op: "host",
        })?;
        let (commands_tx, commands) = unbounded_channel();
        Ok((
            SessionHost {
                controller,
                signals,
                commands,
            },
            HostHandle {
                commands: commands_tx,
            },
        ))
    }

    pub fn controller(&self) -> &SessionController<E, P, H> {
        &self.controller
    }

    /// Launch the session and drive it until it is released
    pub async fn run(mut self) -> FacelensResult<SessionReport> {
        self.controller.launch(now())?;
        info!(app_id = %self.controller.config().app_id, "session host started");

        while !self.controller.is_released() {
            let deadline = self.controller.next_deadline();
            tokio::select! {
                biased;

                Some(signal) = self.signals.recv() => {
                    debug!(?signal, "license signal");
                    if let Err(e) = self.controller.handle_signal(signal) {
                        warn!(error = %e, "license signal not applied");
                    }
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => {
                        info!("host handle dropped, tearing down");
                        self.controller.stop();
                    }
                },
                _ = idle_deadline(deadline) => {
                    self.controller.tick(now());
                }
            }
        }

        let report = self.report();
        info!(
            phase = %report.phase,
            session = %report.session_id,
            applied = report.stats.applied,
            dropped = report.stats.dropped,
            "session host finished"
        );
        Ok(report)
    }

    fn apply(&mut self, command: HostCommand) {
        match command {
            HostCommand::PermissionResult(grants) => self.controller.on_permission_result(&grants),
            HostCommand::NoticeAction { kind, action } => {
                if let Err(e) = self.controller.on_notice_action(kind, action) {
                    warn!(error = %e, "notice action not applied");
                }
            }
            HostCommand::Teardown => self.controller.stop(),
        }
    }

    fn report(&self) -> SessionReport {
        SessionReport {
            phase: self.controller.phase(),
            session_id: self.controller.session_id(),
            stats: self.controller.delivery_stats(),
            last_state: self.controller.last_state().cloned(),
        }
    }
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

async fn idle_deadline(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(Instant::from_std(deadline)).await,
        None => std::future::pending::<()>().await,
    }
}
