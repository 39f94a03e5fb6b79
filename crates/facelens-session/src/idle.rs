//! Idle timeout - one-shot supervisory timer
//!
//! Armed when the engine is initialized. After `timeout` it asks for the idle
//! notice; `grace` after that it asks for the session to be torn down. Time is
//! passed in by the caller, so the timer works the same under a real clock, a
//! tokio clock, or a test clock.

use std::time::{Duration, Instant};

/// Idle timeout configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdleTimeoutConfig {
    pub enabled: bool,
    /// From initialization to the idle notice
    pub timeout: Duration,
    /// From the idle notice to forced teardown
    pub grace: Duration,
}

impl Default for IdleTimeoutConfig {
    fn default() -> Self {
        IdleTimeoutConfig {
            enabled: true,
            timeout: Duration::from_secs(120),
            grace: Duration::from_secs(5),
        }
    }
}

impl IdleTimeoutConfig {
    /// Never fires
    pub fn disabled() -> Self {
        IdleTimeoutConfig {
            enabled: false,
            ..Default::default()
        }
    }
}

/// What the timer asks for when polled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleEvent {
    /// Show the idle notice
    NoticeDue,
    /// Grace period over; stop the session
    GraceElapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Unarmed,
    Armed { deadline: Instant },
    Notifying { deadline: Instant },
    Fired,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct IdleTimer {
    config: IdleTimeoutConfig,
    state: TimerState,
}

impl IdleTimer {
    pub fn new(config: IdleTimeoutConfig) -> Self {
        IdleTimer {
            config,
            state: TimerState::Unarmed,
        }
    }

    /// Arm once; re-arming an armed, fired or cancelled timer does nothing
    pub fn arm(&mut self, now: Instant) {
        if !self.config.enabled || self.state != TimerState::Unarmed {
            return;
        }
        self.state = TimerState::Armed {
            deadline: now + self.config.timeout,
        };
    }

    pub fn cancel(&mut self) {
        if matches!(
            self.state,
            TimerState::Armed { .. } | TimerState::Notifying { .. } | TimerState::Unarmed
        ) {
            self.state = TimerState::Cancelled;
        }
    }

    /// Advance to `now`; yields at most one event per call
    pub fn poll(&mut self, now: Instant) -> Option<IdleEvent> {
        match self.state {
            TimerState::Armed { deadline } if now >= deadline => {
                self.state = TimerState::Notifying {
                    deadline: now + self.config.grace,
                };
                Some(IdleEvent::NoticeDue)
            }
            TimerState::Notifying { deadline } if now >= deadline => {
                self.state = TimerState::Fired;
                Some(IdleEvent::GraceElapsed)
            }
            _ => None,
        }
    }

    /// When `poll` will next have something to say
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            TimerState::Armed { deadline } | TimerState::Notifying { deadline } => Some(deadline),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.next_deadline().is_some()
    }

    /// Idle notice is on screen, waiting out the grace period
    pub fn is_notifying(&self) -> bool {
        matches!(self.state, TimerState::Notifying { .. })
    }

    pub fn config(&self) -> &IdleTimeoutConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_notice_then_grace() {
        let start = Instant::now();
        let mut timer = IdleTimer::new(IdleTimeoutConfig::default());
        timer.arm(start);

        assert_eq!(timer.poll(start + Duration::from_secs(119)), None);
        assert_eq!(timer.next_deadline(), Some(start + Duration::from_secs(120)));

        let fired_at = start + Duration::from_secs(120);
        assert_eq!(timer.poll(fired_at), Some(IdleEvent::NoticeDue));
        assert!(timer.is_notifying());
        assert_eq!(timer.poll(fired_at + Duration::from_secs(4)), None);
        assert_eq!(
            timer.poll(fired_at + Duration::from_secs(5)),
            Some(IdleEvent::GraceElapsed)
        );
        assert!(!timer.is_pending());
        assert_eq!(timer.poll(fired_at + Duration::from_secs(500)), None);
    }

    #[test]
    fn test_grace_counts_from_notice() {
        let start = Instant::now();
        let mut timer = IdleTimer::new(IdleTimeoutConfig::default());
        timer.arm(start);
        // polled late
        let late = start + Duration::from_secs(200);
        assert_eq!(timer.poll(late), Some(IdleEvent::NoticeDue));
        assert_eq!(timer.next_deadline(), Some(late + Duration::from_secs(5)));
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let start = Instant::now();
        let mut timer = IdleTimer::new(IdleTimeoutConfig::default());
        timer.arm(start);
        timer.cancel();
        assert_eq!(timer.poll(start + Duration::from_secs(1_000)), None);
        timer.arm(start);
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_arm_is_one_shot() {
        let start = Instant::now();
        let mut timer = IdleTimer::new(IdleTimeoutConfig::default());
        timer.arm(start);
        timer.arm(start + Duration::from_secs(60));
        assert_eq!(timer.next_deadline(), Some(start + Duration::from_secs(120)));
    }

    #[test]
    fn test_disabled_never_arms() {
        let start = Instant::now();
        let mut timer = IdleTimer::new(IdleTimeoutConfig::disabled());
        timer.arm(start);
        assert!(!timer.is_pending());
        assert_eq!(timer.poll(start + Duration::from_secs(10_000)), None);
    }
}
