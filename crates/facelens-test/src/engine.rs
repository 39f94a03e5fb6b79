//! Scripted analysis engine
//!
//! Replays a fixed list of deliveries when started, filtered by the session
//! configuration the way a real engine only reports what it was asked to
//! analyze. The license verdict is given during `initialize` or held back
//! for the test to release through an [`EngineProbe`].

use std::sync::Arc;

use parking_lot::Mutex;

use facelens_core::{
    delivery_tag, EngineDelivery, EventTag, FacelensError, FacelensResult, SessionConfig,
};
use facelens_session::{AnalysisEngine, DeliveryOutcome, EventSink, LicenseReply};

/// What the engine answers when asked to validate its license
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LicenseMode {
    #[default]
    Validate,
    Invalidate,
    /// Hold the reply; release it through the probe
    Manual,
}

#[derive(Default)]
struct EngineState {
    app_id: Option<String>,
    license: Option<LicenseReply>,
    events: Option<EventSink>,
    config: Option<SessionConfig>,
    outcomes: Vec<DeliveryOutcome>,
    initializations: usize,
    starts: usize,
    stops: usize,
}

/// Whether an engine running under `config` reports events with `tag`
pub fn emits(config: &SessionConfig, tag: EventTag) -> bool {
    match tag {
        EventTag::MeasureEnv => config.analyze_environment(),
        EventTag::FaceDetected
        | EventTag::FaceNotDetected
        | EventTag::HeadPose
        | EventTag::Attention => config.detect_face(),
        EventTag::FacialLandmark => config.detect_landmark(),
        EventTag::FacialActionUnit => config.analyze_action_unit(),
        EventTag::FacialExpression => {
            config.recognize_basic_expression() || config.recognize_valence_expression()
        }
    }
}

pub struct ScriptedEngine {
    script: Vec<EngineDelivery>,
    license: LicenseMode,
    start_error: Option<String>,
    state: Arc<Mutex<EngineState>>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<EngineDelivery>) -> Self {
        ScriptedEngine {
            script,
            license: LicenseMode::default(),
            start_error: None,
            state: Arc::new(Mutex::new(EngineState::default())),
        }
    }

    /// An engine that validates and then emits nothing
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_license(mut self, license: LicenseMode) -> Self {
        self.license = license;
        self
    }

    /// `start` fails with an engine error
    pub fn with_start_error(mut self, message: impl Into<String>) -> Self {
        self.start_error = Some(message.into());
        self
    }

    pub fn probe(&self) -> EngineProbe {
        EngineProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl AnalysisEngine for ScriptedEngine {
    fn initialize(&mut self, app_id: &str, license: LicenseReply) -> FacelensResult<()> {
        {
            let mut state = self.state.lock();
            state.app_id = Some(app_id.to_string());
            state.initializations += 1;
        }
        match self.license {
            LicenseMode::Validate => license.validated(),
            LicenseMode::Invalidate => license.invalidated(),
            LicenseMode::Manual => self.state.lock().license = Some(license),
        }
        Ok(())
    }

    fn start(&mut self, config: &SessionConfig, events: EventSink) -> FacelensResult<()> {
        if let Some(message) = &self.start_error {
            return Err(FacelensError::Engine(message.clone()));
        }
        {
            let mut state = self.state.lock();
            state.starts += 1;
            state.config = Some(*config);
            state.events = Some(events.clone());
        }

        let script = std::mem::take(&mut self.script);
        let outcomes: Vec<DeliveryOutcome> = script
            .into_iter()
            .filter(|delivery| emits(config, delivery_tag(delivery)))
            .map(|delivery| events.deliver(delivery))
            .collect();
        self.state.lock().outcomes.extend(outcomes);
        Ok(())
    }

    fn stop(&mut self) {
        // the sink is kept so tests can model callbacks still in flight
        self.state.lock().stops += 1;
    }
}

/// Test-side view of a [`ScriptedEngine`] after it moved into a controller
#[derive(Clone)]
pub struct EngineProbe {
    state: Arc<Mutex<EngineState>>,
}

impl EngineProbe {
    pub fn app_id(&self) -> Option<String> {
        self.state.lock().app_id.clone()
    }

    pub fn initializations(&self) -> usize {
        self.state.lock().initializations
    }

    pub fn starts(&self) -> usize {
        self.state.lock().starts
    }

    pub fn stops(&self) -> usize {
        self.state.lock().stops
    }

    /// Configuration the engine was started with
    pub fn config(&self) -> Option<SessionConfig> {
        self.state.lock().config
    }

    /// Outcomes of every delivery made so far, scripted and emitted
    pub fn outcomes(&self) -> Vec<DeliveryOutcome> {
        self.state.lock().outcomes.clone()
    }

    /// Release a held license reply as validated; false if none is held
    pub fn validate(&self) -> bool {
        let reply = self.state.lock().license.take();
        match reply {
            Some(reply) => {
                reply.validated();
                true
            }
            None => false,
        }
    }

    pub fn invalidate(&self) -> bool {
        let reply = self.state.lock().license.take();
        match reply {
            Some(reply) => {
                reply.invalidated();
                true
            }
            None => false,
        }
    }

    /// Deliver one more event; `None` if the engine was never started
    pub fn emit(&self, delivery: EngineDelivery) -> Option<DeliveryOutcome> {
        let events = self.state.lock().events.clone()?;
        let outcome = events.deliver(delivery);
        self.state.lock().outcomes.push(outcome);
        Some(outcome)
    }

    /// The engine's sink still reaches a live display state
    pub fn is_open(&self) -> bool {
        self.state
            .lock()
            .events
            .as_ref()
            .map_or(false, EventSink::is_open)
    }
}
