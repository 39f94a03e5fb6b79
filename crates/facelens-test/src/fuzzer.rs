//! Event Fuzzer - randomized engine output for the presentation reducer
//!
//! Generates delivery streams shaped for a presentation profile, mixed with
//! engine errors, out-of-range emotion indices and unclassified readings,
//! then checks the reducer invariants over the whole stream:
//! - errors never change the display state
//! - losing the face hides every panel
//! - applying a successful event twice equals applying it once
//! - the expression variant of the state never changes

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use facelens_core::{
    ActionUnit, ActionUnits, AnalysisEvent, DetectionSignaling, EmotionReading, EngineDelivery,
    EnvironmentQuality, EventError, EventTag, ExpressionPayload, ExpressionVariant, FaceDetection,
    FacialLandmarks, PresentationProfile, Point2,
};
use facelens_present::{reduce, Diagnostic, DisplayState, BASIC_EMOTIONS, VALENCE_EMOTIONS};

/// Fuzzer configuration
#[derive(Clone, Debug)]
pub struct FuzzerConfig {
    /// Number of deliveries to generate
    pub event_count: usize,
    /// Probability that a delivery is an engine error
    pub error_prob: f64,
    /// Probability that an emotion index is outside its table
    pub out_of_range_prob: f64,
    /// Probability that a reading has no emotion index
    pub unclassified_prob: f64,
    /// Probability that a detection event reports the face lost
    pub face_loss_prob: f64,
    /// Contract shape to generate
    pub profile: PresentationProfile,
    /// Random seed
    pub seed: u64,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        FuzzerConfig {
            event_count: 1000,
            error_prob: 0.1,
            out_of_range_prob: 0.05,
            unclassified_prob: 0.05,
            face_loss_prob: 0.2,
            profile: PresentationProfile::flagged_dual(),
            seed: 42,
        }
    }
}

impl FuzzerConfig {
    /// Light fuzzing for quick tests
    pub fn light() -> Self {
        FuzzerConfig {
            event_count: 100,
            error_prob: 0.05,
            out_of_range_prob: 0.02,
            unclassified_prob: 0.02,
            face_loss_prob: 0.1,
            ..Default::default()
        }
    }

    /// Heavy fuzzing for thorough testing
    pub fn heavy() -> Self {
        FuzzerConfig {
            event_count: 20_000,
            error_prob: 0.25,
            out_of_range_prob: 0.15,
            unclassified_prob: 0.1,
            face_loss_prob: 0.3,
            ..Default::default()
        }
    }

    pub fn with_profile(mut self, profile: PresentationProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Outcome of a fuzzing run
#[derive(Clone, Debug, Default)]
pub struct FuzzResult {
    pub deliveries: usize,
    pub applied: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Broken invariants, one line each
    pub violations: Vec<String>,
}

impl FuzzResult {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }
}

pub struct EventFuzzer {
    config: FuzzerConfig,
    rng: StdRng,
}

impl EventFuzzer {
    pub fn new(config: FuzzerConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        EventFuzzer { config, rng }
    }

    pub fn config(&self) -> &FuzzerConfig {
        &self.config
    }

    /// Generate `event_count` deliveries
    pub fn generate(&mut self) -> Vec<EngineDelivery> {
        (0..self.config.event_count)
            .map(|_| self.generate_delivery())
            .collect()
    }

    fn generate_delivery(&mut self) -> EngineDelivery {
        if self.rng.gen::<f64>() < self.config.error_prob {
            let tags = EventTag::all();
            let tag = tags[self.rng.gen_range(0..tags.len())];
            let code = self.rng.gen_range(1..100);
            return Err(EventError::new(tag, code, "fuzzed engine failure"));
        }
        Ok(self.generate_event())
    }

    fn generate_event(&mut self) -> AnalysisEvent {
        match self.rng.gen_range(0..7) {
            0 => self.generate_detection(),
            1 => self.generate_expression(),
            2 => AnalysisEvent::head_pose(
                self.rng.gen_range(-90.0..90.0),
                self.rng.gen_range(-90.0..90.0),
                self.rng.gen_range(-90.0..90.0),
            ),
            3 => AnalysisEvent::attention(self.rng.gen()),
            4 => AnalysisEvent::MeasureEnv(
                EnvironmentQuality::new()
                    .with_metric("brightness", self.rng.gen_range(0.0..1.0))
                    .with_metric("blur", self.rng.gen_range(0.0..1.0)),
            ),
            5 => AnalysisEvent::FacialLandmark(self.generate_landmarks()),
            _ => AnalysisEvent::FacialActionUnit(self.generate_action_units()),
        }
    }

    fn generate_detection(&mut self) -> AnalysisEvent {
        let lost = self.rng.gen::<f64>() < self.config.face_loss_prob;
        match (self.config.profile.detection, lost) {
            (DetectionSignaling::SplitEvents, true) => AnalysisEvent::FaceNotDetected,
            (DetectionSignaling::SplitEvents, false) => AnalysisEvent::face(true),
            (DetectionSignaling::Flagged, lost) => AnalysisEvent::FaceDetected(FaceDetection {
                detected: !lost,
                landmarks: (!lost).then(|| self.generate_landmarks()),
                action_units: (!lost).then(|| self.generate_action_units()),
            }),
        }
    }

    fn generate_expression(&mut self) -> AnalysisEvent {
        let payload = match self.config.profile.expression {
            ExpressionVariant::Single => {
                ExpressionPayload::Single(self.generate_reading(BASIC_EMOTIONS.len()))
            }
            ExpressionVariant::Dual => match self.rng.gen_range(0..3) {
                0 => ExpressionPayload::Dual {
                    basic: Some(self.generate_reading(BASIC_EMOTIONS.len())),
                    valence: None,
                },
                1 => ExpressionPayload::Dual {
                    basic: None,
                    valence: Some(self.generate_reading(VALENCE_EMOTIONS.len())),
                },
                _ => ExpressionPayload::Dual {
                    basic: Some(self.generate_reading(BASIC_EMOTIONS.len())),
                    valence: Some(self.generate_reading(VALENCE_EMOTIONS.len())),
                },
            },
        };
        AnalysisEvent::FacialExpression(payload)
    }

    fn generate_reading(&mut self, table_len: usize) -> EmotionReading {
        let label = format!("fuzz-{}", self.rng.gen_range(0..1000));
        if self.rng.gen::<f64>() < self.config.unclassified_prob {
            return EmotionReading::unclassified(label);
        }
        let index = if self.rng.gen::<f64>() < self.config.out_of_range_prob {
            self.rng.gen_range(table_len..table_len + 8)
        } else {
            self.rng.gen_range(0..table_len)
        };
        EmotionReading::new(index, label)
    }

    fn generate_landmarks(&mut self) -> FacialLandmarks {
        let count = self.rng.gen_range(0..68);
        FacialLandmarks {
            points: (0..count)
                .map(|_| Point2::new(self.rng.gen_range(0.0..640.0), self.rng.gen_range(0.0..480.0)))
                .collect(),
        }
    }

    fn generate_action_units(&mut self) -> ActionUnits {
        let count = self.rng.gen_range(0..12);
        ActionUnits {
            units: (0..count)
                .map(|_| ActionUnit {
                    id: self.rng.gen_range(1..46),
                    intensity: self.rng.gen_range(0.0..5.0),
                })
                .collect(),
        }
    }

    /// Generate a stream, reduce it, and check the invariants
    pub fn run(&mut self) -> FuzzResult {
        let deliveries = self.generate();
        let variant = self.config.profile.expression;
        let mut state = DisplayState::initial(variant);
        let mut result = FuzzResult {
            deliveries: deliveries.len(),
            ..Default::default()
        };

        for (seq, delivery) in deliveries.iter().enumerate() {
            let reduction = reduce(&state, delivery);

            match &reduction.diagnostic {
                Diagnostic::Observed { .. } => {
                    result.applied += 1;
                    let again = reduce(&reduction.state, delivery);
                    if again.state != reduction.state {
                        result.violations.push(format!("#{seq}: not idempotent"));
                    }
                }
                Diagnostic::EventFailed(_) => {
                    result.failed += 1;
                    if reduction.state != state {
                        result.violations.push(format!("#{seq}: error changed state"));
                    }
                }
                _ => {
                    result.skipped += 1;
                    if reduction.state != state {
                        result.violations.push(format!("#{seq}: violation changed state"));
                    }
                }
            }

            if let Ok(event) = delivery {
                if event.face_presence() == Some(false)
                    && (reduction.state.any_panel_visible() || reduction.state.face_box.highlighted)
                {
                    result.violations.push(format!("#{seq}: face lost but panels visible"));
                }
            }
            if reduction.state.expression_variant() != variant {
                result.violations.push(format!("#{seq}: expression variant changed"));
            }

            state = reduction.state;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzzer_light() {
        let mut fuzzer = EventFuzzer::new(FuzzerConfig::light());
        let result = fuzzer.run();
        assert!(result.is_ok(), "{:?}", result.violations);
        assert_eq!(result.deliveries, 100);
        assert_eq!(result.applied + result.failed + result.skipped, 100);
    }

    #[test]
    fn test_fuzzer_default_both_profiles() {
        for profile in [
            PresentationProfile::flagged_dual(),
            PresentationProfile::split_single(),
        ] {
            let mut fuzzer = EventFuzzer::new(FuzzerConfig::default().with_profile(profile));
            let result = fuzzer.run();
            assert!(result.is_ok(), "{profile:?}: {:?}", result.violations);
            assert!(result.failed > 0);
            assert!(result.skipped > 0);
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let a = EventFuzzer::new(FuzzerConfig::light()).generate();
        let b = EventFuzzer::new(FuzzerConfig::light()).generate();
        assert_eq!(a, b);
        let c = EventFuzzer::new(FuzzerConfig::light().with_seed(7)).generate();
        assert_ne!(a, c);
    }

    #[test]
    fn test_split_single_shape() {
        let config = FuzzerConfig::default().with_profile(PresentationProfile::split_single());
        let deliveries = EventFuzzer::new(config).generate();
        for delivery in deliveries.iter().flatten() {
            match delivery {
                AnalysisEvent::FaceDetected(face) => assert!(face.detected),
                AnalysisEvent::FacialExpression(payload) => {
                    assert!(matches!(payload, ExpressionPayload::Single(_)))
                }
                _ => {}
            }
        }
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn test_any_seed_holds_invariants(seed in any::<u64>(), single in any::<bool>()) {
                let profile = if single {
                    PresentationProfile::split_single()
                } else {
                    PresentationProfile::flagged_dual()
                };
                let config = FuzzerConfig::light().with_profile(profile).with_seed(seed);
                let result = EventFuzzer::new(config).run();
                prop_assert!(result.is_ok(), "{:?}", result.violations);
                prop_assert_eq!(result.applied + result.failed + result.skipped, result.deliveries);
            }
        }
    }
}
