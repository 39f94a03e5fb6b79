//! Session configuration ("Property") and presentation profile
//!
//! The property is chosen once before a session starts and never changes while
//! it runs. Construction always normalizes the flag dependency rule:
//! - no face detection => no landmarks, action units or expressions
//! - no landmarks => no action units
//! - single expression model => no valence expression

use serde::{Deserialize, Serialize};

/// Which expression model the engine runs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionVariant {
    /// One 7-category model, one panel
    Single,
    /// Basic (7 categories) plus valence (3 categories), two panels
    #[default]
    Dual,
}

impl ExpressionVariant {
    pub fn panel_count(self) -> usize {
        match self {
            ExpressionVariant::Single => 1,
            ExpressionVariant::Dual => 2,
        }
    }
}

/// How the engine signals face presence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSignaling {
    /// One `FaceDetected` event carrying a `detected` flag
    #[default]
    Flagged,
    /// Distinct `FaceDetected` / `FaceNotDetected` events
    SplitEvents,
}

/// Configuration-time choice of event contract shape
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PresentationProfile {
    pub expression: ExpressionVariant,
    /// What the engine is expected to emit. The reducer treats both shapes
    /// alike, so this only describes the stream; it is never enforced.
    pub detection: DetectionSignaling,
}

impl PresentationProfile {
    pub fn new(expression: ExpressionVariant, detection: DetectionSignaling) -> Self {
        Self {
            expression,
            detection,
        }
    }

    /// Flagged detection with basic + valence expressions
    pub fn flagged_dual() -> Self {
        Self::new(ExpressionVariant::Dual, DetectionSignaling::Flagged)
    }

    /// Split detection events with a single expression model
    pub fn split_single() -> Self {
        Self::new(ExpressionVariant::Single, DetectionSignaling::SplitEvents)
    }
}

/// Raw property flags, as written by a user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyFlags {
    /// Engine-side overlay; only meaningful when the engine's own view is bound
    pub visualize_result: bool,
    pub analyze_environment: bool,
    pub detect_face: bool,
    pub detect_landmark: bool,
    pub analyze_action_unit: bool,
    pub recognize_basic_expression: bool,
    pub recognize_valence_expression: bool,
}

impl Default for PropertyFlags {
    fn default() -> Self {
        PropertyFlags {
            visualize_result: false,
            analyze_environment: true,
            detect_face: true,
            detect_landmark: true,
            analyze_action_unit: true,
            recognize_basic_expression: true,
            recognize_valence_expression: true,
        }
    }
}

impl PropertyFlags {
    /// Everything off
    pub fn none() -> Self {
        PropertyFlags {
            visualize_result: false,
            analyze_environment: false,
            detect_face: false,
            detect_landmark: false,
            analyze_action_unit: false,
            recognize_basic_expression: false,
            recognize_valence_expression: false,
        }
    }

    fn normalized(mut self, variant: ExpressionVariant) -> Self {
        if !self.detect_face {
            self.detect_landmark = false;
            self.analyze_action_unit = false;
            self.recognize_basic_expression = false;
            self.recognize_valence_expression = false;
        }
        if !self.detect_landmark {
            self.analyze_action_unit = false;
        }
        if variant == ExpressionVariant::Single {
            self.recognize_valence_expression = false;
        }
        self
    }
}

/// Immutable, normalized session configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionConfig {
    flags: PropertyFlags,
    variant: ExpressionVariant,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(PropertyFlags::default(), ExpressionVariant::default())
    }
}

impl SessionConfig {
    pub fn new(flags: PropertyFlags, variant: ExpressionVariant) -> Self {
        SessionConfig {
            flags: flags.normalized(variant),
            variant,
        }
    }

    pub fn with_visualize_result(self, on: bool) -> Self {
        self.rebuild(|f| f.visualize_result = on)
    }

    pub fn with_analyze_environment(self, on: bool) -> Self {
        self.rebuild(|f| f.analyze_environment = on)
    }

    pub fn with_detect_face(self, on: bool) -> Self {
        self.rebuild(|f| f.detect_face = on)
    }

    pub fn with_detect_landmark(self, on: bool) -> Self {
        self.rebuild(|f| f.detect_landmark = on)
    }

    pub fn with_analyze_action_unit(self, on: bool) -> Self {
        self.rebuild(|f| f.analyze_action_unit = on)
    }

    pub fn with_recognize_basic_expression(self, on: bool) -> Self {
        self.rebuild(|f| f.recognize_basic_expression = on)
    }

    pub fn with_recognize_valence_expression(self, on: bool) -> Self {
        self.rebuild(|f| f.recognize_valence_expression = on)
    }

    /// Switching to `Single` drops the valence flag; switching back does not restore it
    pub fn with_expression_variant(self, variant: ExpressionVariant) -> Self {
        Self::new(self.flags, variant)
    }

    fn rebuild(self, edit: impl FnOnce(&mut PropertyFlags)) -> Self {
        let mut flags = self.flags;
        edit(&mut flags);
        Self::new(flags, self.variant)
    }

    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    pub fn expression_variant(&self) -> ExpressionVariant {
        self.variant
    }

    pub fn visualize_result(&self) -> bool {
        self.flags.visualize_result
    }

    pub fn analyze_environment(&self) -> bool {
        self.flags.analyze_environment
    }

    pub fn detect_face(&self) -> bool {
        self.flags.detect_face
    }

    pub fn detect_landmark(&self) -> bool {
        self.flags.detect_landmark
    }

    pub fn analyze_action_unit(&self) -> bool {
        self.flags.analyze_action_unit
    }

    pub fn recognize_basic_expression(&self) -> bool {
        self.flags.recognize_basic_expression
    }

    pub fn recognize_valence_expression(&self) -> bool {
        self.flags.recognize_valence_expression
    }
}
