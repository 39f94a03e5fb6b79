//! Presentation Reducer
//!
//! `reduce(state, delivery) -> Reduction`. Transition table:
//!
//! | delivery | effect |
//! |---|---|
//! | face detected | highlight face box, reveal attention panel |
//! | face lost (flag false or `FaceNotDetected`) | neutral face box, hide every panel |
//! | expression | icon from the model table, label text, reveal that panel |
//! | head pose | `"x, y, z"` rounded degrees, reveal panel |
//! | attention | `"O"` / `"X"`, reveal panel |
//! | environment, landmarks, action units | nothing |
//! | any error | nothing |
//!
//! Contract violations from the engine (an index outside its table, a payload
//! for the other expression model) skip the whole delivery.

use std::fmt;

use facelens_core::{
    AnalysisEvent, EmotionReading, EngineDelivery, EventError, EventTag, ExpressionPayload,
    ExpressionVariant, FacelensError,
};

use crate::{format_head_pose, AttentionPanel, DisplayState, ExpressionModel};

/// Record forwarded to the observability sink for every delivery
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Successful payload, as reported by the engine
    Observed { tag: EventTag, summary: String },
    /// Engine-reported failure
    EventFailed(EventError),
    /// Index outside the expression table
    PayloadOutOfRange {
        tag: EventTag,
        field: &'static str,
        index: usize,
        bound: usize,
    },
    /// Expression payload shaped for the other model
    ProfileMismatch {
        tag: EventTag,
        expected: ExpressionVariant,
        found: ExpressionVariant,
    },
}

impl Diagnostic {
    pub fn tag(&self) -> EventTag {
        match self {
            Diagnostic::Observed { tag, .. } => *tag,
            Diagnostic::EventFailed(error) => error.tag,
            Diagnostic::PayloadOutOfRange { tag, .. } => *tag,
            Diagnostic::ProfileMismatch { tag, .. } => *tag,
        }
    }

    /// Engine output broke its documented contract
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Diagnostic::PayloadOutOfRange { .. } | Diagnostic::ProfileMismatch { .. }
        )
    }

    /// Error view of a failed or skipped delivery
    pub fn to_error(&self) -> Option<FacelensError> {
        match self {
            Diagnostic::Observed { .. } => None,
            Diagnostic::EventFailed(error) => Some(FacelensError::EventError(error.clone())),
            Diagnostic::PayloadOutOfRange {
                tag,
                field,
                index,
                bound,
            } => Some(FacelensError::PayloadOutOfRange {
                tag: *tag,
                field: *field,
                index: *index,
                bound: *bound,
            }),
            Diagnostic::ProfileMismatch { expected, found, .. } => Some(FacelensError::Engine(
                format!("expression payload for {found:?} model, session uses {expected:?}"),
            )),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Observed { tag, summary } => write!(f, "{tag}: {summary}"),
            other => match other.to_error() {
                Some(error) => write!(f, "{error}"),
                None => Ok(()),
            },
        }
    }
}

/// Result of one reduction
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub state: DisplayState,
    pub diagnostic: Diagnostic,
    /// `state` differs from the input state
    pub changed: bool,
}

impl Reduction {
    fn unchanged(state: &DisplayState, diagnostic: Diagnostic) -> Self {
        Reduction {
            state: state.clone(),
            diagnostic,
            changed: false,
        }
    }
}

/// Apply one engine delivery to a display state
///
/// Pure and total: never panics, never mutates `state`.
pub fn reduce(state: &DisplayState, delivery: &EngineDelivery) -> Reduction {
    let event = match delivery {
        Ok(event) => event,
        Err(error) => return Reduction::unchanged(state, Diagnostic::EventFailed(error.clone())),
    };

    match apply(state, event) {
        Ok(next) => {
            let changed = next != *state;
            Reduction {
                state: next,
                diagnostic: Diagnostic::Observed {
                    tag: event.tag(),
                    summary: format!("{event:?}"),
                },
                changed,
            }
        }
        Err(violation) => Reduction::unchanged(state, violation),
    }
}

fn apply(state: &DisplayState, event: &AnalysisEvent) -> Result<DisplayState, Diagnostic> {
    let mut next = state.clone();

    match event {
        AnalysisEvent::FaceDetected(_) | AnalysisEvent::FaceNotDetected => {
            if event.face_presence() == Some(true) {
                next.face_box.highlighted = true;
                next.attention.visible = true;
            } else {
                next.face_box.highlighted = false;
                next.hide_panels();
            }
        }
        AnalysisEvent::FacialExpression(payload) => {
            apply_expression(&mut next, payload)?;
        }
        AnalysisEvent::HeadPose(pose) => {
            next.head_pose.text = format_head_pose(pose);
            next.head_pose.visible = true;
        }
        AnalysisEvent::Attention(attention) => {
            next.attention.glyph = AttentionPanel::glyph_for(attention.is_attending).to_string();
            next.attention.visible = true;
        }
        AnalysisEvent::MeasureEnv(_)
        | AnalysisEvent::FacialLandmark(_)
        | AnalysisEvent::FacialActionUnit(_) => {}
    }

    Ok(next)
}

fn apply_expression(
    state: &mut DisplayState,
    payload: &ExpressionPayload,
) -> Result<(), Diagnostic> {
    let expected = state.expression_variant();
    let updates: Vec<(ExpressionModel, &EmotionReading)> = match (payload, expected) {
        (ExpressionPayload::Single(reading), ExpressionVariant::Single) => {
            vec![(ExpressionModel::Basic, reading)]
        }
        (ExpressionPayload::Dual { basic, valence }, ExpressionVariant::Dual) => {
            let mut updates = Vec::with_capacity(2);
            if let Some(reading) = basic {
                updates.push((ExpressionModel::Basic, reading));
            }
            if let Some(reading) = valence {
                updates.push((ExpressionModel::Valence, reading));
            }
            updates
        }
        (ExpressionPayload::Single(_), _) => {
            return Err(Diagnostic::ProfileMismatch {
                tag: EventTag::FacialExpression,
                expected,
                found: ExpressionVariant::Single,
            })
        }
        (ExpressionPayload::Dual { .. }, _) => {
            return Err(Diagnostic::ProfileMismatch {
                tag: EventTag::FacialExpression,
                expected,
                found: ExpressionVariant::Dual,
            })
        }
    };

    // Validate every half before touching any panel
    for (model, reading) in &updates {
        if let Some(index) = reading.emotion_index {
            let bound = model.table().len();
            if index >= bound {
                let field = match payload {
                    ExpressionPayload::Single(_) => "emotion_index",
                    ExpressionPayload::Dual { .. } => model.index_field(),
                };
                return Err(Diagnostic::PayloadOutOfRange {
                    tag: EventTag::FacialExpression,
                    field,
                    index,
                    bound,
                });
            }
        }
    }

    for (model, reading) in updates {
        if let Some(panel) = state.expression_panel_mut(model) {
            if reading.emotion_index.is_some() {
                panel.icon_index = reading.emotion_index;
            }
            panel.label = reading.label.clone();
            panel.visible = true;
        }
    }

    Ok(())
}
