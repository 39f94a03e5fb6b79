//! Event Contract
//!
//! The fixed vocabulary of analysis events the face-analysis engine emits,
//! one variant per engine callback. A delivery is either a successful payload
//! or an engine-reported error, never both: see [`EngineDelivery`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Event tag - which engine callback a delivery belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTag {
    MeasureEnv,
    FaceDetected,
    FaceNotDetected,
    FacialLandmark,
    FacialActionUnit,
    FacialExpression,
    HeadPose,
    Attention,
}

impl EventTag {
    pub fn all() -> &'static [EventTag] {
        &[
            EventTag::MeasureEnv,
            EventTag::FaceDetected,
            EventTag::FaceNotDetected,
            EventTag::FacialLandmark,
            EventTag::FacialActionUnit,
            EventTag::FacialExpression,
            EventTag::HeadPose,
            EventTag::Attention,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventTag::MeasureEnv => "measure_env",
            EventTag::FaceDetected => "face_detected",
            EventTag::FaceNotDetected => "face_not_detected",
            EventTag::FacialLandmark => "facial_landmark",
            EventTag::FacialActionUnit => "facial_action_unit",
            EventTag::FacialExpression => "facial_expression",
            EventTag::HeadPose => "head_pose",
            EventTag::Attention => "attention",
        }
    }

    /// Events that never change what is displayed
    pub fn is_diagnostic_only(self) -> bool {
        matches!(
            self,
            EventTag::MeasureEnv | EventTag::FacialLandmark | EventTag::FacialActionUnit
        )
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurement-environment quality, named metric -> value
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentQuality {
    pub metrics: BTreeMap<String, f64>,
}

impl EnvironmentQuality {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }
}

/// 2D image-space point
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FacialLandmarks {
    pub points: Vec<Point2>,
}

/// Intensity of one facial action unit (FACS numbering)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionUnit {
    pub id: u16,
    pub intensity: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionUnits {
    pub units: Vec<ActionUnit>,
}

/// Face detection result, flagged signaling shape
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub detected: bool,
    #[serde(default)]
    pub landmarks: Option<FacialLandmarks>,
    #[serde(default)]
    pub action_units: Option<ActionUnits>,
}

/// One expression model's output
///
/// `emotion_index` may be absent when the engine produced a label without a
/// category; it is an index into the model's icon table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionReading {
    #[serde(default)]
    pub emotion_index: Option<usize>,
    pub label: String,
}

impl EmotionReading {
    pub fn new(emotion_index: usize, label: impl Into<String>) -> Self {
        Self {
            emotion_index: Some(emotion_index),
            label: label.into(),
        }
    }

    pub fn unclassified(label: impl Into<String>) -> Self {
        Self {
            emotion_index: None,
            label: label.into(),
        }
    }
}

/// Facial expression payload
///
/// The dual model reports basic and valence halves either together or in
/// separate deliveries; each present half updates its own panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionPayload {
    Single(EmotionReading),
    Dual {
        #[serde(default)]
        basic: Option<EmotionReading>,
        #[serde(default)]
        valence: Option<EmotionReading>,
    },
}

/// Head rotation in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    pub theta_x: f64,
    pub theta_y: f64,
    pub theta_z: f64,
}

impl HeadPose {
    pub fn new(theta_x: f64, theta_y: f64, theta_z: f64) -> Self {
        Self {
            theta_x,
            theta_y,
            theta_z,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attention {
    pub is_attending: bool,
}

/// A successful analysis event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum AnalysisEvent {
    MeasureEnv(EnvironmentQuality),
    /// Flagged signaling: fires on every frame with a `detected` flag
    FaceDetected(FaceDetection),
    /// Split signaling: fires when the face is lost
    FaceNotDetected,
    FacialLandmark(FacialLandmarks),
    FacialActionUnit(ActionUnits),
    FacialExpression(ExpressionPayload),
    HeadPose(HeadPose),
    Attention(Attention),
}

impl AnalysisEvent {
    pub fn tag(&self) -> EventTag {
        match self {
            AnalysisEvent::MeasureEnv(_) => EventTag::MeasureEnv,
            AnalysisEvent::FaceDetected(_) => EventTag::FaceDetected,
            AnalysisEvent::FaceNotDetected => EventTag::FaceNotDetected,
            AnalysisEvent::FacialLandmark(_) => EventTag::FacialLandmark,
            AnalysisEvent::FacialActionUnit(_) => EventTag::FacialActionUnit,
            AnalysisEvent::FacialExpression(_) => EventTag::FacialExpression,
            AnalysisEvent::HeadPose(_) => EventTag::HeadPose,
            AnalysisEvent::Attention(_) => EventTag::Attention,
        }
    }

    /// Face presence carried by a `FaceDetected`-family event, either shape
    pub fn face_presence(&self) -> Option<bool> {
        match self {
            AnalysisEvent::FaceDetected(face) => Some(face.detected),
            AnalysisEvent::FaceNotDetected => Some(false),
            _ => None,
        }
    }

    pub fn face(detected: bool) -> Self {
        AnalysisEvent::FaceDetected(FaceDetection {
            detected,
            ..Default::default()
        })
    }

    pub fn single_expression(emotion_index: usize, label: impl Into<String>) -> Self {
        AnalysisEvent::FacialExpression(ExpressionPayload::Single(EmotionReading::new(
            emotion_index,
            label,
        )))
    }

    pub fn basic_expression(emotion_index: usize, label: impl Into<String>) -> Self {
        AnalysisEvent::FacialExpression(ExpressionPayload::Dual {
            basic: Some(EmotionReading::new(emotion_index, label)),
            valence: None,
        })
    }

    pub fn valence_expression(emotion_index: usize, label: impl Into<String>) -> Self {
        AnalysisEvent::FacialExpression(ExpressionPayload::Dual {
            basic: None,
            valence: Some(EmotionReading::new(emotion_index, label)),
        })
    }

    pub fn head_pose(theta_x: f64, theta_y: f64, theta_z: f64) -> Self {
        AnalysisEvent::HeadPose(HeadPose::new(theta_x, theta_y, theta_z))
    }

    pub fn attention(is_attending: bool) -> Self {
        AnalysisEvent::Attention(Attention { is_attending })
    }
}

/// Engine-reported failure attached to one delivery
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{tag} failed (code {code}): {message}")]
pub struct EventError {
    pub tag: EventTag,
    pub code: i32,
    pub message: String,
}

impl EventError {
    pub fn new(tag: EventTag, code: i32, message: impl Into<String>) -> Self {
        Self {
            tag,
            code,
            message: message.into(),
        }
    }
}

/// One engine callback invocation: a payload or an error, never both
pub type EngineDelivery = Result<AnalysisEvent, EventError>;

/// Tag of a delivery regardless of outcome
pub fn delivery_tag(delivery: &EngineDelivery) -> EventTag {
    match delivery {
        Ok(event) => event.tag(),
        Err(error) => error.tag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tags() {
        assert_eq!(AnalysisEvent::face(true).tag(), EventTag::FaceDetected);
        assert_eq!(AnalysisEvent::FaceNotDetected.tag(), EventTag::FaceNotDetected);
        assert_eq!(AnalysisEvent::attention(false).tag(), EventTag::Attention);
        assert_eq!(
            AnalysisEvent::basic_expression(3, "happy").tag(),
            EventTag::FacialExpression
        );
        assert_eq!(EventTag::all().len(), 8);
    }

    #[test]
    fn test_face_presence_both_shapes() {
        assert_eq!(AnalysisEvent::face(true).face_presence(), Some(true));
        assert_eq!(AnalysisEvent::face(false).face_presence(), Some(false));
        assert_eq!(AnalysisEvent::FaceNotDetected.face_presence(), Some(false));
        assert_eq!(AnalysisEvent::head_pose(0.0, 0.0, 0.0).face_presence(), None);
    }

    #[test]
    fn test_diagnostic_only_tags() {
        assert!(EventTag::MeasureEnv.is_diagnostic_only());
        assert!(EventTag::FacialLandmark.is_diagnostic_only());
        assert!(EventTag::FacialActionUnit.is_diagnostic_only());
        assert!(!EventTag::HeadPose.is_diagnostic_only());
    }

    #[test]
    fn test_delivery_tag() {
        let ok: EngineDelivery = Ok(AnalysisEvent::attention(true));
        let err: EngineDelivery = Err(EventError::new(EventTag::HeadPose, -3, "no face"));
        assert_eq!(delivery_tag(&ok), EventTag::Attention);
        assert_eq!(delivery_tag(&err), EventTag::HeadPose);
        assert_eq!(
            err.unwrap_err().to_string(),
            "head_pose failed (code -3): no face"
        );
    }

    #[test]
    fn test_event_json_shape() {
        let json = r#"{"event":"facial_expression","payload":{"dual":{"basic":{"emotion_index":3,"label":"happy"}}}}"#;
        let event: AnalysisEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, AnalysisEvent::basic_expression(3, "happy"));

        let json = r#"{"event":"face_not_detected"}"#;
        let event: AnalysisEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, AnalysisEvent::FaceNotDetected);
    }
}
