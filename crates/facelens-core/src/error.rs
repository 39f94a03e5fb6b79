//! Error types for facelens

use thiserror::Error;

use crate::{EventError, EventTag, Permission};

/// Core facelens errors
#[derive(Error, Debug)]
pub enum FacelensError {
    // Session errors
    #[error("License rejected")]
    LicenseRejected,

    #[error("Permission denied: {0}")]
    PermissionDenied(Permission),

    #[error("Invalid transition: cannot {op} while {from}")]
    InvalidTransition { from: String, op: &'static str },

    // Event errors
    #[error("Event error: {0}")]
    EventError(#[from] EventError),

    #[error("Payload out of range: {tag} {field} = {index}, table has {bound} entries")]
    PayloadOutOfRange {
        tag: EventTag,
        field: &'static str,
        index: usize,
        bound: usize,
    },

    // Collaborator errors
    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result type for facelens operations
pub type FacelensResult<T> = Result<T, FacelensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FacelensError::PayloadOutOfRange {
            tag: EventTag::FacialExpression,
            field: "basic.emotion_index",
            index: 9,
            bound: 7,
        };
        assert_eq!(
            err.to_string(),
            "Payload out of range: facial_expression basic.emotion_index = 9, table has 7 entries"
        );
    }

    #[test]
    fn test_event_error_converts() {
        let event = EventError::new(EventTag::Attention, 1, "busy");
        let err: FacelensError = event.into();
        assert!(matches!(err, FacelensError::EventError(ref e) if e.code == 1));
    }
}
