//! Observability sink backed by `tracing`

use facelens_core::EventTag;
use facelens_present::Diagnostic;

use crate::ObservabilitySink;

/// Forwards every diagnostic to `tracing` under the `facelens::events` target
///
/// Per-frame environment, landmark and action unit payloads go to `trace`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ObservabilitySink for TracingSink {
    fn record(&self, tag: EventTag, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::Observed { summary, .. } if tag.is_diagnostic_only() => {
                tracing::trace!(target: "facelens::events", tag = %tag, "{summary}");
            }
            Diagnostic::Observed { summary, .. } => {
                tracing::debug!(target: "facelens::events", tag = %tag, "{summary}");
            }
            Diagnostic::EventFailed(error) => {
                tracing::warn!(
                    target: "facelens::events",
                    tag = %tag,
                    code = error.code,
                    "engine error: {}",
                    error.message
                );
            }
            violation => {
                tracing::warn!(
                    target: "facelens::events",
                    tag = %tag,
                    "contract violation, update skipped: {violation}"
                );
            }
        }
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ObservabilitySink for NullSink {
    fn record(&self, _tag: EventTag, _diagnostic: &Diagnostic) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use facelens_core::EventError;

    #[test]
    fn test_tracing_sink_accepts_every_kind() {
        let sink = TracingSink;
        sink.record(
            EventTag::Attention,
            &Diagnostic::Observed {
                tag: EventTag::Attention,
                summary: "attending".to_string(),
            },
        );
        sink.record(
            EventTag::FacialLandmark,
            &Diagnostic::Observed {
                tag: EventTag::FacialLandmark,
                summary: "68 points".to_string(),
            },
        );
        sink.record(
            EventTag::HeadPose,
            &Diagnostic::EventFailed(EventError::new(EventTag::HeadPose, 1, "lost")),
        );
        sink.record(
            EventTag::FacialExpression,
            &Diagnostic::PayloadOutOfRange {
                tag: EventTag::FacialExpression,
                field: "emotion_index",
                index: 8,
                bound: 7,
            },
        );
    }
}
