use std::fmt;

/// Errors surfaced synchronously by the stabilization core.
///
/// I/O-facing layers (config, HTTP, capture) use `anyhow`; this enum only covers
/// conditions the pipeline itself can detect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StabilizerError {
    /// A classifier payload broke the response contract (for example `ready`
    /// without `probs`). Nothing was committed to smoother or selector state.
    MalformedPayload { reason: String },
    /// `ingest` was called while no session is running.
    SessionInactive,
}

impl StabilizerError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for StabilizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StabilizerError::MalformedPayload { reason } => {
                write!(f, "malformed classifier payload: {reason}")
            }
            StabilizerError::SessionInactive => write!(f, "no streaming session is active"),
        }
    }
}

impl std::error::Error for StabilizerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_payload_message_includes_reason() {
        let err = StabilizerError::malformed("ready payload without probs");
        assert_eq!(
            err.to_string(),
            "malformed classifier payload: ready payload without probs"
        );
    }

    #[test]
    fn converts_into_anyhow() {
        let err: anyhow::Error = StabilizerError::SessionInactive.into();
        assert!(err.to_string().contains("no streaming session"));
    }
}
