//! JSON contracts for the remote classifier.
//!
//! Responses are decoded leniently (every field optional except `ready` on
//! chunk responses) and validated separately, so a contract violation reaches
//! the pipeline as a typed error instead of a serde failure.

use crate::error::StabilizerError;
use crate::stabilizer::{ClassDistribution, Shortfall};
use serde::{Deserialize, Serialize};

/// Response to a full clip submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipPrediction {
    pub top: String,
    pub probs: ClassDistribution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
}

impl ClipPrediction {
    pub fn validate(&self) -> Result<(), StabilizerError> {
        validate_probs(&self.probs)
    }
}

/// Response to a streaming chunk submission.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needed_frames: Option<u64>,
    /// Some backends report the shortfall in samples instead of frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needed_samples: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probs: Option<ClassDistribution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
}

/// A chunk payload that passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChunkReading<'a> {
    NotReady {
        needed: Option<Shortfall>,
    },
    Ready {
        probs: &'a ClassDistribution,
        latency_ms: Option<f64>,
    },
}

impl ChunkPayload {
    /// Ready payload carrying `probs`.
    pub fn ready(probs: ClassDistribution) -> Self {
        Self {
            ready: true,
            probs: Some(probs),
            ..Self::default()
        }
    }

    /// Not-ready payload reporting a frame shortfall.
    pub fn buffering(needed_frames: Option<u64>) -> Self {
        Self {
            ready: false,
            needed_frames,
            ..Self::default()
        }
    }

    pub fn with_latency(mut self, latency_ms: f64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    pub fn shortfall(&self) -> Option<Shortfall> {
        self.needed_frames
            .map(Shortfall::Frames)
            .or(self.needed_samples.map(Shortfall::Samples))
    }

    /// Check the payload against the response contract.
    ///
    /// `probs` on a not-ready payload is ignored. A ready payload must carry a
    /// distribution of finite, non-negative values; an empty one is allowed.
    pub fn reading(&self) -> Result<ChunkReading<'_>, StabilizerError> {
        if !self.ready {
            return Ok(ChunkReading::NotReady {
                needed: self.shortfall(),
            });
        }
        let probs = self
            .probs
            .as_ref()
            .ok_or_else(|| StabilizerError::malformed("ready payload without probs"))?;
        validate_probs(probs)?;
        Ok(ChunkReading::Ready {
            probs,
            latency_ms: self.latency_ms,
        })
    }
}

pub(crate) fn validate_probs(probs: &ClassDistribution) -> Result<(), StabilizerError> {
    for (label, value) in probs {
        if !value.is_finite() {
            return Err(StabilizerError::malformed(format!(
                "probability for '{label}' is not finite"
            )));
        }
        if *value < 0.0 {
            return Err(StabilizerError::malformed(format!(
                "probability for '{label}' is negative ({value})"
            )));
        }
    }
    Ok(())
}
