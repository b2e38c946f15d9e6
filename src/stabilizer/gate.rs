//! Decides whether a processed frame is shown to the user.

use crate::audio::EnergyReading;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.20;
pub const DEFAULT_MIN_ENERGY: f32 = 0.02;
pub const DEFAULT_MIN_BUFFER_MS: u64 = 300;

/// Per-session gate configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateThresholds {
    pub min_confidence: f64,
    pub min_energy: f32,
    pub min_buffer_ms: u64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            min_energy: DEFAULT_MIN_ENERGY,
            min_buffer_ms: DEFAULT_MIN_BUFFER_MS,
        }
    }
}

/// How far the classifier backend is from a full analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "count", rename_all = "snake_case")]
pub enum Shortfall {
    Frames(u64),
    Samples(u64),
}

/// User-visible status category for one presentation frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GateStatus {
    /// Still inside the session's initial buffer window.
    WarmingUp,
    /// Backend has not buffered enough audio to classify yet.
    Buffering { needed: Option<Shortfall> },
    /// Silence or low confidence.
    Listening { energy: f32, confidence_pct: u32 },
    /// A label is being surfaced.
    Predicting,
}

impl GateStatus {
    pub fn label(&self) -> &'static str {
        match self {
            GateStatus::WarmingUp => "warming_up",
            GateStatus::Buffering { .. } => "buffering",
            GateStatus::Listening { .. } => "listening",
            GateStatus::Predicting => "predicting",
        }
    }
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateStatus::WarmingUp => write!(f, "buffering… (warming up)"),
            GateStatus::Buffering { needed: None } => write!(f, "buffering… (? frames needed)"),
            GateStatus::Buffering {
                needed: Some(Shortfall::Frames(count)),
            } => write!(f, "buffering… ({count} frames needed)"),
            GateStatus::Buffering {
                needed: Some(Shortfall::Samples(count)),
            } => write!(f, "buffering… ({count} samples needed)"),
            GateStatus::Listening {
                energy,
                confidence_pct,
            } => write!(f, "listening… (energy {energy:.3}, conf {confidence_pct}%)"),
            GateStatus::Predicting => write!(f, "predicting"),
        }
    }
}

/// Everything the gate looks at for one frame.
#[derive(Debug, Clone, Copy)]
pub struct GateInput {
    pub elapsed_ms: u64,
    pub ready: bool,
    pub needed: Option<Shortfall>,
    pub energy: EnergyReading,
    /// Smoothed probability of the currently selected stable label.
    pub top_probability: f64,
}

/// Gate verdict: status plus what the display layer may show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    pub status: GateStatus,
    pub show_label: bool,
    pub show_bars: bool,
}

/// Round a probability to a whole percentage.
pub fn confidence_pct(probability: f64) -> u32 {
    (probability * 100.0).round().max(0.0) as u32
}

/// Apply the gate rules in order; the first match wins.
///
/// Warm-up is checked before readiness, and readiness before energy and
/// confidence, since a backend that is not ready has no distribution to gate.
pub fn evaluate(input: &GateInput, thresholds: &GateThresholds) -> GateDecision {
    if input.elapsed_ms < thresholds.min_buffer_ms {
        return GateDecision {
            status: GateStatus::WarmingUp,
            show_label: false,
            show_bars: true,
        };
    }

    if !input.ready {
        return GateDecision {
            status: GateStatus::Buffering {
                needed: input.needed,
            },
            show_label: false,
            show_bars: false,
        };
    }

    let energy = input.energy.mean();
    if energy < thresholds.min_energy || input.top_probability < thresholds.min_confidence {
        return GateDecision {
            status: GateStatus::Listening {
                energy,
                confidence_pct: confidence_pct(input.top_probability),
            },
            show_label: false,
            show_bars: true,
        };
    }

    GateDecision {
        status: GateStatus::Predicting,
        show_label: true,
        show_bars: true,
    }
}
