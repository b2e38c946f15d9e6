//! Prediction stabilization: EMA smoothing, hysteresis label selection, and
//! display gating.
//!
//! Classifier results arrive roughly every 300 ms as independent probability
//! distributions. Shown raw, the top label flickers between near-tied classes.
//! The pipeline smooths the distributions, holds the displayed label until a
//! challenger leads consistently, and hides the label during warm-up, backend
//! buffering, silence, and low confidence.

pub mod distribution;
mod gate;
mod pipeline;
mod selector;
mod smoother;

pub use distribution::{top_label, ClassDistribution};
pub use gate::{
    confidence_pct, evaluate, GateDecision, GateInput, GateStatus, GateThresholds, Shortfall,
    DEFAULT_MIN_BUFFER_MS, DEFAULT_MIN_CONFIDENCE, DEFAULT_MIN_ENERGY,
};
pub use pipeline::{PresentationFrame, SessionClock, StabilizationPipeline};
pub use selector::{LabelSelector, StableLabelSelector, DEFAULT_HOLD_FRAMES, DEFAULT_SWITCH_MARGIN};
pub use smoother::{ProbabilitySmoother, Smoother, DEFAULT_SMOOTHING_ALPHA};

/// Tunable parameters for the stabilization pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizerConfig {
    pub smoothing_alpha: f64,
    pub switch_margin: f64,
    pub hold_frames: u32,
    pub thresholds: GateThresholds,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: DEFAULT_SMOOTHING_ALPHA,
            switch_margin: DEFAULT_SWITCH_MARGIN,
            hold_frames: DEFAULT_HOLD_FRAMES,
            thresholds: GateThresholds::default(),
        }
    }
}
