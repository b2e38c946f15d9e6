//! Exponential moving average over class-probability distributions.

use super::distribution::{total, ClassDistribution};

/// Default EMA weight for the newest frame.
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.22;

/// Smooths successive probability frames into one display distribution.
pub trait Smoother {
    /// Fold `next` into the running state and return the updated state.
    fn update(&mut self, next: &ClassDistribution) -> &ClassDistribution;
    /// Drop all state so the next `update` behaves like the first one.
    fn reset(&mut self);
    /// Peek at the current state without mutating it.
    fn current(&self) -> Option<&ClassDistribution>;
}

#[derive(Debug, Clone, PartialEq, Default)]
enum SmootherState {
    #[default]
    Empty,
    Initialized(ClassDistribution),
}

/// EMA smoother with per-frame renormalization.
///
/// Labels missing from a new frame are not decayed toward zero; they only move
/// through renormalization. With a fixed vocabulary this never matters, but a
/// label that disappears from the vocabulary keeps its share.
#[derive(Debug, Clone)]
pub struct ProbabilitySmoother {
    alpha: f64,
    state: SmootherState,
}

impl ProbabilitySmoother {
    /// `alpha` is clamped into `(0, 1]`; config validation rejects anything else
    /// before it gets here.
    pub fn new(alpha: f64) -> Self {
        let alpha = if alpha.is_finite() {
            alpha.clamp(f64::MIN_POSITIVE, 1.0)
        } else {
            DEFAULT_SMOOTHING_ALPHA
        };
        Self {
            alpha,
            state: SmootherState::Empty,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    fn blend(&self, prev: &ClassDistribution, next: &ClassDistribution) -> ClassDistribution {
        let mut blended = prev.clone();
        for (label, value) in next {
            let entry = blended.entry(label.clone()).or_insert(0.0);
            *entry = self.alpha * value + (1.0 - self.alpha) * *entry;
        }
        let sum = total(&blended);
        let divisor = if sum == 0.0 { 1.0 } else { sum };
        for value in blended.values_mut() {
            *value /= divisor;
        }
        blended
    }
}

impl Default for ProbabilitySmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_ALPHA)
    }
}

impl Smoother for ProbabilitySmoother {
    fn update(&mut self, next: &ClassDistribution) -> &ClassDistribution {
        let committed = match &self.state {
            // First frame is adopted as-is so there is no ramp up from zero.
            SmootherState::Empty => next.clone(),
            SmootherState::Initialized(prev) => self.blend(prev, next),
        };
        self.state = SmootherState::Initialized(committed);
        match &self.state {
            SmootherState::Initialized(dist) => dist,
            SmootherState::Empty => unreachable!("state was initialized above"),
        }
    }

    fn reset(&mut self) {
        self.state = SmootherState::Empty;
    }

    fn current(&self) -> Option<&ClassDistribution> {
        match &self.state {
            SmootherState::Empty => None,
            SmootherState::Initialized(dist) => Some(dist),
        }
    }
}
