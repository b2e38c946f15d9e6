//! Hysteresis-based label selection.

use super::distribution::{top_label, ClassDistribution};

/// Probability lead a challenger needs over the incumbent.
pub const DEFAULT_SWITCH_MARGIN: f64 = 0.08;
/// Consecutive qualifying updates before the challenger takes over.
pub const DEFAULT_HOLD_FRAMES: u32 = 3;

/// Turns a (smoothed) distribution into a flicker-resistant label.
pub trait LabelSelector {
    fn update(&mut self, probs: &ClassDistribution) -> Option<&str>;
    fn reset(&mut self);
    fn current(&self) -> Option<&str>;
}

/// Keeps the current label until a challenger leads it by `margin` for
/// `hold_frames` consecutive updates.
///
/// The very first decision after construction or `reset` is taken immediately.
#[derive(Debug, Clone)]
pub struct StableLabelSelector {
    margin: f64,
    hold_frames: u32,
    current: Option<String>,
    streak: u32,
}

impl StableLabelSelector {
    pub fn new(margin: f64, hold_frames: u32) -> Self {
        Self {
            margin,
            hold_frames: hold_frames.max(1),
            current: None,
            streak: 0,
        }
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn hold_frames(&self) -> u32 {
        self.hold_frames
    }

    /// Consecutive updates the current challenger has held its lead.
    pub fn streak(&self) -> u32 {
        self.streak
    }
}

impl Default for StableLabelSelector {
    fn default() -> Self {
        Self::new(DEFAULT_SWITCH_MARGIN, DEFAULT_HOLD_FRAMES)
    }
}

impl LabelSelector for StableLabelSelector {
    fn update(&mut self, probs: &ClassDistribution) -> Option<&str> {
        let best = top_label(probs);

        let Some(current) = self.current.as_deref() else {
            self.current = best.map(|(label, _)| label.to_string());
            self.streak = 0;
            return self.current.as_deref();
        };

        let current_value = probs.get(current).copied().unwrap_or(0.0);
        match best {
            Some((label, _)) if label == current => {
                self.streak = 0;
            }
            Some((label, value)) if value >= current_value + self.margin => {
                self.streak += 1;
                if self.streak >= self.hold_frames {
                    tracing::debug!(from = current, to = label, "stable label switched");
                    self.current = Some(label.to_string());
                    self.streak = 0;
                }
            }
            _ => {
                self.streak = 0;
            }
        }
        self.current.as_deref()
    }

    fn reset(&mut self) {
        self.current = None;
        self.streak = 0;
    }

    fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}
