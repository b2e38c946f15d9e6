//! Session-scoped orchestration of smoother, selector, and gate.

use super::distribution::ClassDistribution;
use super::gate::{self, GateInput, GateStatus, GateThresholds};
use super::selector::{LabelSelector, StableLabelSelector};
use super::smoother::{ProbabilitySmoother, Smoother};
use super::StabilizerConfig;
use crate::audio::{band_energy, EnergyReading};
use crate::classifier::{ChunkPayload, ChunkReading};
use crate::error::StabilizerError;
use crate::log_debug;
use serde::Serialize;
use std::time::Instant;

/// Monotonic time since the current session started.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionClock {
    started: Option<Instant>,
}

impl SessionClock {
    pub fn restart(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn clear(&mut self) {
        self.started = None;
    }

    /// Milliseconds since `restart`, or 0 when the clock is not running.
    pub fn elapsed_ms(&self) -> u64 {
        self.started
            .map(|started| started.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Everything the display layer needs for one processed event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationFrame {
    pub generation: u64,
    #[serde(flatten)]
    pub status: GateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_pct: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bars: Option<ClassDistribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
}

/// Turns raw classifier payloads into presentation frames.
///
/// Owns all per-session state. `start` and `stop` always reset the smoother and
/// the selector together and bump the session generation, so results tagged
/// with an older generation can be dropped with `ingest_for`.
pub struct StabilizationPipeline<S = ProbabilitySmoother, L = StableLabelSelector> {
    smoother: S,
    selector: L,
    thresholds: GateThresholds,
    clock: SessionClock,
    generation: u64,
    active: bool,
}

impl StabilizationPipeline {
    pub fn new(config: &StabilizerConfig) -> Self {
        Self::with_parts(
            ProbabilitySmoother::new(config.smoothing_alpha),
            StableLabelSelector::new(config.switch_margin, config.hold_frames),
            config.thresholds,
        )
    }
}

impl<S: Smoother, L: LabelSelector> StabilizationPipeline<S, L> {
    /// Build from explicit components; the pipeline starts stopped.
    pub fn with_parts(smoother: S, selector: L, thresholds: GateThresholds) -> Self {
        Self {
            smoother,
            selector,
            thresholds,
            clock: SessionClock::default(),
            generation: 0,
            active: false,
        }
    }

    /// Begin a new session and return its generation.
    pub fn start(&mut self, thresholds: GateThresholds) -> u64 {
        self.reset_session_state();
        self.thresholds = thresholds;
        self.clock.restart();
        self.active = true;
        self.generation += 1;
        tracing::info!(generation = self.generation, "stabilizer session started");
        log_debug(&format!("stabilizer session {} started", self.generation));
        self.generation
    }

    /// End the current session. Results from it are ignored afterwards.
    pub fn stop(&mut self) {
        self.reset_session_state();
        self.clock.clear();
        if self.active {
            tracing::info!(generation = self.generation, "stabilizer session stopped");
            log_debug(&format!("stabilizer session {} stopped", self.generation));
        }
        self.active = false;
        self.generation += 1;
    }

    fn reset_session_state(&mut self) {
        self.smoother.reset();
        self.selector.reset();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn thresholds(&self) -> &GateThresholds {
        &self.thresholds
    }

    /// Elapsed session time from the pipeline's own clock.
    pub fn elapsed_ms(&self) -> u64 {
        self.clock.elapsed_ms()
    }

    /// Energy estimate for visualization-only consumers; never touches
    /// smoother or selector state.
    pub fn energy_tick(&self, spectrum: &[u8]) -> EnergyReading {
        band_energy(spectrum)
    }

    /// Like `ingest`, but drops results that belong to an older session.
    pub fn ingest_for(
        &mut self,
        generation: u64,
        payload: &ChunkPayload,
        energy: EnergyReading,
        elapsed_ms: u64,
    ) -> Result<Option<PresentationFrame>, StabilizerError> {
        if !self.active || generation != self.generation {
            log_debug(&format!(
                "discarding late classifier result (generation {generation}, current {})",
                self.generation
            ));
            return Ok(None);
        }
        self.ingest(payload, energy, elapsed_ms).map(Some)
    }

    /// Process one classifier payload.
    ///
    /// Not-ready payloads bypass the smoother and selector. A malformed payload
    /// returns an error before any state is touched.
    pub fn ingest(
        &mut self,
        payload: &ChunkPayload,
        energy: EnergyReading,
        elapsed_ms: u64,
    ) -> Result<PresentationFrame, StabilizerError> {
        if !self.active {
            return Err(StabilizerError::SessionInactive);
        }

        match payload.reading()? {
            ChunkReading::NotReady { needed } => {
                let decision = gate::evaluate(
                    &GateInput {
                        elapsed_ms,
                        ready: false,
                        needed,
                        energy,
                        top_probability: 0.0,
                    },
                    &self.thresholds,
                );
                let bars = if decision.show_bars {
                    self.smoother.current().cloned()
                } else {
                    None
                };
                Ok(PresentationFrame {
                    generation: self.generation,
                    status: decision.status,
                    label: None,
                    confidence_pct: None,
                    bars,
                    latency_ms: payload.latency_ms,
                })
            }
            ChunkReading::Ready { probs, latency_ms } => {
                let smoothed = self.smoother.update(probs);
                let stable = self.selector.update(smoothed);
                let top_probability = stable
                    .and_then(|label| smoothed.get(label).copied())
                    .unwrap_or(0.0);
                let decision = gate::evaluate(
                    &GateInput {
                        elapsed_ms,
                        ready: true,
                        needed: None,
                        energy,
                        top_probability,
                    },
                    &self.thresholds,
                );
                let label = stable.filter(|_| decision.show_label).map(str::to_string);
                Ok(PresentationFrame {
                    generation: self.generation,
                    status: decision.status,
                    confidence_pct: label
                        .as_ref()
                        .map(|_| gate::confidence_pct(top_probability)),
                    label,
                    bars: decision.show_bars.then(|| smoothed.clone()),
                    latency_ms,
                })
            }
        }
    }
}
