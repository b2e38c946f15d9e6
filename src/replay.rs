//! Deterministic replay of recorded classifier sessions.
//!
//! Input is JSON lines, one event per line:
//!
//! ```text
//! {"kind":"start"}
//! {"kind":"spectrum","bins":[120,80,40,10]}
//! {"kind":"prediction","elapsed_ms":900,"payload":{"ready":true,"probs":{"jazz":0.9}}}
//! {"kind":"stop"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::audio::EnergyReading;
use crate::classifier::ChunkPayload;
use crate::error::StabilizerError;
use crate::log_debug;
use crate::stabilizer::{GateThresholds, StabilizationPipeline, StabilizerConfig};
use crate::stream::FrameSink;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayEvent {
    /// Begin a session, optionally overriding the configured thresholds.
    Start {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thresholds: Option<GateThresholds>,
    },
    /// A byte spectrum; updates the energy used by later predictions.
    Spectrum { bins: Vec<u8> },
    /// A classifier response observed `elapsed_ms` into the session.
    Prediction {
        elapsed_ms: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        energy: Option<EnergyReading>,
        payload: ChunkPayload,
    },
    Stop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub sessions: u64,
    pub frames: u64,
    pub ignored: u64,
    pub malformed: u64,
}

/// Feed every event from `reader` through a fresh pipeline.
///
/// Predictions outside a session are ignored and malformed payloads are
/// skipped; both are counted. Unparseable lines are an error.
pub fn run_replay<R: BufRead>(
    reader: R,
    config: &StabilizerConfig,
    sink: &mut dyn FrameSink,
) -> Result<ReplaySummary> {
    let mut pipeline = StabilizationPipeline::new(config);
    let mut energy = EnergyReading::default();
    let mut summary = ReplaySummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("failed to read replay line {line_no}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event: ReplayEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid replay event on line {line_no}"))?;

        match event {
            ReplayEvent::Start { thresholds } => {
                pipeline.start(thresholds.unwrap_or(config.thresholds));
                energy = EnergyReading::default();
                summary.sessions += 1;
            }
            ReplayEvent::Spectrum { bins } => {
                energy = pipeline.energy_tick(&bins);
                sink.on_energy(energy)?;
            }
            ReplayEvent::Prediction {
                elapsed_ms,
                energy: recorded,
                payload,
            } => {
                let energy = recorded.unwrap_or(energy);
                match pipeline.ingest(&payload, energy, elapsed_ms) {
                    Ok(frame) => {
                        summary.frames += 1;
                        sink.on_frame(&frame)?;
                    }
                    Err(StabilizerError::SessionInactive) => {
                        summary.ignored += 1;
                        log_debug(&format!("replay line {line_no}: no active session"));
                    }
                    Err(err @ StabilizerError::MalformedPayload { .. }) => {
                        summary.malformed += 1;
                        log_debug(&format!("replay line {line_no}: {err}"));
                    }
                }
            }
            ReplayEvent::Stop => pipeline.stop(),
        }
    }

    Ok(summary)
}
