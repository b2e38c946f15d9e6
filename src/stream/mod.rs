//! Live streaming runtime.
//!
//! One loop owns the stabilization pipeline. Capture frames drive energy
//! ticks and chunk accumulation; finished chunks go to a single classifier
//! worker, and its results come back tagged with the session generation so
//! anything that resolves after `stop` is ignored.

#[cfg(test)]
mod tests;
mod worker;

use crate::audio::{
    encode_wav_mono, ChunkAccumulator, EnergyReading, SpectrumAnalyser, DEFAULT_CHUNK_MS,
    DEFAULT_FFT_SIZE,
};
use crate::classifier::{reset_remote_session, Classifier};
use crate::error::StabilizerError;
use crate::log_debug;
use crate::stabilizer::{PresentationFrame, StabilizationPipeline, StabilizerConfig};
use anyhow::{anyhow, Result};
use crossbeam_channel::{never, select, Receiver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use worker::{ChunkJob, ChunkResult, ClassifierWorker, Submit};

/// Chunks allowed to wait for the classifier before new ones are dropped.
pub const DEFAULT_JOB_CAPACITY: usize = 2;
/// How often the loop re-checks the stop flag when idle.
const STOP_POLL_MS: u64 = 50;

/// Runtime knobs for one streaming session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamSettings {
    pub chunk_ms: u64,
    pub fft_size: usize,
    pub job_capacity: usize,
    pub stabilizer: StabilizerConfig,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            chunk_ms: DEFAULT_CHUNK_MS,
            fft_size: DEFAULT_FFT_SIZE,
            job_capacity: DEFAULT_JOB_CAPACITY,
            stabilizer: StabilizerConfig::default(),
        }
    }
}

/// Receives everything the runtime produces for display.
pub trait FrameSink {
    /// Called once per capture frame with the latest band energy.
    fn on_energy(&mut self, _reading: EnergyReading) -> Result<()> {
        Ok(())
    }

    /// Called for every classifier result that belongs to the live session.
    fn on_frame(&mut self, frame: &PresentationFrame) -> Result<()>;
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub capture_frames: u64,
    pub chunks_submitted: u64,
    pub chunks_dropped: u64,
    pub frames_presented: u64,
    pub late_results: u64,
    pub classifier_errors: u64,
    pub malformed_payloads: u64,
}

/// Mono capture frames plus the rate they were recorded at.
pub struct AudioFeed {
    pub frames: Receiver<Vec<f32>>,
    pub sample_rate: u32,
}

/// Run one streaming session until `stop` is set, or until the feed closes
/// and every submitted chunk has been answered.
///
/// The backend's stream buffer is reset first; a failed reset is logged and
/// the session continues.
pub fn run_stream<C>(
    classifier: C,
    feed: AudioFeed,
    settings: &StreamSettings,
    stop: &AtomicBool,
    sink: &mut dyn FrameSink,
) -> Result<StreamStats>
where
    C: Classifier + Send + 'static,
{
    reset_remote_session(&classifier);

    let mut session = StreamSession::new(settings, feed.sample_rate);
    let worker = ClassifierWorker::spawn(classifier, settings.job_capacity);
    let tick = Duration::from_millis(STOP_POLL_MS);
    let mut capture_open = true;
    let mut failure: Option<anyhow::Error> = None;

    while failure.is_none() && !stop.load(Ordering::Relaxed) {
        if !capture_open && session.in_flight == 0 {
            break;
        }
        let capture_guard = if capture_open {
            None
        } else {
            Some(never::<Vec<f32>>())
        };
        let frames_rx = capture_guard.as_ref().unwrap_or(&feed.frames);
        select! {
            recv(frames_rx) -> frame => match frame {
                Ok(samples) => {
                    if let Err(err) = session.on_samples(&samples, &worker, sink) {
                        failure = Some(err);
                    }
                }
                Err(_) => {
                    log_debug("capture feed closed; draining classifier results");
                    capture_open = false;
                }
            },
            recv(worker.results()) -> result => match result {
                Ok(result) => {
                    if let Err(err) = session.on_result(result, sink) {
                        failure = Some(err);
                    }
                }
                Err(_) => failure = Some(anyhow!("classifier worker exited unexpectedly")),
            },
            default(tick) => {}
        }
    }

    session.pipeline.stop();
    worker.shutdown();
    let stats = session.stats;
    log_debug(&format!("stream stopped: {stats:?}"));
    tracing::info!(
        chunks_submitted = stats.chunks_submitted,
        chunks_dropped = stats.chunks_dropped,
        frames_presented = stats.frames_presented,
        late_results = stats.late_results,
        "stream session finished"
    );
    match failure {
        Some(err) => Err(err),
        None => Ok(stats),
    }
}

struct StreamSession {
    pipeline: StabilizationPipeline,
    analyser: SpectrumAnalyser,
    chunker: ChunkAccumulator,
    sample_rate: u32,
    generation: u64,
    energy: EnergyReading,
    in_flight: usize,
    stats: StreamStats,
}

impl StreamSession {
    fn new(settings: &StreamSettings, sample_rate: u32) -> Self {
        let mut pipeline = StabilizationPipeline::new(&settings.stabilizer);
        let generation = pipeline.start(settings.stabilizer.thresholds);
        Self {
            pipeline,
            analyser: SpectrumAnalyser::new(settings.fft_size),
            chunker: ChunkAccumulator::new(sample_rate, settings.chunk_ms),
            sample_rate,
            generation,
            energy: EnergyReading::default(),
            in_flight: 0,
            stats: StreamStats::default(),
        }
    }

    fn on_samples(
        &mut self,
        samples: &[f32],
        worker: &ClassifierWorker,
        sink: &mut dyn FrameSink,
    ) -> Result<()> {
        self.stats.capture_frames += 1;
        self.analyser.push_samples(samples);
        let spectrum = self.analyser.byte_spectrum();
        self.energy = self.pipeline.energy_tick(&spectrum);
        sink.on_energy(self.energy)?;

        let Some(chunk) = self.chunker.push(samples) else {
            return Ok(());
        };
        let wav = encode_wav_mono(&chunk, self.sample_rate)?;
        match worker.submit(ChunkJob {
            generation: self.generation,
            wav,
        }) {
            Submit::Queued => {
                self.in_flight += 1;
                self.stats.chunks_submitted += 1;
            }
            Submit::Dropped => {
                self.stats.chunks_dropped += 1;
                log_debug("classifier busy; dropping chunk");
            }
            Submit::Closed => return Err(anyhow!("classifier worker is not accepting chunks")),
        }
        Ok(())
    }

    fn on_result(&mut self, result: ChunkResult, sink: &mut dyn FrameSink) -> Result<()> {
        self.in_flight = self.in_flight.saturating_sub(1);
        let payload = match result.outcome {
            Ok(payload) => payload,
            Err(_) => {
                // Transient; the worker already logged it.
                self.stats.classifier_errors += 1;
                return Ok(());
            }
        };
        let elapsed_ms = self.pipeline.elapsed_ms();
        match self
            .pipeline
            .ingest_for(result.generation, &payload, self.energy, elapsed_ms)
        {
            Ok(Some(frame)) => {
                self.stats.frames_presented += 1;
                sink.on_frame(&frame)
            }
            Ok(None) => {
                self.stats.late_results += 1;
                Ok(())
            }
            Err(err @ StabilizerError::MalformedPayload { .. }) => {
                self.stats.malformed_payloads += 1;
                log_debug(&format!("ignoring classifier response: {err}"));
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
