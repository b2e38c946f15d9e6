use super::{run_stream, AudioFeed, FrameSink, StreamSettings, StreamStats};
use crate::audio::EnergyReading;
use crate::classifier::{ChunkPayload, Classifier, ClipPrediction};
use crate::stabilizer::distribution::dist;
use crate::stabilizer::{GateStatus, GateThresholds, PresentationFrame, Shortfall};
use anyhow::{anyhow, bail, Result};
use crossbeam_channel::bounded;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const RATE: u32 = 1_000;

#[derive(Clone, Default)]
struct ScriptedClassifier {
    replies: Arc<Mutex<VecDeque<Result<ChunkPayload>>>>,
    chunk_sizes: Arc<Mutex<Vec<usize>>>,
    resets: Arc<AtomicUsize>,
    fail_reset: bool,
}

impl ScriptedClassifier {
    fn new(replies: Vec<Result<ChunkPayload>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            ..Self::default()
        }
    }
}

impl Classifier for ScriptedClassifier {
    fn classify_clip(&self, _file_name: &str, _bytes: Vec<u8>) -> Result<ClipPrediction> {
        bail!("clip mode is not scripted")
    }

    fn classify_chunk(&self, wav: Vec<u8>) -> Result<ChunkPayload> {
        self.chunk_sizes
            .lock()
            .expect("chunk sizes lock")
            .push(wav.len());
        self.replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("script exhausted")))
    }

    fn reset_stream(&self) -> Result<()> {
        self.resets.fetch_add(1, Ordering::Relaxed);
        if self.fail_reset {
            bail!("connection refused");
        }
        Ok(())
    }
}

#[derive(Default)]
struct CollectingSink {
    energies: Vec<EnergyReading>,
    frames: Vec<PresentationFrame>,
}

impl FrameSink for CollectingSink {
    fn on_energy(&mut self, reading: EnergyReading) -> Result<()> {
        self.energies.push(reading);
        Ok(())
    }

    fn on_frame(&mut self, frame: &PresentationFrame) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

fn settings(min_energy: f32) -> StreamSettings {
    let mut settings = StreamSettings {
        chunk_ms: 100,
        fft_size: 32,
        ..StreamSettings::default()
    };
    settings.stabilizer.thresholds = GateThresholds {
        min_energy,
        min_buffer_ms: 0,
        ..GateThresholds::default()
    };
    settings
}

fn run_with(
    classifier: ScriptedClassifier,
    frames: Vec<Vec<f32>>,
    settings: &StreamSettings,
) -> (Result<StreamStats>, CollectingSink) {
    let (tx, rx) = bounded(frames.len().max(1));
    for frame in frames {
        tx.send(frame).expect("queue frame");
    }
    drop(tx);
    let stop = AtomicBool::new(false);
    let mut sink = CollectingSink::default();
    let result = run_stream(
        classifier,
        AudioFeed {
            frames: rx,
            sample_rate: RATE,
        },
        settings,
        &stop,
        &mut sink,
    );
    (result, sink)
}

fn loud_frames(count: usize) -> Vec<Vec<f32>> {
    (0..count)
        .map(|_| (0..50).map(|i| if i % 2 == 0 { 0.8 } else { -0.8 }).collect())
        .collect()
}

#[test]
fn streams_chunks_through_the_pipeline() {
    let jazz = || Ok(ChunkPayload::ready(dist(&[("jazz", 0.9), ("rock", 0.1)])).with_latency(12.0));
    let classifier = ScriptedClassifier::new(vec![jazz(), jazz()]);
    let sizes = classifier.chunk_sizes.clone();
    let resets = classifier.resets.clone();

    let (result, sink) = run_with(classifier, loud_frames(4), &settings(0.0));
    let stats = result.expect("stream");

    assert_eq!(resets.load(Ordering::Relaxed), 1);
    assert_eq!(stats.capture_frames, 4);
    assert_eq!(stats.chunks_submitted, 2);
    assert_eq!(stats.frames_presented, 2);
    assert_eq!(sink.energies.len(), 4);
    // 100 samples of 16-bit mono plus the 44-byte header.
    assert_eq!(*sizes.lock().expect("sizes"), vec![244, 244]);

    let last = sink.frames.last().expect("frame");
    assert_eq!(last.status, GateStatus::Predicting);
    assert_eq!(last.label.as_deref(), Some("jazz"));
    assert_eq!(last.confidence_pct, Some(90));
    assert_eq!(last.latency_ms, Some(12.0));
}

#[test]
fn every_frame_belongs_to_one_session() {
    let jazz = || Ok(ChunkPayload::ready(dist(&[("jazz", 1.0)])));
    let (result, sink) = run_with(
        ScriptedClassifier::new(vec![jazz(), jazz(), jazz()]),
        loud_frames(6),
        &settings(0.0),
    );
    result.expect("stream");
    let generation = sink.frames[0].generation;
    assert!(sink.frames.iter().all(|frame| frame.generation == generation));
}

#[test]
fn classifier_errors_are_transient() {
    let classifier = ScriptedClassifier::new(vec![
        Err(anyhow!("timeout")),
        Ok(ChunkPayload::ready(dist(&[("rock", 0.7), ("pop", 0.3)]))),
    ]);
    let (result, sink) = run_with(classifier, loud_frames(4), &settings(0.0));
    let stats = result.expect("stream");
    assert_eq!(stats.classifier_errors, 1);
    assert_eq!(sink.frames.len(), 1);
    assert_eq!(sink.frames[0].label.as_deref(), Some("rock"));
}

#[test]
fn malformed_payloads_are_counted_and_skipped() {
    let malformed = ChunkPayload {
        ready: true,
        ..ChunkPayload::default()
    };
    let (result, sink) = run_with(
        ScriptedClassifier::new(vec![Ok(malformed)]),
        loud_frames(2),
        &settings(0.0),
    );
    let stats = result.expect("stream");
    assert_eq!(stats.malformed_payloads, 1);
    assert!(sink.frames.is_empty());
}

#[test]
fn backend_buffering_is_reported() {
    let (result, sink) = run_with(
        ScriptedClassifier::new(vec![Ok(ChunkPayload::buffering(Some(4)))]),
        loud_frames(2),
        &settings(0.0),
    );
    result.expect("stream");
    assert_eq!(
        sink.frames[0].status,
        GateStatus::Buffering {
            needed: Some(Shortfall::Frames(4))
        }
    );
    assert_eq!(sink.frames[0].label, None);
}

#[test]
fn silence_is_gated_to_listening() {
    let classifier =
        ScriptedClassifier::new(vec![Ok(ChunkPayload::ready(dist(&[("jazz", 0.95)])))]);
    let silent = vec![vec![0.0; 50], vec![0.0; 50]];
    let (result, sink) = run_with(classifier, silent, &settings(0.02));
    result.expect("stream");
    assert!(matches!(
        sink.frames[0].status,
        GateStatus::Listening { .. }
    ));
    assert_eq!(sink.frames[0].label, None);
    assert!(sink.frames[0].bars.is_some());
}

#[test]
fn failed_reset_does_not_abort_the_session() {
    let mut classifier =
        ScriptedClassifier::new(vec![Ok(ChunkPayload::ready(dist(&[("jazz", 1.0)])))]);
    classifier.fail_reset = true;
    let (result, sink) = run_with(classifier, loud_frames(2), &settings(0.0));
    assert!(result.is_ok());
    assert_eq!(sink.frames.len(), 1);
}

#[test]
fn stop_flag_ends_the_session_without_processing() {
    let (_tx, rx) = bounded::<Vec<f32>>(1);
    let stop = AtomicBool::new(true);
    let mut sink = CollectingSink::default();
    let stats = run_stream(
        ScriptedClassifier::default(),
        AudioFeed {
            frames: rx,
            sample_rate: RATE,
        },
        &settings(0.0),
        &stop,
        &mut sink,
    )
    .expect("stream");
    assert_eq!(stats, StreamStats::default());
}

#[test]
fn sink_errors_stop_the_stream() {
    struct Broken;
    impl FrameSink for Broken {
        fn on_frame(&mut self, _frame: &PresentationFrame) -> Result<()> {
            bail!("stdout closed")
        }
    }

    let (tx, rx) = bounded(2);
    for frame in loud_frames(2) {
        tx.send(frame).expect("queue frame");
    }
    drop(tx);
    let stop = AtomicBool::new(false);
    let result = run_stream(
        ScriptedClassifier::new(vec![Ok(ChunkPayload::ready(dist(&[("jazz", 1.0)])))]),
        AudioFeed {
            frames: rx,
            sample_rate: RATE,
        },
        &settings(0.0),
        &stop,
        &mut Broken,
    );
    assert!(result.is_err());
}
