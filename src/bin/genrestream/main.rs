//! genrestream entrypoint: live microphone streaming, one-shot clip
//! classification, recorded-session replay, and device listing.
//!
//! # Architecture
//!
//! - Capture callback: downmixes and frames microphone audio
//! - Runtime loop: energy ticks, chunking, stabilization, output
//! - Classifier worker: one HTTP request in flight at a time
//! - Stdin watcher: Enter stops the stream

mod cli_utils;

use anyhow::{Context, Result};
use clap::Parser;
use genrestream::config::AppConfig;
use genrestream::render::TerminalSink;
use genrestream::replay::run_replay;
use genrestream::{init_logging, log_debug, log_file_path, log_panic};
use std::fs::File;
use std::io::{self, BufReader};
use std::panic;
use std::path::Path;

use crate::cli_utils::{format_replay_summary, list_input_devices};

fn main() -> Result<()> {
    let mut config = AppConfig::parse();
    if config.list_input_devices {
        list_input_devices()?;
        return Ok(());
    }

    config.validate()?;
    init_logging(&config);
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        log_panic(info);
        default_hook(info);
    }));
    log_debug("=== genrestream started ===");
    log_debug(&format!("Log file: {:?}", log_file_path()));

    if let Some(path) = config.replay.clone() {
        return replay_file(&path, &config);
    }
    if let Some(path) = config.clip.clone() {
        return classify_clip_file(&path, &config);
    }
    stream_microphone(&config)
}

fn replay_file(path: &Path, config: &AppConfig) -> Result<()> {
    let file =
        File::open(path).with_context(|| format!("failed to open replay '{}'", path.display()))?;
    let stdout = io::stdout();
    let mut sink = TerminalSink::new(stdout.lock(), config.json);
    let summary = run_replay(BufReader::new(file), &config.stabilizer_config(), &mut sink)?;
    log_debug(&format!("replay finished: {summary:?}"));
    eprintln!("{}", format_replay_summary(&summary));
    Ok(())
}

#[cfg(feature = "http")]
fn classify_clip_file(path: &Path, config: &AppConfig) -> Result<()> {
    use genrestream::classifier::{Classifier, HttpClassifier};
    use genrestream::render::{json_line, render_clip, DEFAULT_BAR_WIDTH};

    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read clip '{}'", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("clip.wav")
        .to_string();
    let classifier = HttpClassifier::new(&config.api_url, config.request_timeout())?
        .with_timing_logs(config.log_timings);
    let prediction = classifier.classify_clip(&file_name, bytes)?;
    if config.json {
        println!("{}", json_line(&prediction)?);
    } else {
        print!("{}", render_clip(&prediction, DEFAULT_BAR_WIDTH));
    }
    Ok(())
}

#[cfg(not(feature = "http"))]
fn classify_clip_file(_path: &Path, _config: &AppConfig) -> Result<()> {
    anyhow::bail!("--clip requires building with the 'http' feature")
}

#[cfg(all(feature = "mic", feature = "http"))]
fn stream_microphone(config: &AppConfig) -> Result<()> {
    use crate::cli_utils::{format_stream_stats, spawn_enter_watcher};
    use genrestream::audio::Recorder;
    use genrestream::classifier::HttpClassifier;
    use genrestream::stream::{run_stream, AudioFeed};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    let classifier = HttpClassifier::new(&config.api_url, config.request_timeout())?
        .with_timing_logs(config.log_timings);
    let recorder = Recorder::new(config.input_device.as_deref())?;
    let mic = recorder.start_stream(config.frame_channel_capacity())?;
    eprintln!(
        "Streaming '{}' to {}. Press Enter to stop.",
        recorder.device_name(),
        classifier.base_url()
    );

    let stop = Arc::new(AtomicBool::new(false));
    spawn_enter_watcher(stop.clone());
    let feed = AudioFeed {
        frames: mic.frames(),
        sample_rate: mic.sample_rate(),
    };
    let stdout = io::stdout();
    let mut sink = TerminalSink::new(stdout.lock(), config.json);
    let stats = run_stream(classifier, feed, &config.stream_settings(), &stop, &mut sink)?;
    let dropped_frames = mic.dropped_frames();
    drop(mic);

    eprintln!("{}", format_stream_stats(&stats));
    if dropped_frames > 0 {
        eprintln!("capture dropped {dropped_frames} frames");
    }
    Ok(())
}

#[cfg(not(all(feature = "mic", feature = "http")))]
fn stream_microphone(_config: &AppConfig) -> Result<()> {
    anyhow::bail!("live streaming requires building with the 'mic' and 'http' features")
}
