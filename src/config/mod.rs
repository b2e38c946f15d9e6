//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use crate::audio::{DEFAULT_CHUNK_MS, DEFAULT_FFT_SIZE};
use crate::stabilizer::{
    DEFAULT_HOLD_FRAMES, DEFAULT_MIN_BUFFER_MS, DEFAULT_MIN_CONFIDENCE, DEFAULT_MIN_ENERGY,
    DEFAULT_SMOOTHING_ALPHA, DEFAULT_SWITCH_MARGIN,
};
use clap::Parser;
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_API_URL, DEFAULT_FRAME_CHANNEL_CAPACITY, DEFAULT_REQUEST_TIMEOUT_MS, MAX_CHUNK_MS,
    MAX_FFT_SIZE, MAX_HOLD_FRAMES, MAX_MIN_BUFFER_MS, MAX_REQUEST_TIMEOUT_MS, MIN_CHUNK_MS,
    MIN_FFT_SIZE, MIN_HOLD_FRAMES, MIN_REQUEST_TIMEOUT_MS,
};

/// CLI options for genrestream. `validate` must pass before any value is used.
#[derive(Debug, Parser, Clone)]
#[command(
    about = "Live music genre prediction with stabilized labels",
    author,
    version
)]
pub struct AppConfig {
    /// Base URL of the classifier service
    #[arg(long = "api-url", env = "GENRESTREAM_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Classify one audio file and exit
    #[arg(long, value_name = "FILE")]
    pub clip: Option<PathBuf>,

    /// Replay recorded classifier events (JSON lines) through the stabilizer and exit
    #[arg(long, value_name = "FILE", conflicts_with = "clip")]
    pub replay: Option<PathBuf>,

    /// Preferred audio input device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Audio submitted per classifier request (milliseconds)
    #[arg(long = "chunk-ms", default_value_t = DEFAULT_CHUNK_MS)]
    pub chunk_ms: u64,

    /// FFT window for the energy analyser (power of two)
    #[arg(long = "fft-size", default_value_t = DEFAULT_FFT_SIZE)]
    pub fft_size: usize,

    /// Weight of each new prediction in the moving average (0 < alpha <= 1)
    #[arg(long = "smoothing-alpha", default_value_t = DEFAULT_SMOOTHING_ALPHA)]
    pub smoothing_alpha: f64,

    /// Lead a challenger needs over the shown label to count toward a switch
    #[arg(long = "switch-margin", default_value_t = DEFAULT_SWITCH_MARGIN)]
    pub switch_margin: f64,

    /// Consecutive qualifying frames before the shown label switches
    #[arg(long = "hold-frames", default_value_t = DEFAULT_HOLD_FRAMES)]
    pub hold_frames: u32,

    /// Hide the label below this smoothed probability
    #[arg(long = "min-confidence", default_value_t = DEFAULT_MIN_CONFIDENCE)]
    pub min_confidence: f64,

    /// Treat mean band energy below this as silence
    #[arg(long = "min-energy", default_value_t = DEFAULT_MIN_ENERGY)]
    pub min_energy: f32,

    /// Warm-up window after start during which no label is shown (milliseconds)
    #[arg(long = "min-buffer-ms", default_value_t = DEFAULT_MIN_BUFFER_MS)]
    pub min_buffer_ms: u64,

    /// Classifier request timeout (milliseconds)
    #[arg(long = "request-timeout-ms", default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    pub request_timeout_ms: u64,

    /// Print one JSON object per frame instead of text
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "GENRESTREAM_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "GENRESTREAM_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Enable verbose timing logs
    #[arg(long)]
    pub log_timings: bool,
}
