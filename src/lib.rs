//! Live genre prediction with visually stable labels.
//!
//! Microphone audio is chunked and sent to a remote classifier; the
//! [`stabilizer`] turns its jittery per-chunk distributions into a smoothed,
//! hysteresis-held label that is hidden during warm-up, backend buffering,
//! silence, and low confidence.

pub mod app;
pub mod audio;
pub mod classifier;
pub mod config;
pub mod error;
pub mod render;
pub mod replay;
pub mod stabilizer;
pub mod stream;
mod telemetry;

pub use app::logging::{crash_log_path, init_logging, log_debug, log_file_path, log_panic};
pub use error::StabilizerError;
