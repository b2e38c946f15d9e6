//! Audio side of the stream: capture, spectrum analysis, band energy, and
//! chunk encoding.
//!
//! Microphone frames are analysed for per-tick band energy and accumulated
//! into ~300 ms chunks, which are encoded as 16-bit PCM WAV for the remote
//! classifier. Everything except capture is pure and runs headless.

/// Default chunk length submitted to the classifier.
pub const DEFAULT_CHUNK_MS: u64 = 300;

mod analyser;
mod chunker;
#[cfg(any(feature = "mic", test))]
#[cfg_attr(not(feature = "mic"), allow(dead_code))]
mod dispatch;
mod energy;
#[cfg(feature = "mic")]
mod recorder;
mod wav;

pub use analyser::{SpectrumAnalyser, DEFAULT_FFT_SIZE};
pub use chunker::ChunkAccumulator;
pub use energy::{band_energy, EnergyReading, MAX_BYTE_MAGNITUDE};
#[cfg(feature = "mic")]
pub use recorder::{MicStream, Recorder, CAPTURE_FRAME_MS};
pub use wav::encode_wav_mono;
