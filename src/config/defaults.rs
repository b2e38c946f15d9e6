pub const DEFAULT_API_URL: &str = "http://localhost:8000";

pub const MIN_CHUNK_MS: u64 = 50;
pub const MAX_CHUNK_MS: u64 = 5_000;

pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32_768;

pub const MIN_HOLD_FRAMES: u32 = 1;
pub const MAX_HOLD_FRAMES: u32 = 30;

pub const MAX_MIN_BUFFER_MS: u64 = 60_000;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 60_000;

/// Capture frames buffered between the audio callback and the runtime loop.
pub const DEFAULT_FRAME_CHANNEL_CAPACITY: usize = 64;

pub(super) const MAX_DEVICE_NAME_LEN: usize = 256;
pub(super) const MAX_API_URL_LEN: usize = 2_048;
