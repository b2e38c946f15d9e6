use super::defaults::{
    MAX_API_URL_LEN, MAX_CHUNK_MS, MAX_DEVICE_NAME_LEN, MAX_FFT_SIZE, MAX_HOLD_FRAMES,
    MAX_MIN_BUFFER_MS, MAX_REQUEST_TIMEOUT_MS, MIN_CHUNK_MS, MIN_FFT_SIZE, MIN_HOLD_FRAMES,
    MIN_REQUEST_TIMEOUT_MS,
};
use super::{AppConfig, DEFAULT_FRAME_CHANNEL_CAPACITY};
use crate::stabilizer::{GateThresholds, StabilizerConfig};
use crate::stream::{StreamSettings, DEFAULT_JOB_CAPACITY};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize the API URL and input paths.
    pub fn validate(&mut self) -> Result<()> {
        if !(MIN_CHUNK_MS..=MAX_CHUNK_MS).contains(&self.chunk_ms) {
            bail!(
                "--chunk-ms must be between {MIN_CHUNK_MS} and {MAX_CHUNK_MS}, got {}",
                self.chunk_ms
            );
        }
        if !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&self.fft_size)
            || !self.fft_size.is_power_of_two()
        {
            bail!(
                "--fft-size must be a power of two between {MIN_FFT_SIZE} and {MAX_FFT_SIZE}, got {}",
                self.fft_size
            );
        }
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            bail!(
                "--smoothing-alpha must be greater than 0.0 and at most 1.0, got {}",
                self.smoothing_alpha
            );
        }
        if !(0.0..=1.0).contains(&self.switch_margin) {
            bail!(
                "--switch-margin must be between 0.0 and 1.0, got {}",
                self.switch_margin
            );
        }
        if !(MIN_HOLD_FRAMES..=MAX_HOLD_FRAMES).contains(&self.hold_frames) {
            bail!(
                "--hold-frames must be between {MIN_HOLD_FRAMES} and {MAX_HOLD_FRAMES}, got {}",
                self.hold_frames
            );
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            bail!(
                "--min-confidence must be between 0.0 and 1.0, got {}",
                self.min_confidence
            );
        }
        if !(0.0..=1.0).contains(&self.min_energy) {
            bail!(
                "--min-energy must be between 0.0 and 1.0, got {}",
                self.min_energy
            );
        }
        if self.min_buffer_ms > MAX_MIN_BUFFER_MS {
            bail!(
                "--min-buffer-ms must be between 0 and {MAX_MIN_BUFFER_MS}, got {}",
                self.min_buffer_ms
            );
        }
        if !(MIN_REQUEST_TIMEOUT_MS..=MAX_REQUEST_TIMEOUT_MS).contains(&self.request_timeout_ms) {
            bail!(
                "--request-timeout-ms must be between {MIN_REQUEST_TIMEOUT_MS} and {MAX_REQUEST_TIMEOUT_MS}, got {}",
                self.request_timeout_ms
            );
        }

        self.api_url = normalize_api_url(&self.api_url)?;

        if let Some(device) = &self.input_device {
            if device.trim().is_empty()
                || device.len() > MAX_DEVICE_NAME_LEN
                || device.chars().any(char::is_control)
            {
                bail!(
                    "--input-device must be 1-{MAX_DEVICE_NAME_LEN} characters with no control characters"
                );
            }
        }

        if let Some(clip) = &self.clip {
            self.clip = Some(existing_file(clip, "--clip")?);
        }
        if let Some(replay) = &self.replay {
            self.replay = Some(existing_file(replay, "--replay")?);
        }

        Ok(())
    }

    /// Snapshot the stabilizer settings for the pipeline.
    pub fn stabilizer_config(&self) -> StabilizerConfig {
        StabilizerConfig {
            smoothing_alpha: self.smoothing_alpha,
            switch_margin: self.switch_margin,
            hold_frames: self.hold_frames,
            thresholds: GateThresholds {
                min_confidence: self.min_confidence,
                min_energy: self.min_energy,
                min_buffer_ms: self.min_buffer_ms,
            },
        }
    }

    /// Snapshot the runtime settings for a live stream.
    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            chunk_ms: self.chunk_ms,
            fft_size: self.fft_size,
            job_capacity: DEFAULT_JOB_CAPACITY,
            stabilizer: self.stabilizer_config(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn frame_channel_capacity(&self) -> usize {
        DEFAULT_FRAME_CHANNEL_CAPACITY
    }
}

/// Accept only plain `http(s)://host[:port][/path]` URLs; strips trailing slashes.
pub(super) fn normalize_api_url(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("--api-url cannot be empty");
    }
    if trimmed.len() > MAX_API_URL_LEN {
        bail!("--api-url exceeds {MAX_API_URL_LEN} characters");
    }
    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"));
    let Some(rest) = rest else {
        bail!("--api-url must start with http:// or https://, got '{trimmed}'");
    };
    let host = rest.split('/').next().unwrap_or("");
    if host.is_empty() {
        bail!("--api-url is missing a host: '{trimmed}'");
    }
    if trimmed
        .chars()
        .any(|ch| ch.is_whitespace() || ch.is_control())
    {
        bail!("--api-url must not contain whitespace");
    }
    if rest.contains(['?', '#']) {
        bail!("--api-url must not contain a query or fragment");
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Canonicalize `path` and make sure it names a regular file.
pub(super) fn existing_file(path: &Path, flag: &str) -> Result<PathBuf> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("{flag} '{}' does not exist", path.display()))?;
    let metadata = fs::metadata(&canonical)
        .with_context(|| format!("failed to inspect {flag} '{}'", canonical.display()))?;
    if !metadata.is_file() {
        bail!("{flag} '{}' is not a file", canonical.display());
    }
    Ok(canonical)
}
