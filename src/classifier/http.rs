use super::{ChunkPayload, Classifier, ClipPrediction};
use crate::log_debug;
use anyhow::{bail, Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::{Duration, Instant};

const CHUNK_FILE_NAME: &str = "chunk.wav";

/// Classifier backed by the HTTP inference service.
pub struct HttpClassifier {
    client: Client,
    base_url: String,
    log_timings: bool,
}

impl HttpClassifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            log_timings: false,
        })
    }

    /// Log the round-trip time of every request.
    #[must_use]
    pub fn with_timing_logs(mut self, enabled: bool) -> Self {
        self.log_timings = enabled;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn post_file<T: DeserializeOwned>(
        &self,
        path: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<T> {
        let url = self.endpoint(path);
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))
            .context("failed to build multipart audio part")?;
        let form = Form::new().part("file", part);

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "failed to read error response".to_string());
            bail!("{url} returned {status}: {}", body.trim());
        }
        let decoded = response
            .json::<T>()
            .with_context(|| format!("failed to decode response from {url}"))?;
        if self.log_timings {
            log_debug(&format!(
                "timing|POST {url}|elapsed_ms={}",
                started.elapsed().as_millis()
            ));
        }
        Ok(decoded)
    }
}

impl Classifier for HttpClassifier {
    fn classify_clip(&self, file_name: &str, bytes: Vec<u8>) -> Result<ClipPrediction> {
        let prediction: ClipPrediction = self.post_file("predict_clip", file_name, bytes)?;
        prediction.validate()?;
        Ok(prediction)
    }

    fn classify_chunk(&self, wav: Vec<u8>) -> Result<ChunkPayload> {
        self.post_file("predict_chunk", CHUNK_FILE_NAME, wav)
    }

    fn reset_stream(&self) -> Result<()> {
        let url = self.endpoint("reset_stream");
        self.client
            .post(&url)
            .send()
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("{url} rejected the reset"))?;
        Ok(())
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        _ => "application/octet-stream",
    }
}
