//! Byte magnitude spectrum in the style of a browser `AnalyserNode`.
//!
//! Keeps the most recent `fft_size` samples, applies a Blackman window,
//! smooths magnitudes over time, and maps decibels onto `0..=255`. The band
//! energy estimator expects exactly this kind of input.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;

pub const DEFAULT_FFT_SIZE: usize = 2048;
const DEFAULT_MIN_DB: f32 = -100.0;
const DEFAULT_MAX_DB: f32 = -30.0;
const DEFAULT_TIME_SMOOTHING: f32 = 0.8;

pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    window: Vec<f32>,
    history: VecDeque<f32>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    min_db: f32,
    max_db: f32,
    time_smoothing: f32,
}

impl SpectrumAnalyser {
    /// `fft_size` is rounded up to a power of two (minimum 32).
    pub fn new(fft_size: usize) -> Self {
        let fft_size = fft_size.max(32).next_power_of_two();
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        Self {
            fft,
            fft_size,
            window: blackman_window(fft_size),
            history: VecDeque::from(vec![0.0; fft_size]),
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
            min_db: DEFAULT_MIN_DB,
            max_db: DEFAULT_MAX_DB,
            time_smoothing: DEFAULT_TIME_SMOOTHING,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of bins produced by `byte_spectrum`.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Append mono samples to the analysis window.
    pub fn push_samples(&mut self, samples: &[f32]) {
        let skip = samples.len().saturating_sub(self.fft_size);
        for sample in &samples[skip..] {
            self.history.pop_front();
            self.history.push_back(*sample);
        }
    }

    /// Analyse the current window and return `bin_count` byte magnitudes.
    pub fn byte_spectrum(&mut self) -> Vec<u8> {
        for ((slot, sample), weight) in self
            .scratch
            .iter_mut()
            .zip(self.history.iter())
            .zip(self.window.iter())
        {
            *slot = Complex::new(sample * weight, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let scale = 1.0 / self.fft_size as f32;
        let range = self.max_db - self.min_db;
        let mut out = Vec::with_capacity(self.bin_count());
        for (bin, previous) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.scratch[bin].norm() * scale;
            *previous = self.time_smoothing * *previous + (1.0 - self.time_smoothing) * magnitude;
            let db = if *previous > 0.0 {
                20.0 * previous.log10()
            } else {
                f32::NEG_INFINITY
            };
            let scaled = 255.0 * (db - self.min_db) / range;
            out.push(scaled.clamp(0.0, 255.0) as u8);
        }
        out
    }

    /// Forget previous samples and smoothing history.
    pub fn reset(&mut self) {
        self.history.iter_mut().for_each(|sample| *sample = 0.0);
        self.smoothed.iter_mut().for_each(|value| *value = 0.0);
    }
}

impl Default for SpectrumAnalyser {
    fn default() -> Self {
        Self::new(DEFAULT_FFT_SIZE)
    }
}

fn blackman_window(size: usize) -> Vec<f32> {
    const ALPHA: f32 = 0.16;
    let a0 = 0.5 * (1.0 - ALPHA);
    let a1 = 0.5;
    let a2 = 0.5 * ALPHA;
    (0..size)
        .map(|i| {
            let x = i as f32 / size as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, rate: f32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / rate).sin())
            .collect()
    }

    #[test]
    fn rounds_fft_size_to_power_of_two() {
        assert_eq!(SpectrumAnalyser::new(1000).fft_size(), 1024);
        assert_eq!(SpectrumAnalyser::new(4).fft_size(), 32);
        assert_eq!(SpectrumAnalyser::new(2048).bin_count(), 1024);
    }

    #[test]
    fn silence_maps_to_zero_bins() {
        let mut analyser = SpectrumAnalyser::new(256);
        analyser.push_samples(&[0.0; 256]);
        assert!(analyser.byte_spectrum().iter().all(|bin| *bin == 0));
    }

    #[test]
    fn tone_peaks_near_its_bin() {
        let rate = 8_000.0;
        let size = 512;
        let mut analyser = SpectrumAnalyser::new(size);
        // Bin width = 8000 / 512 = 15.625 Hz; 1000 Hz sits at bin 64.
        let tone = sine(1_000.0, rate, size, 0.01);
        let mut spectrum = Vec::new();
        for _ in 0..20 {
            analyser.push_samples(&tone);
            spectrum = analyser.byte_spectrum();
        }
        let (peak_bin, peak) = spectrum
            .iter()
            .enumerate()
            .max_by_key(|(_, value)| **value)
            .map(|(idx, value)| (idx, *value))
            .unwrap_or_default();
        assert_eq!(peak_bin, 64);
        assert!(peak > 120 && peak < 255, "peak magnitude {peak}");
    }

    #[test]
    fn reset_clears_history() {
        let mut analyser = SpectrumAnalyser::new(256);
        analyser.push_samples(&sine(440.0, 8_000.0, 256, 0.9));
        analyser.byte_spectrum();
        analyser.reset();
        assert!(analyser.byte_spectrum().iter().all(|bin| *bin == 0));
    }

    #[test]
    fn keeps_only_latest_window() {
        let mut analyser = SpectrumAnalyser::new(32);
        analyser.push_samples(&[1.0; 100]);
        assert_eq!(analyser.history.len(), 32);
        assert!(analyser.history.iter().all(|s| *s == 1.0));
    }
}
