//! Three-band energy estimate from an 8-bit magnitude spectrum.

use serde::{Deserialize, Serialize};

/// Largest value an 8-bit magnitude bin can hold.
pub const MAX_BYTE_MAGNITUDE: f32 = 255.0;

/// Fraction of the spectrum where the mid band starts.
const LOW_BAND_END: f64 = 0.12;
/// Fraction of the spectrum where the high band starts.
const MID_BAND_END: f64 = 0.45;

/// Band energies, nominally in `[0, 1]`. Values are not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyReading {
    #[serde(alias = "bass")]
    pub low: f32,
    #[serde(alias = "mids")]
    pub mid: f32,
    #[serde(alias = "highs")]
    pub high: f32,
}

impl EnergyReading {
    pub fn new(low: f32, mid: f32, high: f32) -> Self {
        Self { low, mid, high }
    }

    /// Arithmetic mean of the three bands; this is what the silence gate reads.
    pub fn mean(&self) -> f32 {
        (self.low + self.mid + self.high) / 3.0
    }
}

/// Split `spectrum` into low/mid/high bands and return each band's mean
/// magnitude scaled into `[0, 1]`.
pub fn band_energy(spectrum: &[u8]) -> EnergyReading {
    let n = spectrum.len();
    let low_end = (n as f64 * LOW_BAND_END).floor() as usize;
    let mid_end = (n as f64 * MID_BAND_END).floor() as usize;
    EnergyReading {
        low: band_mean(spectrum, 0, low_end) / MAX_BYTE_MAGNITUDE,
        mid: band_mean(spectrum, low_end, mid_end) / MAX_BYTE_MAGNITUDE,
        high: band_mean(spectrum, mid_end, n) / MAX_BYTE_MAGNITUDE,
    }
}

/// Mean over `[start, end)`, widened to at least one bin. Bins past the end of
/// the slice count as zero.
fn band_mean(spectrum: &[u8], start: usize, end: usize) -> f32 {
    let end = end.max(start + 1);
    let sum: u32 = (start..end)
        .map(|idx| spectrum.get(idx).copied().map(u32::from).unwrap_or(0))
        .sum();
    sum as f32 / (end - start) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_spectrum_reads_one_everywhere() {
        let reading = band_energy(&[255u8; 1024]);
        assert_eq!(reading, EnergyReading::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn bands_follow_fractional_boundaries() {
        // 100 bins: low = [0, 12), mid = [12, 45), high = [45, 100).
        let mut spectrum = vec![0u8; 100];
        for bin in spectrum.iter_mut().take(12) {
            *bin = 255;
        }
        for bin in spectrum.iter_mut().skip(45) {
            *bin = 51;
        }
        let reading = band_energy(&spectrum);
        assert!((reading.low - 1.0).abs() < 1e-6);
        assert!(reading.mid.abs() < 1e-6);
        assert!((reading.high - 0.2).abs() < 1e-6);
    }

    #[test]
    fn tiny_spectrum_widens_empty_bands() {
        // n = 2: low = [0, 0) -> [0, 1), mid = [0, 0) -> [0, 1), high = [0, 2).
        let reading = band_energy(&[255, 0]);
        assert!((reading.low - 1.0).abs() < 1e-6);
        assert!((reading.mid - 1.0).abs() < 1e-6);
        assert!((reading.high - 0.5).abs() < 1e-6);
    }

    #[test]
    fn empty_spectrum_is_silent() {
        assert_eq!(band_energy(&[]), EnergyReading::default());
    }

    #[test]
    fn mean_averages_bands() {
        let reading = EnergyReading::new(0.3, 0.6, 0.9);
        assert!((reading.mean() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn deserializes_visualizer_field_names() {
        let reading: EnergyReading =
            serde_json::from_str(r#"{"bass":0.1,"mids":0.2,"highs":0.3}"#).expect("parse");
        assert_eq!(reading, EnergyReading::new(0.1, 0.2, 0.3));
    }
}
