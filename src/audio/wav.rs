use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// Encode mono `f32` samples as a 16-bit PCM WAV file in memory.
///
/// Samples are clamped to `[-1, 1]`; negative values scale by 32768 and
/// positive values by 32767 so both extremes map onto the full i16 range.
pub fn encode_wav_mono(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    let mut writer =
        WavWriter::new(&mut cursor, spec).context("failed to initialize WAV writer")?;
    for sample in samples {
        writer
            .write_sample(to_pcm16(*sample))
            .context("failed to write WAV sample")?;
    }
    writer.finalize().context("failed to finalize WAV data")?;
    Ok(cursor.into_inner())
}

fn to_pcm16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32_768.0) as i16
    } else {
        (clamped * 32_767.0) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;

    #[test]
    fn writes_mono_pcm16_header() {
        let bytes = encode_wav_mono(&[0.0; 10], 22_050).expect("encode");
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(bytes.len(), 44 + 20);

        let reader = WavReader::new(Cursor::new(bytes)).expect("decode");
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22_050);
        assert_eq!(spec.bits_per_sample, 16);
    }

    #[test]
    fn clamps_and_scales_extremes() {
        let bytes = encode_wav_mono(&[-2.0, -1.0, 0.0, 1.0, 2.0], 16_000).expect("encode");
        let mut reader = WavReader::new(Cursor::new(bytes)).expect("decode");
        let samples: Vec<i16> = reader
            .samples::<i16>()
            .collect::<Result<_, _>>()
            .expect("samples");
        assert_eq!(samples, vec![-32_768, -32_768, 0, 32_767, 32_767]);
    }
}
