/// Accumulates mono samples and hands back a chunk once roughly `chunk_ms`
/// of audio is buffered.
///
/// A chunk contains everything buffered so far, so chunk length varies with
/// the capture callback size (always at least the target).
#[derive(Debug, Clone)]
pub struct ChunkAccumulator {
    target_samples: usize,
    pending: Vec<f32>,
}

impl ChunkAccumulator {
    pub fn new(sample_rate: u32, chunk_ms: u64) -> Self {
        let target_samples = ((sample_rate as u64 * chunk_ms) / 1000).max(1) as usize;
        Self {
            target_samples,
            pending: Vec::with_capacity(target_samples),
        }
    }

    pub fn target_samples(&self) -> usize {
        self.target_samples
    }

    pub fn pending_samples(&self) -> usize {
        self.pending.len()
    }

    /// Buffer `samples`; returns a chunk when the target is reached.
    pub fn push(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        self.pending.extend_from_slice(samples);
        if self.pending.len() < self.target_samples {
            return None;
        }
        Some(std::mem::replace(
            &mut self.pending,
            Vec::with_capacity(self.target_samples),
        ))
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_matches_chunk_duration() {
        assert_eq!(ChunkAccumulator::new(48_000, 300).target_samples(), 14_400);
        assert_eq!(ChunkAccumulator::new(44_100, 300).target_samples(), 13_230);
    }

    #[test]
    fn emits_everything_buffered_once_target_reached() {
        let mut chunker = ChunkAccumulator::new(1_000, 300);
        assert!(chunker.push(&[0.1; 200]).is_none());
        let chunk = chunker.push(&[0.2; 150]).expect("chunk");
        assert_eq!(chunk.len(), 350);
        assert_eq!(chunker.pending_samples(), 0);
    }

    #[test]
    fn clear_drops_pending_audio() {
        let mut chunker = ChunkAccumulator::new(1_000, 300);
        chunker.push(&[0.1; 200]);
        chunker.clear();
        assert!(chunker.push(&[0.1; 200]).is_none());
    }

    #[test]
    fn zero_duration_still_needs_one_sample() {
        let mut chunker = ChunkAccumulator::new(16_000, 0);
        assert_eq!(chunker.target_samples(), 1);
        assert!(chunker.push(&[]).is_none());
        assert_eq!(chunker.push(&[0.5]).map(|c| c.len()), Some(1));
    }
}
