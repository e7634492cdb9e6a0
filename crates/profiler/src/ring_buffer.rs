//! Fixed-capacity FIFO of frame samples

use lod_shared::PerformanceSample;
use std::collections::VecDeque;

/// Ring buffer holding the most recent `capacity` samples.
///
/// Pushing onto a full ring evicts the oldest sample first, so `len()` never
/// exceeds `capacity()`.
#[derive(Debug, Clone)]
pub struct FrameRing {
    samples: VecDeque<PerformanceSample>,
    capacity: usize,
}

impl FrameRing {
    /// `capacity` must be non-zero; the profiler checks this before building one
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, returning the evicted one if the ring was full
    pub fn push(&mut self, sample: PerformanceSample) -> Option<PerformanceSample> {
        let evicted = if self.samples.len() >= self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &PerformanceSample> + '_ {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&PerformanceSample> {
        self.samples.back()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(frame_time_ms: f64) -> PerformanceSample {
        PerformanceSample::new(frame_time_ms, 10, 1_000, 0)
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut ring = FrameRing::with_capacity(3);
        assert!(ring.push(sample(1.0)).is_none());
        assert!(ring.push(sample(2.0)).is_none());
        assert!(ring.push(sample(3.0)).is_none());
        assert!(ring.is_full());

        let evicted = ring.push(sample(4.0)).unwrap();
        assert_eq!(evicted.frame_time_ms, 1.0);
        assert_eq!(ring.len(), 3);

        let held: Vec<f64> = ring.iter().map(|s| s.frame_time_ms).collect();
        assert_eq!(held, vec![2.0, 3.0, 4.0]);
        assert_eq!(ring.latest().unwrap().frame_time_ms, 4.0);
    }

    #[test]
    fn test_clear() {
        let mut ring = FrameRing::with_capacity(2);
        ring.push(sample(1.0));
        ring.clear();
        assert!(ring.is_empty());
        assert!(ring.latest().is_none());
        assert_eq!(ring.capacity(), 2);
    }
}
