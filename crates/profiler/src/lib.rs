//! Performance profiler for the adaptive LOD controller
//!
//! One `PerformanceSample` per rendered frame goes into a fixed-capacity ring
//! buffer. Rolling statistics and the bottleneck heuristic are computed on
//! demand over whatever the ring currently holds.

use lod_config::{BottleneckThresholds, ProfilerConfig};
use lod_shared::PerformanceSample;
use thiserror::Error;

pub mod bottleneck;
pub mod ring_buffer;
pub mod stats;

pub use bottleneck::{BottleneckKind, BottleneckReport, Severity};
pub use ring_buffer::FrameRing;
pub use stats::{FrameStats, MAX_REPORTED_FPS};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfilerError {
    #[error("Ring buffer capacity must be non-zero")]
    ZeroCapacity,

    #[error("Target fps must be non-zero")]
    ZeroTargetFps,

    #[error("Rejected frame sample with duration {0} ms")]
    InvalidSample(f64),
}

pub type Result<T> = std::result::Result<T, ProfilerError>;

/// Frame-time ring buffer plus the statistics computed over it
#[derive(Debug, Clone)]
pub struct PerformanceProfiler {
    ring: FrameRing,
    target_frame_time_ms: f64,
    dropped_frame_factor: f64,
    thresholds: BottleneckThresholds,
    memory_budget_bytes: u64,
    total_frames: u64,
    rejected_samples: u64,
}

impl PerformanceProfiler {
    pub fn new(config: &ProfilerConfig, target_fps: u32, memory_budget_bytes: u64) -> Result<Self> {
        if config.capacity == 0 {
            return Err(ProfilerError::ZeroCapacity);
        }
        if target_fps == 0 {
            return Err(ProfilerError::ZeroTargetFps);
        }

        Ok(Self {
            ring: FrameRing::with_capacity(config.capacity),
            target_frame_time_ms: 1_000.0 / target_fps as f64,
            dropped_frame_factor: config.dropped_frame_factor,
            thresholds: config.bottleneck.clone(),
            memory_budget_bytes,
            total_frames: 0,
            rejected_samples: 0,
        })
    }

    /// Append one frame's measurements, evicting the oldest sample when full.
    ///
    /// Negative or non-finite durations are rejected and counted; they never
    /// reach the ring.
    pub fn record_frame(
        &mut self,
        duration_ms: f64,
        draw_calls: u32,
        primitives: u64,
        memory_bytes: u64,
    ) -> Result<()> {
        self.record_sample(PerformanceSample::new(
            duration_ms,
            draw_calls,
            primitives,
            memory_bytes,
        ))
    }

    pub fn record_sample(&mut self, sample: PerformanceSample) -> Result<()> {
        if !sample.frame_time_ms.is_finite() || sample.frame_time_ms < 0.0 {
            self.rejected_samples += 1;
            log::warn!(
                "Dropping invalid frame sample ({} ms), {} rejected so far",
                sample.frame_time_ms,
                self.rejected_samples
            );
            return Err(ProfilerError::InvalidSample(sample.frame_time_ms));
        }

        self.ring.push(sample);
        self.total_frames += 1;
        Ok(())
    }

    /// Statistics over held samples; `None` until the first frame is recorded
    pub fn rolling_stats(&self) -> Option<FrameStats> {
        FrameStats::compute(
            &self.ring,
            self.target_frame_time_ms * self.dropped_frame_factor,
        )
    }

    /// Mean fps over held samples, if any
    pub fn mean_fps(&self) -> Option<f64> {
        self.rolling_stats().map(|s| s.mean_fps)
    }

    pub fn classify_bottleneck(&self) -> BottleneckReport {
        match self.rolling_stats() {
            Some(stats) => bottleneck::classify(
                &stats,
                &self.thresholds,
                self.memory_budget_bytes,
                self.target_frame_time_ms,
            ),
            None => BottleneckReport::no_data(),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.ring.len()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Frames accepted since construction or the last `reset`
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn rejected_samples(&self) -> u64 {
        self.rejected_samples
    }

    pub fn target_frame_time_ms(&self) -> f64 {
        self.target_frame_time_ms
    }

    pub fn memory_budget_bytes(&self) -> u64 {
        self.memory_budget_bytes
    }

    pub fn set_memory_budget(&mut self, memory_budget_bytes: u64) {
        self.memory_budget_bytes = memory_budget_bytes;
    }

    /// Forget every sample and counter
    pub fn reset(&mut self) {
        self.ring.clear();
        self.total_frames = 0;
        self.rejected_samples = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn profiler() -> PerformanceProfiler {
        PerformanceProfiler::new(&ProfilerConfig::default(), 60, 128 * MIB).unwrap()
    }

    #[test]
    fn test_rejects_bad_construction() {
        let config = ProfilerConfig {
            capacity: 0,
            ..ProfilerConfig::default()
        };
        assert_eq!(
            PerformanceProfiler::new(&config, 60, MIB).unwrap_err(),
            ProfilerError::ZeroCapacity
        );
        assert_eq!(
            PerformanceProfiler::new(&ProfilerConfig::default(), 0, MIB).unwrap_err(),
            ProfilerError::ZeroTargetFps
        );
    }

    #[test]
    fn test_no_data_sentinel() {
        let profiler = profiler();
        assert!(profiler.rolling_stats().is_none());
        assert!(profiler.mean_fps().is_none());

        let report = profiler.classify_bottleneck();
        assert_eq!(report.kind, BottleneckKind::Balanced);
        assert_eq!(report.severity, Severity::Low);
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        let mut profiler = profiler();
        // one slow frame first, then 120 fast ones push it out
        profiler.record_frame(100.0, 10, 1_000, 0).unwrap();
        for _ in 0..120 {
            profiler.record_frame(10.0, 10, 1_000, 0).unwrap();
        }

        assert_eq!(profiler.sample_count(), 120);
        assert_eq!(profiler.total_frames(), 121);

        let stats = profiler.rolling_stats().unwrap();
        assert_eq!(stats.sample_count, 120);
        assert_eq!(stats.max_frame_time_ms, 10.0);
        assert_eq!(stats.mean_fps, 100.0);
    }

    #[test]
    fn test_invalid_samples_are_counted_not_stored() {
        let mut profiler = profiler();
        assert!(profiler.record_frame(f64::NAN, 1, 1, 0).is_err());
        assert!(profiler.record_frame(-1.0, 1, 1, 0).is_err());
        assert!(profiler.record_frame(f64::INFINITY, 1, 1, 0).is_err());
        assert_eq!(profiler.sample_count(), 0);
        assert_eq!(profiler.rejected_samples(), 3);

        profiler.reset();
        assert_eq!(profiler.rejected_samples(), 0);
    }

    #[test]
    fn test_dropped_frames_use_target() {
        let mut profiler = profiler();
        // threshold is 1.5 * 16.67 = 25 ms
        for t in [16.0, 24.0, 26.0, 50.0] {
            profiler.record_frame(t, 10, 1_000, 0).unwrap();
        }
        assert_eq!(profiler.rolling_stats().unwrap().dropped_frame_count, 2);
    }

    #[test]
    fn test_memory_pressure_report() {
        let mut profiler = profiler();
        for _ in 0..10 {
            profiler.record_frame(16.0, 10, 1_000, 120 * MIB).unwrap();
        }
        let report = profiler.classify_bottleneck();
        assert_eq!(report.kind, BottleneckKind::Memory);
        assert!(report.memory_utilization > 0.9);

        profiler.set_memory_budget(1024 * MIB);
        assert_eq!(profiler.classify_bottleneck().kind, BottleneckKind::Balanced);
    }
}
