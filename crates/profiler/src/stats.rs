//! Rolling statistics over the held samples

use crate::ring_buffer::FrameRing;
use serde::{Deserialize, Serialize};

/// Reported fps when frames take (close to) no time at all
pub const MAX_REPORTED_FPS: f64 = 1_000.0;

/// Statistics over the samples currently held by the profiler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameStats {
    pub sample_count: usize,
    /// `1000 / mean frame time`, capped at `MAX_REPORTED_FPS`
    pub mean_fps: f64,
    pub mean_frame_time_ms: f64,
    pub min_frame_time_ms: f64,
    pub max_frame_time_ms: f64,
    /// Nearest-rank 95th percentile
    pub p95_frame_time_ms: f64,
    /// Frames slower than target frame time times the dropped-frame factor
    pub dropped_frame_count: usize,
    pub mean_draw_calls: f64,
    pub mean_primitives: f64,
    pub latest_memory_bytes: u64,
}

impl FrameStats {
    /// `None` for an empty ring
    pub(crate) fn compute(ring: &FrameRing, dropped_threshold_ms: f64) -> Option<Self> {
        let latest = ring.latest()?;
        let n = ring.len();

        let mut frame_times: Vec<f64> = ring.iter().map(|s| s.frame_time_ms).collect();
        let total_time: f64 = frame_times.iter().sum();
        let total_draws: f64 = ring.iter().map(|s| s.draw_calls as f64).sum();
        let total_primitives: f64 = ring.iter().map(|s| s.primitives as f64).sum();
        let dropped_frame_count = frame_times
            .iter()
            .filter(|&&t| t > dropped_threshold_ms)
            .count();

        frame_times.sort_by(|a, b| a.total_cmp(b));
        let p95_rank = (n * 95).div_ceil(100);
        let p95_frame_time_ms = frame_times[p95_rank.clamp(1, n) - 1];

        let mean_frame_time_ms = total_time / n as f64;
        let mean_fps = if mean_frame_time_ms > 0.0 {
            (1_000.0 / mean_frame_time_ms).min(MAX_REPORTED_FPS)
        } else {
            MAX_REPORTED_FPS
        };

        Some(Self {
            sample_count: n,
            mean_fps,
            mean_frame_time_ms,
            min_frame_time_ms: frame_times[0],
            max_frame_time_ms: frame_times[n - 1],
            p95_frame_time_ms,
            dropped_frame_count,
            mean_draw_calls: total_draws / n as f64,
            mean_primitives: total_primitives / n as f64,
            latest_memory_bytes: latest.memory_bytes,
        })
    }

    /// Mean primitives submitted per draw call
    pub fn primitives_per_draw(&self) -> f64 {
        if self.mean_draw_calls > 0.0 {
            self.mean_primitives / self.mean_draw_calls
        } else {
            self.mean_primitives
        }
    }
}
