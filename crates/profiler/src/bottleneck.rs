//! Heuristic bottleneck attribution
//!
//! Fixed thresholds, checked in priority order: memory pressure, then
//! draw-call-bound frames, then GPU load. The result only feeds a
//! human-readable recommendation; nothing in the control loop reads it.

use crate::stats::FrameStats;
use lod_config::BottleneckThresholds;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BottleneckKind {
    Cpu,
    Gpu,
    Memory,
    Balanced,
}

impl fmt::Display for BottleneckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BottleneckKind::Cpu => write!(f, "CPU"),
            BottleneckKind::Gpu => write!(f, "GPU"),
            BottleneckKind::Memory => write!(f, "Memory"),
            BottleneckKind::Balanced => write!(f, "Balanced"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Grade how far a metric sits above its threshold (`value / threshold`)
    pub fn from_excess(excess: f64) -> Self {
        if excess < 1.1 {
            Severity::Low
        } else if excess < 1.25 {
            Severity::Medium
        } else if excess < 1.5 {
            Severity::High
        } else {
            Severity::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckReport {
    pub kind: BottleneckKind,
    pub severity: Severity,
    /// Latest memory in use over the memory budget
    pub memory_utilization: f64,
    pub recommendation: String,
}

impl BottleneckReport {
    pub(crate) fn no_data() -> Self {
        Self {
            kind: BottleneckKind::Balanced,
            severity: Severity::Low,
            memory_utilization: 0.0,
            recommendation: "No frame data recorded yet".to_string(),
        }
    }
}

pub(crate) fn memory_utilization(memory_bytes: u64, budget_bytes: u64) -> f64 {
    if budget_bytes == 0 {
        0.0
    } else {
        memory_bytes as f64 / budget_bytes as f64
    }
}

pub(crate) fn classify(
    stats: &FrameStats,
    thresholds: &BottleneckThresholds,
    memory_budget_bytes: u64,
    target_frame_time_ms: f64,
) -> BottleneckReport {
    let memory_utilization = memory_utilization(stats.latest_memory_bytes, memory_budget_bytes);

    if memory_utilization > thresholds.memory_pressure_ratio {
        return BottleneckReport {
            kind: BottleneckKind::Memory,
            severity: Severity::from_excess(memory_utilization / thresholds.memory_pressure_ratio),
            memory_utilization,
            recommendation: format!(
                "Memory at {:.0}% of budget; drop to a coarser LOD stage or release cached geometry",
                memory_utilization * 100.0
            ),
        };
    }

    let per_draw = stats.primitives_per_draw();
    if stats.mean_draw_calls >= thresholds.cpu_min_draw_calls
        && per_draw < thresholds.cpu_max_primitives_per_draw
    {
        return BottleneckReport {
            kind: BottleneckKind::Cpu,
            severity: Severity::from_excess(stats.mean_draw_calls / thresholds.cpu_min_draw_calls),
            memory_utilization,
            recommendation: format!(
                "Draw-call bound ({:.0} calls per frame, {:.1} primitives each); batch or instance geometry",
                stats.mean_draw_calls, per_draw
            ),
        };
    }

    if stats.mean_primitives >= thresholds.gpu_min_primitives
        && stats.mean_frame_time_ms > target_frame_time_ms
    {
        return BottleneckReport {
            kind: BottleneckKind::Gpu,
            severity: Severity::from_excess(stats.mean_frame_time_ms / target_frame_time_ms),
            memory_utilization,
            recommendation: format!(
                "GPU bound ({:.0} primitives at {:.1} ms per frame); lower the quality level or resolution scale",
                stats.mean_primitives, stats.mean_frame_time_ms
            ),
        };
    }

    BottleneckReport {
        kind: BottleneckKind::Balanced,
        severity: Severity::Low,
        memory_utilization,
        recommendation: "No dominant bottleneck".to_string(),
    }
}
