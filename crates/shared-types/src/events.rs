//! Events emitted to UI and telemetry collaborators

use crate::{LodStage, QualityLevel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one completed stage of a progressive load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: LodStage,
    pub elapsed_ms: u64,
    pub element_count: usize,
    /// `elapsed_ms <= load_budget_ms` for the stage
    pub met_budget: bool,
}

/// Why the quality level changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QualityChangeReason {
    PerformanceBelowThreshold,
    HeadroomAvailable,
    ManualOverride,
}

impl fmt::Display for QualityChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityChangeReason::PerformanceBelowThreshold => {
                write!(f, "performance below threshold")
            }
            QualityChangeReason::HeadroomAvailable => write!(f, "headroom available"),
            QualityChangeReason::ManualOverride => write!(f, "manual override"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityChangeEvent {
    pub previous_level: QualityLevel,
    pub new_level: QualityLevel,
    pub reason: QualityChangeReason,
    /// Mean fps that triggered an automatic change
    pub mean_fps: Option<f64>,
    pub at_ms: u64,
}

impl QualityChangeEvent {
    pub fn is_automatic(&self) -> bool {
        self.reason != QualityChangeReason::ManualOverride
    }
}
