//! Load outcomes and the observer interface

use lod_shared::{LodError, LodStage, StageResult};
use serde::{Deserialize, Serialize};

/// How a progressive load ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum LoadOutcome {
    /// Every planned stage was built
    Completed,
    /// The next stage would not fit in device memory. Not an error.
    AffordabilityCeiling {
        next_stage: LodStage,
        estimated_bytes: u64,
    },
    Cancelled,
    Failed { stage: LodStage, error: LodError },
}

impl LoadOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, LoadOutcome::Failed { .. })
    }

    /// Text for a status line
    pub fn status_message(&self) -> &'static str {
        match self {
            LoadOutcome::Completed => "loaded at requested detail",
            LoadOutcome::AffordabilityCeiling { .. } => {
                "loaded at reduced detail (device memory ceiling)"
            }
            LoadOutcome::Cancelled => "loading cancelled",
            LoadOutcome::Failed { .. } => "could not load at requested detail",
        }
    }
}

/// Receives scheduler events in the order they happen, on the task polling
/// the load.
pub trait StageObserver: Send + Sync {
    fn on_stage_complete(&self, result: &StageResult);

    fn on_load_finished(&self, _outcome: &LoadOutcome) {}
}
