//! LOD stage scheduler
//!
//! Walks a dataset through `Preview`, `Interactive` and `Full` geometry, one
//! stage at a time. Each stage filters the dataset down to the stage's element
//! cap, awaits the external geometry builder and reports a `StageResult`.
//! Walks stop early at the device memory ceiling. A cancelled or dropped walk
//! reports `Cancelled` right away, or once the build in flight returns.

use lod_shared::LodError;
use thiserror::Error;

pub mod affordability;
pub mod filter;
pub mod observer;
pub mod plan;
pub mod scheduler;
pub mod state;

pub use affordability::{can_afford_stage, estimated_stage_bytes};
pub use filter::ElementSubset;
pub use observer::{LoadOutcome, StageObserver};
pub use plan::StagePlan;
pub use scheduler::{CancelHandle, GeometryBuilder, ProgressiveLoad, StageOutput, StageScheduler};
pub use state::{SchedulerState, StateHandle};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("Invalid scheduler transition from {from} to {to}")]
    InvalidTransition {
        from: SchedulerState,
        to: SchedulerState,
    },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

impl From<SchedulerError> for LodError {
    fn from(err: SchedulerError) -> Self {
        LodError::Internal {
            message: err.to_string(),
        }
    }
}
