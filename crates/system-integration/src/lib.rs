//! Adaptive LOD controller
//!
//! Wires the device probe, complexity analyzer, profiler, stage scheduler
//! and quality controller into a single, explicitly constructed
//! `AdaptiveLodController` per session. Events for UI and telemetry are
//! delivered through a crossbeam channel in the order they occur.

pub mod controller;
pub mod diagnostics;
pub mod events;
pub mod quality_loop;

pub use controller::{AdaptiveLodController, PreparedDataset};
pub use diagnostics::Diagnostics;
pub use events::{ControllerEvent, EventBus};
pub use quality_loop::QualityLoop;

pub use lod_analysis::{ContextSnapshot, DeviceClassHint, GraphicsApi, RenderContextInfo};
pub use lod_config::LodConfig;
pub use lod_scheduler::{
    ElementSubset, GeometryBuilder, LoadOutcome, ProgressiveLoad, SchedulerState, StagePlan,
};

use lod_config::ConfigError;
use lod_profiler::ProfilerError;
use lod_quality::QualityError;
use lod_shared::LodError;
use thiserror::Error;

/// Controller setup and reconfiguration errors
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Profiler error: {0}")]
    Profiler(#[from] ProfilerError),

    #[error("Quality controller error: {0}")]
    Quality(#[from] QualityError),
}

pub type Result<T> = std::result::Result<T, IntegrationError>;

impl From<IntegrationError> for LodError {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::Configuration(err) => err.into(),
            IntegrationError::Quality(err) => err.into(),
            IntegrationError::Profiler(err) => LodError::InvalidConfig {
                message: err.to_string(),
                field: Some("profiler".to_string()),
            },
        }
    }
}
