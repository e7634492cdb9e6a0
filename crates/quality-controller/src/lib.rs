//! Quality controller for the adaptive LOD controller
//!
//! Polls profiler statistics on a fixed interval and moves the session's
//! `QualityLevel` up or down one step at a time, with a cooldown between
//! automatic changes. Manual overrides bypass the loop entirely.

use lod_shared::LodError;
use thiserror::Error;

pub mod controller;
pub mod settings;

pub use controller::QualityController;
pub use settings::{QualitySettings, SkipReason, TickDecision};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QualityError {
    #[error("min_fps ({min_fps}) must be below target_fps ({target_fps})")]
    InvalidThresholds { min_fps: u32, target_fps: u32 },

    #[error("headroom_factor must be above 1.0, got {0}")]
    InvalidHeadroom(f64),
}

pub type Result<T> = std::result::Result<T, QualityError>;

impl From<QualityError> for LodError {
    fn from(err: QualityError) -> Self {
        let field = match err {
            QualityError::InvalidThresholds { .. } => "quality.min_fps",
            QualityError::InvalidHeadroom(_) => "quality.headroom_factor",
        };
        LodError::InvalidConfig {
            message: err.to_string(),
            field: Some(field.to_string()),
        }
    }
}
