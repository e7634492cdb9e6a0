//! Common error types used across all LOD controller crates

use crate::LodStage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base error type for controller operations.
///
/// Affordability stops, cancellation and skipped quality ticks are normal
/// outcomes and never appear here.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum LodError {
    #[error("Geometry build failed at {stage} stage: {message}")]
    GeometryBuild { stage: LodStage, message: String },

    #[error("Invalid dataset: {message}")]
    InvalidDataset { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
        field: Option<String>,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LodError {
    pub fn geometry_build(stage: LodStage, message: impl Into<String>) -> Self {
        LodError::GeometryBuild {
            stage,
            message: message.into(),
        }
    }

    /// Whether a UI layer should offer a retry for this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, LodError::GeometryBuild { .. })
    }
}

/// Result type alias for controller operations
pub type LodResult<T> = Result<T, LodError>;

/// Error payload for diagnostics overlays and telemetry
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: LodError,
    pub timestamp: u64,
    pub context: Option<ErrorContext>,
}

/// Where the error came from
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorContext {
    pub component: String,
    pub operation: String,
    pub metadata: serde_json::Value,
}

impl ErrorResponse {
    pub fn new(error: LodError) -> Self {
        Self {
            success: false,
            error,
            timestamp: chrono::Utc::now().timestamp_millis() as u64,
            context: None,
        }
    }

    pub fn with_context(mut self, component: &str, operation: &str) -> Self {
        self.context = Some(ErrorContext {
            component: component.to_string(),
            operation: operation.to_string(),
            metadata: serde_json::Value::Null,
        });
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        if let Some(ref mut ctx) = self.context {
            ctx.metadata = metadata;
        }
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"error":{"type":"Internal","details":{"message":"Failed to serialize error"}}}"#.to_string()
        })
    }
}
