//! Live quality state and per-tick decisions

use lod_shared::{QualityChangeEvent, QualityLevel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The session's single mutable quality state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitySettings {
    pub level: QualityLevel,
    pub auto_adjust_enabled: bool,
    /// Clock time of the last automatic change. Manual overrides never touch it.
    pub last_automatic_change_ms: Option<u64>,
}

impl QualitySettings {
    pub fn new(level: QualityLevel, auto_adjust_enabled: bool) -> Self {
        Self {
            level,
            auto_adjust_enabled,
            last_automatic_change_ms: None,
        }
    }

    /// Milliseconds of cooldown still left at `now_ms`
    pub fn cooldown_remaining(&self, now_ms: u64, cooldown_ms: u64) -> u64 {
        match self.last_automatic_change_ms {
            Some(last) => cooldown_ms.saturating_sub(now_ms.saturating_sub(last)),
            None => 0,
        }
    }
}

/// Why a tick did nothing before looking at fps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum SkipReason {
    AutoAdjustDisabled,
    InsufficientData { held: usize, required: usize },
    Cooldown { remaining_ms: u64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AutoAdjustDisabled => write!(f, "auto-adjust disabled"),
            SkipReason::InsufficientData { held, required } => {
                write!(f, "insufficient data ({held}/{required} samples)")
            }
            SkipReason::Cooldown { remaining_ms } => {
                write!(f, "cooling down ({remaining_ms} ms left)")
            }
        }
    }
}

/// What one tick of the adaptive loop did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum TickDecision {
    Skipped(SkipReason),
    /// fps was inside the band, or the level was already at a bound
    Unchanged { mean_fps: f64 },
    Changed(QualityChangeEvent),
}

impl TickDecision {
    pub fn change(&self) -> Option<&QualityChangeEvent> {
        match self {
            TickDecision::Changed(event) => Some(event),
            _ => None,
        }
    }
}
