//! Serializable snapshot for a diagnostics overlay

use chrono::{DateTime, Utc};
use lod_profiler::{BottleneckReport, FrameStats};
use lod_quality::QualitySettings;
use lod_scheduler::LoadOutcome;
use lod_shared::{ComplexityDescriptor, DeviceCapability, LodStage, QualityProfile};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub session_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub capability: DeviceCapability,
    pub probe_limiting_factor: String,
    pub quality: QualitySettings,
    pub quality_profile: QualityProfile,
    /// `None` until the first frame is recorded
    pub stats: Option<FrameStats>,
    pub bottleneck: BottleneckReport,
    pub total_frames: u64,
    pub rejected_samples: u64,
    pub dataset: Option<ComplexityDescriptor>,
    pub starting_stage: Option<LodStage>,
    pub last_load: Option<LoadOutcome>,
}

impl Diagnostics {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// One-line summary for a status bar
    pub fn summary(&self) -> String {
        let fps = self
            .stats
            .as_ref()
            .map(|s| format!("{:.0} fps", s.mean_fps))
            .unwrap_or_else(|| "no frames".to_string());
        let load = self
            .last_load
            .as_ref()
            .map(|o| o.status_message())
            .unwrap_or("nothing loaded");
        format!(
            "{} | {} quality | {} | {} bottleneck | {}",
            self.capability.tier, self.quality.level, fps, self.bottleneck.kind, load
        )
    }
}
