//! Configuration system for the adaptive LOD controller
//!
//! Every policy constant the controller uses (fps thresholds, cooldown, stage
//! caps, per-element byte estimates, probe tier boundaries, bottleneck
//! thresholds) lives here so deployments can tune them without code changes.

use lod_shared::{DeviceCapability, DeviceTier, LodError, LodStage, QualityLevel, StagePolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod parser;
pub mod presets;
pub mod validation;

pub use parser::{ConfigFormat, ConfigParser, ConfigSerializer};
pub use presets::{quality_profile, QUALITY_PRESETS};
pub use validation::ConfigValidator;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl From<ConfigError> for LodError {
    fn from(err: ConfigError) -> Self {
        LodError::InvalidConfig {
            message: err.to_string(),
            field: None,
        }
    }
}

/// Top-level controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    pub version: String,
    pub quality: QualityControlConfig,
    pub memory: MemoryConfig,
    pub stages: StagePolicyTable,
    pub profiler: ProfilerConfig,
    pub probe: ProbeConfig,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            quality: QualityControlConfig::default(),
            memory: MemoryConfig::default(),
            stages: StagePolicyTable::default(),
            profiler: ProfilerConfig::default(),
            probe: ProbeConfig::default(),
        }
    }
}

impl LodConfig {
    /// Apply the memory override, if any, to a probed capability
    pub fn effective_capability(&self, probed: DeviceCapability) -> DeviceCapability {
        match self.memory.memory_budget_bytes {
            Some(bytes) => probed.with_memory_budget(bytes),
            None => probed,
        }
    }
}

/// Adaptive quality loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityControlConfig {
    pub auto_adjust_enabled: bool,
    pub target_fps: u32,
    pub min_fps: u32,
    /// Upgrade once mean fps exceeds `target_fps * headroom_factor`
    pub headroom_factor: f64,
    /// Minimum time between automatic changes
    pub cooldown_ms: u64,
    /// Samples required before a tick may act
    pub min_sample_count: usize,
    pub poll_interval_ms: u64,
    /// Starting level; the probed recommendation when unset
    pub initial_level: Option<QualityLevel>,
}

impl Default for QualityControlConfig {
    fn default() -> Self {
        Self {
            auto_adjust_enabled: true,
            target_fps: 60,
            min_fps: 30,
            headroom_factor: 1.2,
            cooldown_ms: 3_000,
            min_sample_count: 30,
            poll_interval_ms: 1_000,
            initial_level: None,
        }
    }
}

impl QualityControlConfig {
    pub fn upgrade_threshold_fps(&self) -> f64 {
        self.target_fps as f64 * self.headroom_factor
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Overrides the probed memory budget
    pub memory_budget_bytes: Option<u64>,
}

/// Per-stage policy table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagePolicyTable {
    pub preview: StagePolicy,
    pub interactive: StagePolicy,
    pub full: StagePolicy,
}

impl Default for StagePolicyTable {
    fn default() -> Self {
        Self {
            preview: LodStage::Preview.default_policy(),
            interactive: LodStage::Interactive.default_policy(),
            full: LodStage::Full.default_policy(),
        }
    }
}

impl StagePolicyTable {
    pub fn policy(&self, stage: LodStage) -> &StagePolicy {
        match stage {
            LodStage::Preview => &self.preview,
            LodStage::Interactive => &self.interactive,
            LodStage::Full => &self.full,
        }
    }
}

/// Performance profiler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Ring buffer capacity in frames
    pub capacity: usize,
    /// A frame counts as dropped above `target frame time * dropped_frame_factor`
    pub dropped_frame_factor: f64,
    pub bottleneck: BottleneckThresholds,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            capacity: 120,
            dropped_frame_factor: 1.5,
            bottleneck: BottleneckThresholds::default(),
        }
    }
}

/// Fixed thresholds for the bottleneck heuristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BottleneckThresholds {
    /// Memory in use / budget above which memory is the bottleneck
    pub memory_pressure_ratio: f64,
    /// Mean draw calls per frame before submission cost matters
    pub cpu_min_draw_calls: f64,
    /// Below this many primitives per draw call, frames are draw-call bound
    pub cpu_max_primitives_per_draw: f64,
    /// Mean primitives per frame before the GPU is suspected
    pub gpu_min_primitives: f64,
}

impl Default for BottleneckThresholds {
    fn default() -> Self {
        Self {
            memory_pressure_ratio: 0.80,
            cpu_min_draw_calls: 200.0,
            cpu_max_primitives_per_draw: 100.0,
            gpu_min_primitives: 1_000_000.0,
        }
    }
}

/// Minimum introspection values for a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRequirement {
    pub min_texture_dimension: u32,
    pub min_memory_mb: u32,
}

/// Probe decision table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub desktop: TierRequirement,
    pub laptop: TierRequirement,
    pub tablet: TierRequirement,
    pub capabilities: TierCapabilityTable,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            desktop: TierRequirement {
                min_texture_dimension: 16_384,
                min_memory_mb: 8_192,
            },
            laptop: TierRequirement {
                min_texture_dimension: 8_192,
                min_memory_mb: 4_096,
            },
            tablet: TierRequirement {
                min_texture_dimension: 4_096,
                min_memory_mb: 2_048,
            },
            capabilities: TierCapabilityTable::default(),
        }
    }
}

impl ProbeConfig {
    /// Tiers that need meeting, best first. Mobile has no requirement.
    pub fn requirements(&self) -> [(DeviceTier, TierRequirement); 3] {
        [
            (DeviceTier::Desktop, self.desktop),
            (DeviceTier::Laptop, self.laptop),
            (DeviceTier::Tablet, self.tablet),
        ]
    }
}

/// Capability granted per tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierCapabilityTable {
    pub desktop: DeviceCapability,
    pub laptop: DeviceCapability,
    pub tablet: DeviceCapability,
    pub mobile: DeviceCapability,
}

impl Default for TierCapabilityTable {
    fn default() -> Self {
        Self {
            desktop: DeviceCapability::for_tier(DeviceTier::Desktop),
            laptop: DeviceCapability::for_tier(DeviceTier::Laptop),
            tablet: DeviceCapability::for_tier(DeviceTier::Tablet),
            mobile: DeviceCapability::for_tier(DeviceTier::Mobile),
        }
    }
}

impl TierCapabilityTable {
    pub fn capability(&self, tier: DeviceTier) -> DeviceCapability {
        match tier {
            DeviceTier::Desktop => self.desktop,
            DeviceTier::Laptop => self.laptop,
            DeviceTier::Tablet => self.tablet,
            DeviceTier::Mobile => self.mobile,
        }
    }
}
