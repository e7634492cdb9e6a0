//! Shared types for the adaptive LOD controller
//!
//! This crate contains the data model shared between the analysis, profiler,
//! scheduler and quality-controller crates. Everything here is plain data:
//! descriptors computed once per dataset, per-frame samples, and the events
//! emitted to UI collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod clock;
pub mod dataset;
pub mod errors;
pub mod events;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dataset::{Bounds, Dataset, Element, ElementRole, Structure};
pub use errors::{ErrorContext, ErrorResponse, LodError, LodResult};
pub use events::{QualityChangeEvent, QualityChangeReason, StageResult};

/// Element count at which a dataset stops being `Small`
pub const MEDIUM_ELEMENT_THRESHOLD: usize = 1_000;
/// Element count at which a dataset stops being `Medium`
pub const LARGE_ELEMENT_THRESHOLD: usize = 10_000;
/// Element count at which a dataset becomes `VeryLarge`
pub const VERY_LARGE_ELEMENT_THRESHOLD: usize = 50_000;

/// Coarse size bucket derived from element count alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
    VeryLarge,
}

impl SizeClass {
    /// Bucket an element count. Monotonic in `element_count`.
    pub fn from_element_count(element_count: usize) -> Self {
        if element_count < MEDIUM_ELEMENT_THRESHOLD {
            SizeClass::Small
        } else if element_count < LARGE_ELEMENT_THRESHOLD {
            SizeClass::Medium
        } else if element_count < VERY_LARGE_ELEMENT_THRESHOLD {
            SizeClass::Large
        } else {
            SizeClass::VeryLarge
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeClass::Small => write!(f, "Small"),
            SizeClass::Medium => write!(f, "Medium"),
            SizeClass::Large => write!(f, "Large"),
            SizeClass::VeryLarge => write!(f, "VeryLarge"),
        }
    }
}

/// Immutable summary of a dataset's size, computed once per load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityDescriptor {
    pub element_count: usize,
    pub edge_count: usize,
    pub group_count: usize,
    pub chain_count: usize,
    pub size_class: SizeClass,
    pub bounds: Option<Bounds>,
}

impl ComplexityDescriptor {
    /// Build a descriptor; `size_class` is always derived from `element_count`.
    pub fn new(
        element_count: usize,
        edge_count: usize,
        group_count: usize,
        chain_count: usize,
        bounds: Option<Bounds>,
    ) -> Self {
        Self {
            element_count,
            edge_count,
            group_count,
            chain_count,
            size_class: SizeClass::from_element_count(element_count),
            bounds,
        }
    }

    /// Length of the bounding-box diagonal, zero when bounds are unknown
    pub fn spatial_extent(&self) -> f32 {
        self.bounds.map(|b| b.diagonal()).unwrap_or(0.0)
    }

    /// Elements per cubic unit of bounding volume
    pub fn element_density(&self) -> Option<f64> {
        let volume = self.bounds?.volume();
        if volume > 0.0 {
            Some(self.element_count as f64 / volume)
        } else {
            None
        }
    }

    /// Number of elements the given stage would actually render
    pub fn elements_at_stage(&self, policy: &StagePolicy) -> usize {
        self.element_count.min(policy.max_elements)
    }
}

/// Progressive loading stage. Totally ordered: `Preview < Interactive < Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LodStage {
    Preview,
    Interactive,
    Full,
}

impl LodStage {
    pub const ALL: [LodStage; 3] = [LodStage::Preview, LodStage::Interactive, LodStage::Full];

    /// The next finer stage, if any
    pub fn next(self) -> Option<LodStage> {
        match self {
            LodStage::Preview => Some(LodStage::Interactive),
            LodStage::Interactive => Some(LodStage::Full),
            LodStage::Full => None,
        }
    }

    /// Built-in policy for this stage
    pub fn default_policy(self) -> StagePolicy {
        match self {
            LodStage::Preview => StagePolicy {
                max_elements: 100,
                target_frame_time_ms: 16.6,
                load_budget_ms: 200,
                bytes_per_element: 256,
            },
            LodStage::Interactive => StagePolicy {
                max_elements: 1_000,
                target_frame_time_ms: 16.6,
                load_budget_ms: 1_000,
                bytes_per_element: 2 * 1024,
            },
            LodStage::Full => StagePolicy {
                max_elements: 100_000,
                target_frame_time_ms: 33.3,
                load_budget_ms: 3_000,
                bytes_per_element: 8 * 1024,
            },
        }
    }
}

impl fmt::Display for LodStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LodStage::Preview => write!(f, "Preview"),
            LodStage::Interactive => write!(f, "Interactive"),
            LodStage::Full => write!(f, "Full"),
        }
    }
}

/// Policy constants attached to a stage. Reported against, never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StagePolicy {
    /// Maximum number of elements rendered at this stage
    pub max_elements: usize,
    /// Frame time the stage is expected to sustain
    pub target_frame_time_ms: f64,
    /// Wall-clock load budget
    pub load_budget_ms: u64,
    /// Estimated geometry bytes per rendered element
    pub bytes_per_element: u64,
}

/// Rendering fidelity axis, orthogonal to `LodStage`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "camelCase")]
pub enum QualityLevel {
    #[default]
    Low,
    Medium,
    High,
    Ultra,
    Extreme,
}

impl QualityLevel {
    pub const ALL: [QualityLevel; 5] = [
        QualityLevel::Low,
        QualityLevel::Medium,
        QualityLevel::High,
        QualityLevel::Ultra,
        QualityLevel::Extreme,
    ];

    /// One level up, `None` at `Extreme`
    pub fn upgraded(self) -> Option<QualityLevel> {
        match self {
            QualityLevel::Low => Some(QualityLevel::Medium),
            QualityLevel::Medium => Some(QualityLevel::High),
            QualityLevel::High => Some(QualityLevel::Ultra),
            QualityLevel::Ultra => Some(QualityLevel::Extreme),
            QualityLevel::Extreme => None,
        }
    }

    /// One level down, `None` at `Low`
    pub fn downgraded(self) -> Option<QualityLevel> {
        match self {
            QualityLevel::Low => None,
            QualityLevel::Medium => Some(QualityLevel::Low),
            QualityLevel::High => Some(QualityLevel::Medium),
            QualityLevel::Ultra => Some(QualityLevel::High),
            QualityLevel::Extreme => Some(QualityLevel::Ultra),
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityLevel::Low => write!(f, "Low"),
            QualityLevel::Medium => write!(f, "Medium"),
            QualityLevel::High => write!(f, "High"),
            QualityLevel::Ultra => write!(f, "Ultra"),
            QualityLevel::Extreme => write!(f, "Extreme"),
        }
    }
}

/// Antialiasing technique selected by a quality profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AntialiasingKind {
    None,
    Fxaa,
    Msaa4,
    Msaa8,
}

/// Rendering toggles attached to a `QualityLevel`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityProfile {
    pub resolution_scale: f32,
    pub antialiasing: AntialiasingKind,
    pub shadows: bool,
    pub ambient_occlusion: bool,
    /// Whether secondary structures (side chains, solvent) are drawn
    pub show_secondary_elements: bool,
}

/// Hardware class. Ordered from least to most capable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceTier {
    Mobile,
    Tablet,
    Laptop,
    Desktop,
}

impl fmt::Display for DeviceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceTier::Mobile => write!(f, "Mobile"),
            DeviceTier::Tablet => write!(f, "Tablet"),
            DeviceTier::Laptop => write!(f, "Laptop"),
            DeviceTier::Desktop => write!(f, "Desktop"),
        }
    }
}

const MIB: u64 = 1024 * 1024;

/// Probed device capability, read-only for the rest of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapability {
    pub tier: DeviceTier,
    pub max_affordable_elements: usize,
    pub recommended_quality: QualityLevel,
    pub memory_budget_bytes: u64,
}

impl DeviceCapability {
    /// Built-in capability for a tier
    pub fn for_tier(tier: DeviceTier) -> Self {
        match tier {
            DeviceTier::Desktop => Self {
                tier,
                max_affordable_elements: 100_000,
                recommended_quality: QualityLevel::Ultra,
                memory_budget_bytes: 1024 * MIB,
            },
            DeviceTier::Laptop => Self {
                tier,
                max_affordable_elements: 50_000,
                recommended_quality: QualityLevel::High,
                memory_budget_bytes: 512 * MIB,
            },
            DeviceTier::Tablet => Self {
                tier,
                max_affordable_elements: 10_000,
                recommended_quality: QualityLevel::Medium,
                memory_budget_bytes: 256 * MIB,
            },
            DeviceTier::Mobile => Self {
                tier,
                max_affordable_elements: 5_000,
                recommended_quality: QualityLevel::Low,
                memory_budget_bytes: 128 * MIB,
            },
        }
    }

    /// Replace the memory budget, keeping everything else
    pub fn with_memory_budget(mut self, memory_budget_bytes: u64) -> Self {
        self.memory_budget_bytes = memory_budget_bytes;
        self
    }
}

/// One rendered frame's measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    pub frame_time_ms: f64,
    pub draw_calls: u32,
    pub primitives: u64,
    pub memory_bytes: u64,
}

impl PerformanceSample {
    pub fn new(frame_time_ms: f64, draw_calls: u32, primitives: u64, memory_bytes: u64) -> Self {
        Self {
            frame_time_ms,
            draw_calls,
            primitives,
            memory_bytes,
        }
    }
}
