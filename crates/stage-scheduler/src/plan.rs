//! Which stages a progressive load walks through

use lod_analysis::determine_starting_stage;
use lod_config::StagePolicyTable;
use lod_shared::{ComplexityDescriptor, DeviceCapability, LodStage};
use serde::{Deserialize, Serialize};

/// Ascending, duplicate-free list of stages to build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePlan {
    stages: Vec<LodStage>,
}

impl StagePlan {
    /// Every stage from `start` up to `target`, inclusive.
    ///
    /// When `start` is already past `target` the caller still gets the
    /// detail it asked for, so the plan is `[target]`.
    pub fn between(start: LodStage, target: LodStage) -> Self {
        if start > target {
            return Self {
                stages: vec![target],
            };
        }
        let stages = LodStage::ALL
            .into_iter()
            .filter(|s| *s >= start && *s <= target)
            .collect();
        Self { stages }
    }

    /// Walk starting where the dataset/device pair says loading should begin
    pub fn from_start(
        descriptor: &ComplexityDescriptor,
        capability: &DeviceCapability,
        policies: &StagePolicyTable,
        target: LodStage,
    ) -> Self {
        Self::between(
            determine_starting_stage(descriptor, capability, policies),
            target,
        )
    }

    /// `Preview` through `target`
    pub fn full_walk(target: LodStage) -> Self {
        Self::between(LodStage::Preview, target)
    }

    pub fn stages(&self) -> &[LodStage] {
        &self.stages
    }

    pub fn first(&self) -> Option<LodStage> {
        self.stages.first().copied()
    }

    pub fn target(&self) -> Option<LodStage> {
        self.stages.last().copied()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
