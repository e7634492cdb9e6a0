//! Memory affordability estimate

use lod_config::StagePolicyTable;
use lod_shared::{ComplexityDescriptor, DeviceCapability, LodStage};

/// Estimated geometry bytes for rendering `descriptor` at `stage`.
///
/// Advisory: element count at the stage times the stage's fixed per-element
/// estimate.
pub fn estimated_stage_bytes(
    descriptor: &ComplexityDescriptor,
    stage: LodStage,
    policies: &StagePolicyTable,
) -> u64 {
    let policy = policies.policy(stage);
    (descriptor.elements_at_stage(policy) as u64).saturating_mul(policy.bytes_per_element)
}

/// Whether the stage's estimated geometry fits the device memory budget
pub fn can_afford_stage(
    descriptor: &ComplexityDescriptor,
    stage: LodStage,
    capability: &DeviceCapability,
    policies: &StagePolicyTable,
) -> bool {
    estimated_stage_bytes(descriptor, stage, policies) <= capability.memory_budget_bytes
}
