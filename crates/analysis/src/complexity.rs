//! Complexity analysis and starting-stage selection

use lod_config::StagePolicyTable;
use lod_shared::{ComplexityDescriptor, Dataset, DeviceCapability, LodStage};

/// Pure dataset summariser
pub struct ComplexityAnalyzer;

impl ComplexityAnalyzer {
    /// Summarise a dataset. Deterministic, no I/O, never fails: an empty
    /// dataset is a valid `Small` descriptor without bounds.
    pub fn analyze<D: Dataset + ?Sized>(dataset: &D) -> ComplexityDescriptor {
        ComplexityDescriptor::new(
            dataset.element_count(),
            dataset.edge_count(),
            dataset.group_count(),
            dataset.chain_count(),
            dataset.bounds(),
        )
    }
}

/// Where progressive loading should begin for this dataset on this device.
///
/// Datasets the device cannot afford start at `Preview`; datasets too large
/// for the `Interactive` cap start there; everything else goes straight to
/// `Full`.
pub fn determine_starting_stage(
    descriptor: &ComplexityDescriptor,
    capability: &DeviceCapability,
    stages: &StagePolicyTable,
) -> LodStage {
    if descriptor.element_count > capability.max_affordable_elements {
        LodStage::Preview
    } else if descriptor.element_count > stages.policy(LodStage::Interactive).max_elements {
        LodStage::Interactive
    } else {
        LodStage::Full
    }
}
