//! Deterministic per-stage element selection

use lod_shared::{Element, LodStage};
use serde::{Deserialize, Serialize};

/// Elements handed to the geometry builder for one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSubset {
    pub stage: LodStage,
    /// Indices into the dataset's element list, ascending
    pub indices: Vec<usize>,
    pub elements: Vec<Element>,
}

impl ElementSubset {
    /// Take the `cap` most important elements from `importance_order`.
    ///
    /// The chosen indices are returned in dataset order so consecutive stages
    /// produce stable, overlapping subsets.
    pub fn select(
        stage: LodStage,
        elements: &[Element],
        importance_order: &[usize],
        cap: usize,
    ) -> Self {
        let mut indices: Vec<usize> = importance_order.iter().copied().take(cap).collect();
        indices.sort_unstable();
        let elements = indices.iter().map(|&i| elements[i]).collect();
        Self {
            stage,
            indices,
            elements,
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
