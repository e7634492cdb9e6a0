//! Parsed dataset interface consumed by the analyzer and scheduler
//!
//! Parsing itself happens elsewhere. The controller only needs counts,
//! spatial bounds and a deterministic importance ordering over elements.

use crate::errors::{LodError, LodResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Structural role of an element. Declaration order is importance order:
/// skeleton first, peripheral last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementRole {
    Backbone,
    Sidechain,
    Ligand,
    Ion,
    Solvent,
    Hydrogen,
}

/// A single discrete element (an atom, for molecular data)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub role: ElementRole,
    /// Grouping index within the chain (residue number)
    pub group: u32,
    pub chain: u16,
    pub position: [f32; 3],
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    /// Smallest box containing every point, `None` for an empty iterator
    pub fn from_points(points: impl IntoIterator<Item = [f32; 3]>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for p in points {
            for axis in 0..3 {
                bounds.min[axis] = bounds.min[axis].min(p[axis]);
                bounds.max[axis] = bounds.max[axis].max(p[axis]);
            }
        }
        Some(bounds)
    }

    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn diagonal(&self) -> f32 {
        let [x, y, z] = self.size();
        (x * x + y * y + z * z).sqrt()
    }

    pub fn volume(&self) -> f64 {
        let [x, y, z] = self.size();
        x as f64 * y as f64 * z as f64
    }
}

/// A parsed structure as seen by the controller
pub trait Dataset: Send + Sync {
    fn elements(&self) -> &[Element];

    fn edge_count(&self) -> usize;

    fn group_count(&self) -> usize;

    fn chain_count(&self) -> usize;

    fn element_count(&self) -> usize {
        self.elements().len()
    }

    fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.elements().iter().map(|e| e.position))
    }

    /// Element indices, most important first. Ties keep file order, so the
    /// same input always yields the same ordering.
    fn importance_order(&self) -> Vec<usize> {
        let elements = self.elements();
        let mut order: Vec<usize> = (0..elements.len()).collect();
        order.sort_by_key(|&i| (elements[i].role, i));
        order
    }
}

/// In-memory structure: elements plus connectivity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    pub name: String,
    elements: Vec<Element>,
    edges: Vec<(u32, u32)>,
    group_count: usize,
    chain_count: usize,
}

impl Structure {
    /// Build a structure, rejecting edges that point outside the element list
    pub fn new(
        name: impl Into<String>,
        elements: Vec<Element>,
        edges: Vec<(u32, u32)>,
    ) -> LodResult<Self> {
        let name = name.into();
        if let Some(&(a, b)) = edges
            .iter()
            .find(|(a, b)| *a as usize >= elements.len() || *b as usize >= elements.len())
        {
            return Err(LodError::InvalidDataset {
                message: format!(
                    "{name}: edge ({a}, {b}) references a missing element (have {})",
                    elements.len()
                ),
            });
        }

        let group_count = elements
            .iter()
            .map(|e| (e.chain, e.group))
            .collect::<HashSet<_>>()
            .len();
        let chain_count = elements.iter().map(|e| e.chain).collect::<HashSet<_>>().len();

        Ok(Self {
            name,
            elements,
            edges,
            group_count,
            chain_count,
        })
    }

    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Protein-like structure with `element_count` elements, used by demos
    /// and benchmarks. Residues of eight elements (four backbone, three side
    /// chain, one hydrogen) wind along a helix, 250 residues per chain; any
    /// remainder becomes solvent.
    pub fn synthetic(element_count: usize) -> Self {
        const PER_RESIDUE: usize = 8;
        const RESIDUES_PER_CHAIN: usize = 250;
        const ROLES: [ElementRole; PER_RESIDUE] = [
            ElementRole::Backbone,
            ElementRole::Backbone,
            ElementRole::Backbone,
            ElementRole::Backbone,
            ElementRole::Sidechain,
            ElementRole::Sidechain,
            ElementRole::Sidechain,
            ElementRole::Hydrogen,
        ];

        let residues = element_count / PER_RESIDUE;
        let mut elements = Vec::with_capacity(element_count);
        let mut edges = Vec::with_capacity(element_count);

        for residue in 0..residues {
            let chain = (residue / RESIDUES_PER_CHAIN) as u16;
            let local = residue % RESIDUES_PER_CHAIN;
            let angle = local as f32 * 100f32.to_radians();
            let base = [
                chain as f32 * 30.0 + 2.3 * angle.cos(),
                2.3 * angle.sin(),
                local as f32 * 1.5,
            ];
            let first = elements.len() as u32;
            for (slot, role) in ROLES.iter().enumerate() {
                let offset = slot as f32 * 0.4;
                elements.push(Element {
                    role: *role,
                    group: local as u32,
                    chain,
                    position: [base[0] + offset, base[1] - offset, base[2] + offset * 0.5],
                });
                if slot > 0 {
                    edges.push((first + slot as u32 - 1, first + slot as u32));
                }
            }
            // peptide bond to the previous residue in the same chain
            if local > 0 {
                edges.push((first - PER_RESIDUE as u32 + 2, first));
            }
        }

        while elements.len() < element_count {
            let i = elements.len();
            elements.push(Element {
                role: ElementRole::Solvent,
                group: i as u32,
                chain: u16::MAX,
                position: [-(i as f32 % 10.0), (i as f32 / 10.0) % 10.0, -5.0],
            });
        }

        let group_count = elements
            .iter()
            .map(|e| (e.chain, e.group))
            .collect::<HashSet<_>>()
            .len();
        let chain_count = elements.iter().map(|e| e.chain).collect::<HashSet<_>>().len();

        Self {
            name: format!("synthetic-{element_count}"),
            elements,
            edges,
            group_count,
            chain_count,
        }
    }
}

impl Dataset for Structure {
    fn elements(&self) -> &[Element] {
        &self.elements
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn group_count(&self) -> usize {
        self.group_count
    }

    fn chain_count(&self) -> usize {
        self.chain_count
    }
}
