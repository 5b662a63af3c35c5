use std::f64::consts::TAU;

use serde::Serialize;

use crate::tree::Tree;
use crate::util::polar_to_cartesian;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct LayoutPosition {
    pub angle: f64,
    pub radius: f64,
}

impl LayoutPosition {
    pub fn to_cartesian(self) -> (f64, f64) {
        polar_to_cartesian(self.angle, self.radius)
    }
}

/// Cluster-style radial layout keyed to one tree version.
#[derive(Clone, Debug)]
pub struct RadialLayout {
    tree_version: u64,
    positions: Vec<LayoutPosition>,
    leaf_radius: f64,
    leaf_step: f64,
}

impl RadialLayout {
    pub fn compute(tree: &Tree, tree_version: u64, radius_step: f64) -> Self {
        let node_count = tree.len();
        let mut positions = vec![LayoutPosition::default(); node_count];

        let leaves = tree
            .preorder()
            .iter()
            .copied()
            .filter(|&index| tree.children_at(index).is_empty())
            .collect::<Vec<_>>();
        let max_leaf_depth = leaves
            .iter()
            .map(|&index| tree.depth_at(index))
            .max()
            .unwrap_or(0);
        let leaf_radius = max_leaf_depth as f64 * radius_step;
        let leaf_step = if leaves.is_empty() {
            0.0
        } else {
            TAU / leaves.len() as f64
        };

        for (slot, &index) in leaves.iter().enumerate() {
            positions[index] = LayoutPosition {
                angle: slot as f64 * leaf_step,
                radius: leaf_radius,
            };
        }

        // Reverse preorder visits every child before its parent.
        for &index in tree.preorder().iter().rev() {
            let children = tree.children_at(index);
            if children.is_empty() {
                continue;
            }
            let mean = children
                .iter()
                .map(|&child| positions[child].angle)
                .sum::<f64>()
                / children.len() as f64;
            positions[index] = LayoutPosition {
                angle: mean,
                radius: tree.depth_at(index) as f64 * radius_step,
            };
        }

        log::debug!(
            "Computed radial layout for tree v{tree_version}: {} leaves, leaf radius {leaf_radius}",
            leaves.len()
        );

        Self {
            tree_version,
            positions,
            leaf_radius,
            leaf_step,
        }
    }

    pub fn tree_version(&self) -> u64 {
        self.tree_version
    }

    pub fn leaf_radius(&self) -> f64 {
        self.leaf_radius
    }

    /// Angular increment between consecutive leaves.
    pub fn leaf_step(&self) -> f64 {
        self.leaf_step
    }

    pub fn position_at(&self, index: usize) -> LayoutPosition {
        self.positions[index]
    }

    pub fn position(&self, tree: &Tree, id: &str) -> Option<LayoutPosition> {
        tree.index_of(id).map(|index| self.positions[index])
    }
}
