use serde::Serialize;

use crate::error::InvalidEdgeError;
use crate::layout::{LayoutPosition, RadialLayout};
use crate::model::Edge;
use crate::tree::Tree;
use crate::util::cartesian_to_polar;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleCurve {
    pub control_points: Vec<LayoutPosition>,
}

impl BundleCurve {
    /// Straightens the ancestor polyline toward the source-target chord by `1 - tension`.
    pub fn from_path(points: &[LayoutPosition], tension: f64) -> Self {
        let tension = tension.clamp(0.0, 1.0);
        let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
            return Self::default();
        };

        if points.len() < 3 || tension >= 1.0 {
            return Self {
                control_points: points.to_vec(),
            };
        }
        if tension <= 0.0 {
            return Self {
                control_points: vec![first, last],
            };
        }

        let (x0, y0) = first.to_cartesian();
        let (xn, yn) = last.to_cartesian();
        let span = (points.len() - 1) as f64;

        let mut control_points = Vec::with_capacity(points.len());
        control_points.push(first);
        for (index, point) in points.iter().enumerate().take(points.len() - 1).skip(1) {
            let t = index as f64 / span;
            let (x, y) = point.to_cartesian();
            let chord_x = x0 + (xn - x0) * t;
            let chord_y = y0 + (yn - y0) * t;
            let (angle, radius) = cartesian_to_polar(
                tension * x + (1.0 - tension) * chord_x,
                tension * y + (1.0 - tension) * chord_y,
            );
            control_points.push(LayoutPosition { angle, radius });
        }
        control_points.push(last);

        Self { control_points }
    }

    /// Evaluates the clamped uniform cubic B-spline through the control points.
    pub fn sample(&self, segments: usize) -> Vec<(f64, f64)> {
        let points = self
            .control_points
            .iter()
            .map(|point| point.to_cartesian())
            .collect::<Vec<_>>();
        let segments = segments.max(1);

        match points.as_slice() {
            [] => Vec::new(),
            [only] => vec![*only],
            [first, last] => vec![*first, *last],
            [first, second, rest @ ..] => {
                let mut out = vec![*first];
                let (mut x0, mut x1) = (*first, *second);
                out.push(((5.0 * x0.0 + x1.0) / 6.0, (5.0 * x0.1 + x1.1) / 6.0));
                for &next in rest {
                    push_basis_span(&mut out, x0, x1, next, segments);
                    x0 = x1;
                    x1 = next;
                }
                push_basis_span(&mut out, x0, x1, x1, segments);
                out.push(x1);
                out
            }
        }
    }
}

fn push_basis_span(
    out: &mut Vec<(f64, f64)>,
    x0: (f64, f64),
    x1: (f64, f64),
    next: (f64, f64),
    segments: usize,
) {
    let Some(&start) = out.last() else {
        return;
    };
    let c1 = ((2.0 * x0.0 + x1.0) / 3.0, (2.0 * x0.1 + x1.1) / 3.0);
    let c2 = ((x0.0 + 2.0 * x1.0) / 3.0, (x0.1 + 2.0 * x1.1) / 3.0);
    let end = (
        (x0.0 + 4.0 * x1.0 + next.0) / 6.0,
        (x0.1 + 4.0 * x1.1 + next.1) / 6.0,
    );

    for step in 1..=segments {
        let t = step as f64 / segments as f64;
        let u = 1.0 - t;
        let a = u * u * u;
        let b = 3.0 * u * u * t;
        let c = 3.0 * u * t * t;
        let d = t * t * t;
        out.push((
            a * start.0 + b * c1.0 + c * c2.0 + d * end.0,
            a * start.1 + b * c1.1 + c * c2.1 + d * end.1,
        ));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CacheKey {
    tree_version: u64,
    tension_bits: u64,
}

/// Per-edge tree paths and curves for one `(tree version, tension)` pair.
#[derive(Clone, Debug, Default)]
pub struct BundleCache {
    key: Option<CacheKey>,
    paths: Vec<Option<Vec<usize>>>,
    curves: Vec<Option<BundleCurve>>,
    invalid: Vec<InvalidEdgeError>,
    path_builds: usize,
    curve_builds: usize,
}

impl BundleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when anything was recomputed.
    pub fn ensure(
        &mut self,
        tree: &Tree,
        layout: &RadialLayout,
        edges: &[Edge],
        tension: f64,
    ) -> bool {
        let tension = tension.clamp(0.0, 1.0);
        let key = CacheKey {
            tree_version: layout.tree_version(),
            tension_bits: tension.to_bits(),
        };

        match self.key {
            Some(current) if current == key && self.paths.len() == edges.len() => false,
            Some(current)
                if current.tree_version == key.tree_version
                    && self.paths.len() == edges.len() =>
            {
                log::debug!(
                    "Tension changed to {tension}, rebuilding {} curves",
                    self.paths.len()
                );
                self.rebuild_curves(layout, tension);
                self.key = Some(key);
                true
            }
            _ => {
                log::debug!(
                    "Tree v{} is new, rebuilding {} bundle paths",
                    key.tree_version,
                    edges.len()
                );
                self.rebuild_paths(tree, edges);
                self.rebuild_curves(layout, tension);
                self.key = Some(key);
                true
            }
        }
    }

    fn rebuild_paths(&mut self, tree: &Tree, edges: &[Edge]) {
        self.invalid.clear();
        self.paths = edges
            .iter()
            .map(|edge| match edge_path(tree, edge) {
                Ok(path) => Some(path),
                Err(error) => {
                    log::warn!("Excluding edge from bundling: {error}");
                    self.invalid.push(error);
                    None
                }
            })
            .collect();
        self.path_builds += 1;
    }

    fn rebuild_curves(&mut self, layout: &RadialLayout, tension: f64) {
        self.curves = self
            .paths
            .iter()
            .map(|path| {
                path.as_ref().map(|path| {
                    let points = path
                        .iter()
                        .map(|&index| layout.position_at(index))
                        .collect::<Vec<_>>();
                    BundleCurve::from_path(&points, tension)
                })
            })
            .collect();
        self.curve_builds += 1;
    }

    pub fn tree_version(&self) -> Option<u64> {
        self.key.map(|key| key.tree_version)
    }

    pub fn tension(&self) -> Option<f64> {
        self.key.map(|key| f64::from_bits(key.tension_bits))
    }

    pub fn curve(&self, edge_index: usize) -> Option<&BundleCurve> {
        self.curves.get(edge_index).and_then(Option::as_ref)
    }

    pub fn path_ids<'t>(&self, tree: &'t Tree, edge_index: usize) -> Option<Vec<&'t str>> {
        let path = self.paths.get(edge_index)?.as_ref()?;
        Some(path.iter().map(|&index| tree.id_at(index)).collect())
    }

    pub fn invalid_edges(&self) -> &[InvalidEdgeError] {
        &self.invalid
    }

    /// Number of full path rebuilds and curve rebuilds performed so far.
    pub fn build_counts(&self) -> (usize, usize) {
        (self.path_builds, self.curve_builds)
    }
}

fn edge_path(tree: &Tree, edge: &Edge) -> Result<Vec<usize>, InvalidEdgeError> {
    if edge.source_id == edge.target_id {
        return Err(InvalidEdgeError::SelfLoop {
            source_id: edge.source_id.clone(),
            target_id: edge.target_id.clone(),
        });
    }

    let source = tree.index_of(&edge.source_id);
    let target = tree.index_of(&edge.target_id);
    let (Some(source), Some(target)) = (source, target) else {
        return Err(InvalidEdgeError::UnknownEndpoint {
            source_id: edge.source_id.clone(),
            target_id: edge.target_id.clone(),
        });
    };

    let path = tree.path_indices(source, target);
    if path.len() < 2 {
        return Err(InvalidEdgeError::DegeneratePath {
            source_id: edge.source_id.clone(),
            target_id: edge.target_id.clone(),
            points: path.len(),
        });
    }
    Ok(path)
}
