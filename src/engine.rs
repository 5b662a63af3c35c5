use std::collections::BTreeMap;

use serde::Serialize;

use crate::bundle::BundleCache;
use crate::config::EngineConfig;
use crate::error::{ConfigError, Diagnostics, StructuralError};
use crate::highlight::{
    DetailPredicate, DetailRow, EdgeDirection, FilterState, Highlight, HighlightMode, Selection,
    evaluate,
};
use crate::layout::{LayoutPosition, RadialLayout};
use crate::model::{EdgeKind, IngestSettings, ModelGraph, NodeKind, RawRecords, ingest};
use crate::search::{SearchHit, search_nodes};
use crate::tree::Tree;

/// One successfully built tree version with everything derived from it.
struct Snapshot {
    version: u64,
    graph: ModelGraph,
    tree: Tree,
    layout: RadialLayout,
    bundles: BundleCache,
    diagnostics: Diagnostics,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeVisual {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub angle: f64,
    pub radius: f64,
    pub opacity: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeGeometry {
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
    pub control_points: Vec<LayoutPosition>,
    pub opacity: f32,
    pub direction: EdgeDirection,
}

/// Geometry and visibility for one tree version under the current filter state.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub tree_version: u64,
    pub tension: f64,
    pub stale: bool,
    pub mode: HighlightMode,
    pub nodes: Vec<NodeVisual>,
    pub edges: Vec<EdgeGeometry>,
    pub kind_counts: BTreeMap<EdgeKind, usize>,
    pub diagnostics: Diagnostics,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedNode {
    pub id: String,
    pub name: String,
    pub kind: EdgeKind,
    pub direction: EdgeDirection,
}

pub struct Engine {
    config: EngineConfig,
    settings: IngestSettings,
    filter: FilterState,
    tension: f64,
    snapshot: Option<Snapshot>,
    next_version: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let settings = config.ingest_settings()?;
        log::debug!(
            "Engine configured: root {:?}, {} denylist patterns, tension {}",
            settings.root_name,
            settings.denylist.len(),
            config.tension
        );

        Ok(Self {
            tension: config.tension,
            config,
            settings,
            filter: FilterState::default(),
            snapshot: None,
            next_version: 1,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs ingestion and rebuilds the tree from the result.
    pub fn ingest(&mut self, records: &RawRecords) -> Result<u64, StructuralError> {
        let ingestion = ingest(records, &self.settings);
        self.load_graph(ingestion.graph, ingestion.diagnostics)
    }

    /// On a structural failure the last good snapshot stays in place, flagged stale.
    pub fn load_graph(
        &mut self,
        graph: ModelGraph,
        diagnostics: Diagnostics,
    ) -> Result<u64, StructuralError> {
        let tree = match Tree::build(&graph.nodes) {
            Ok(tree) => tree,
            Err(error) => {
                match self.snapshot.as_mut() {
                    Some(snapshot) => {
                        log::warn!(
                            "Tree build failed ({error}); keeping tree v{} as stale",
                            snapshot.version
                        );
                        snapshot.diagnostics.stale = Some(error.clone());
                    }
                    None => log::warn!("Tree build failed ({error}); no previous tree to keep"),
                }
                return Err(error);
            }
        };

        let version = self.next_version;
        self.next_version += 1;

        let layout = RadialLayout::compute(&tree, version, self.config.radius_step);
        let mut bundles = BundleCache::new();
        bundles.ensure(&tree, &layout, &graph.edges, self.tension);

        log::info!(
            "Built tree v{version}: {} nodes, {} edges, {} diagnostics",
            tree.len(),
            graph.edge_count(),
            diagnostics.error_count() + bundles.invalid_edges().len()
        );

        self.snapshot = Some(Snapshot {
            version,
            graph,
            tree,
            layout,
            bundles,
            diagnostics,
        });
        Ok(version)
    }

    pub fn set_hover(&mut self, node_id: Option<&str>) {
        self.filter.hovered_node_id = node_id.map(str::to_owned);
    }

    pub fn set_category_selection(
        &mut self,
        kinds: Selection<EdgeKind>,
        containers: Selection<String>,
        objects: Selection<String>,
    ) {
        self.filter.selected_kinds = kinds;
        self.filter.selected_containers = containers;
        self.filter.selected_objects = objects;
    }

    pub fn set_focused_node(&mut self, node_id: Option<&str>) {
        self.filter.focused_node_id = node_id.map(str::to_owned);
    }

    pub fn clear_focused_node(&mut self) {
        self.filter.focused_node_id = None;
    }

    pub fn set_tension(&mut self, tension: f64) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&tension) {
            return Err(ConfigError::InvalidTension(tension));
        }
        self.tension = tension;
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.bundles.ensure(
                &snapshot.tree,
                &snapshot.layout,
                &snapshot.graph.edges,
                tension,
            );
        }
        Ok(())
    }

    pub fn tension(&self) -> f64 {
        self.tension
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter
    }

    pub fn tree_version(&self) -> Option<u64> {
        self.snapshot.as_ref().map(|snapshot| snapshot.version)
    }

    pub fn is_stale(&self) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.diagnostics.stale.is_some())
    }

    pub fn graph(&self) -> Option<&ModelGraph> {
        self.snapshot.as_ref().map(|snapshot| &snapshot.graph)
    }

    pub fn tree(&self) -> Option<&Tree> {
        self.snapshot.as_ref().map(|snapshot| &snapshot.tree)
    }

    pub fn layout(&self) -> Option<&RadialLayout> {
        self.snapshot.as_ref().map(|snapshot| &snapshot.layout)
    }

    pub fn bundles(&self) -> Option<&BundleCache> {
        self.snapshot.as_ref().map(|snapshot| &snapshot.bundles)
    }

    /// Ingestion diagnostics merged with the edges bundling had to drop.
    pub fn diagnostics(&self) -> Diagnostics {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return Diagnostics::default();
        };
        let mut diagnostics = snapshot.diagnostics.clone();
        diagnostics
            .invalid_edges
            .extend(snapshot.bundles.invalid_edges().iter().cloned());
        diagnostics
    }

    pub fn highlight(&self) -> Option<Highlight> {
        let snapshot = self.snapshot.as_ref()?;
        Some(evaluate(&snapshot.graph, &self.filter, &self.config.opacity))
    }

    pub fn dataset(&self) -> Option<Dataset> {
        let snapshot = self.snapshot.as_ref()?;
        let highlight = evaluate(&snapshot.graph, &self.filter, &self.config.opacity);

        let nodes = snapshot
            .graph
            .nodes
            .iter()
            .zip(&highlight.node_opacity)
            .map(|(node, &opacity)| {
                let position = snapshot
                    .layout
                    .position(&snapshot.tree, &node.id)
                    .unwrap_or_default();
                NodeVisual {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    kind: node.kind,
                    angle: position.angle,
                    radius: position.radius,
                    opacity,
                }
            })
            .collect();

        let edges = snapshot
            .graph
            .edges
            .iter()
            .zip(&highlight.edges)
            .enumerate()
            .filter_map(|(index, (edge, visual))| {
                let curve = snapshot.bundles.curve(index)?;
                Some(EdgeGeometry {
                    source_id: edge.source_id.clone(),
                    target_id: edge.target_id.clone(),
                    kind: edge.kind,
                    control_points: curve.control_points.clone(),
                    opacity: visual.opacity,
                    direction: visual.direction,
                })
            })
            .collect();

        Some(Dataset {
            tree_version: snapshot.version,
            tension: self.tension,
            stale: snapshot.diagnostics.stale.is_some(),
            mode: highlight.mode,
            nodes,
            edges,
            kind_counts: snapshot.graph.kind_counts(),
            diagnostics: self.diagnostics(),
        })
    }

    pub fn detail_predicate(&self) -> Option<DetailPredicate<'_>> {
        let snapshot = self.snapshot.as_ref()?;
        Some(DetailPredicate::new(
            &snapshot.graph,
            &self.filter,
            &self.settings,
        ))
    }

    pub fn detail_rows(&self) -> Vec<DetailRow> {
        let Some(graph) = self.graph() else {
            return Vec::new();
        };
        graph
            .edges
            .iter()
            .map(|edge| DetailRow::from_edge(graph, edge))
            .collect()
    }

    pub fn matching_detail_rows(&self) -> Vec<DetailRow> {
        let Some(predicate) = self.detail_predicate() else {
            return Vec::new();
        };
        self.detail_rows()
            .into_iter()
            .filter(|row| predicate.matches_row(row))
            .collect()
    }

    pub fn related_nodes(&self, node_id: &str) -> Vec<RelatedNode> {
        let Some(graph) = self.graph() else {
            return Vec::new();
        };

        let mut related = graph
            .edges
            .iter()
            .filter(|edge| edge.touches(node_id))
            .filter_map(|edge| {
                let (other, direction) = if edge.target_id == node_id {
                    (&edge.source_id, EdgeDirection::Inbound)
                } else {
                    (&edge.target_id, EdgeDirection::Outbound)
                };
                let node = graph.node(other)?;
                Some(RelatedNode {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    kind: edge.kind,
                    direction,
                })
            })
            .collect::<Vec<_>>();

        related.sort_by(|a, b| {
            (a.direction as u8, &a.id, a.kind).cmp(&(b.direction as u8, &b.id, b.kind))
        });
        related
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        self.graph()
            .map(|graph| search_nodes(graph, query, limit))
            .unwrap_or_default()
    }

    /// Path and curve rebuild counts for the current snapshot.
    pub fn bundle_build_counts(&self) -> Option<(usize, usize)> {
        self.bundles().map(BundleCache::build_counts)
    }
}
