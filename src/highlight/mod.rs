use std::borrow::Borrow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{Edge, EdgeKind, ModelGraph};

mod collect;
mod predicate;

use self::collect::collect_hover_neighbourhood;
pub use self::predicate::{DetailPredicate, DetailRow};

/// Either every value, or an explicit set; unknown values simply match nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection<T: Ord> {
    All,
    Only(BTreeSet<T>),
}

impl<T: Ord> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: Ord> Selection<T> {
    pub fn only(values: impl IntoIterator<Item = T>) -> Self {
        Self::Only(values.into_iter().collect())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self {
            Self::All => true,
            Self::Only(values) => values.contains(value),
        }
    }

    /// Like `contains`, for values that may be absent; only `All` accepts a missing value.
    pub fn accepts<Q>(&self, value: Option<&Q>) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match value {
            Some(value) => self.contains(value),
            None => self.is_all(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
    pub selected_kinds: Selection<EdgeKind>,
    pub selected_containers: Selection<String>,
    pub selected_objects: Selection<String>,
    pub hovered_node_id: Option<String>,
    pub focused_node_id: Option<String>,
}

impl FilterState {
    pub fn has_category_filter(&self) -> bool {
        !self.selected_kinds.is_all()
            || !self.selected_containers.is_all()
            || !self.selected_objects.is_all()
    }

    pub(crate) fn endpoint_matches(&self, container: Option<&str>, object: Option<&str>) -> bool {
        self.selected_containers.accepts(container) && self.selected_objects.accepts(object)
    }

    pub fn edge_matches(&self, graph: &ModelGraph, edge: &Edge) -> bool {
        if !self.selected_kinds.contains(&edge.kind) {
            return false;
        }

        [&edge.source_id, &edge.target_id].into_iter().any(|id| {
            let node = graph.node(id);
            self.endpoint_matches(
                node.and_then(|node| node.container.as_deref()),
                node.map(|node| node.name.as_str()),
            )
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpacityTiers {
    pub full: f32,
    pub medium: f32,
    pub dimmed: f32,
    pub faint: f32,
}

impl Default for OpacityTiers {
    fn default() -> Self {
        Self {
            full: 1.0,
            medium: 0.4,
            dimmed: 0.12,
            faint: 0.04,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDirection {
    #[default]
    None,
    Inbound,
    Outbound,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HighlightMode {
    Hover,
    Category,
    Default,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EdgeVisual {
    pub opacity: f32,
    pub direction: EdgeDirection,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Highlight {
    pub mode: HighlightMode,
    pub node_opacity: Vec<f32>,
    pub edges: Vec<EdgeVisual>,
}

/// Hover beats category selections, which beat the resting state.
pub fn evaluate(graph: &ModelGraph, state: &FilterState, tiers: &OpacityTiers) -> Highlight {
    let hover = state
        .hovered_node_id
        .as_deref()
        .and_then(|hovered| collect_hover_neighbourhood(graph, hovered));

    if let Some(hover) = hover {
        let node_opacity = (0..graph.node_count())
            .map(|index| {
                if hover.nodes.contains(&index) {
                    tiers.full
                } else {
                    tiers.dimmed
                }
            })
            .collect();
        let edges = hover
            .edges
            .into_iter()
            .map(|direction| EdgeVisual {
                opacity: if direction == EdgeDirection::None {
                    tiers.dimmed
                } else {
                    tiers.full
                },
                direction,
            })
            .collect();

        return Highlight {
            mode: HighlightMode::Hover,
            node_opacity,
            edges,
        };
    }

    let node_opacity = vec![tiers.full; graph.node_count()];

    if state.has_category_filter() {
        let edges = graph
            .edges
            .iter()
            .map(|edge| EdgeVisual {
                opacity: if state.edge_matches(graph, edge) {
                    tiers.medium
                } else {
                    tiers.faint
                },
                direction: EdgeDirection::None,
            })
            .collect();

        return Highlight {
            mode: HighlightMode::Category,
            node_opacity,
            edges,
        };
    }

    Highlight {
        mode: HighlightMode::Default,
        node_opacity,
        edges: vec![
            EdgeVisual {
                opacity: tiers.medium,
                direction: EdgeDirection::None,
            };
            graph.edge_count()
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IngestSettings, Node, NodeKind};

    fn leaf(container: &str, name: &str) -> Node {
        Node {
            id: format!("M.{container}.{name}"),
            name: name.into(),
            parent_id: Some(format!("M.{container}")),
            kind: NodeKind::Column,
            container: Some(container.into()),
        }
    }

    fn edge(source: &str, target: &str, kind: EdgeKind) -> Edge {
        Edge {
            source_id: source.into(),
            target_id: target.into(),
            kind,
            relationship: None,
        }
    }

    fn sample_graph() -> ModelGraph {
        ModelGraph::new(
            "M",
            vec![
                leaf("Sales", "Amount"),
                leaf("Sales", "Total"),
                leaf("Date", "OrderDate"),
                leaf("Product", "Name"),
            ],
            vec![
                edge("M.Sales.Amount", "M.Date.OrderDate", EdgeKind::Relationship),
                edge("M.Sales.Total", "M.Sales.Amount", EdgeKind::MeasureDependency),
                edge("M.Product.Name", "M.Date.OrderDate", EdgeKind::Relationship),
            ],
        )
    }

    #[test]
    fn test_default_state_uses_medium_edges_and_full_nodes() {
        let graph = sample_graph();
        let tiers = OpacityTiers::default();
        let highlight = evaluate(&graph, &FilterState::default(), &tiers);

        assert_eq!(highlight.mode, HighlightMode::Default);
        assert!(highlight.node_opacity.iter().all(|&o| o == tiers.full));
        assert!(highlight.edges.iter().all(|e| e.opacity == tiers.medium));
        assert!(
            highlight
                .edges
                .iter()
                .all(|e| e.direction == EdgeDirection::None)
        );
    }

    #[test]
    fn test_hover_tags_direction_and_dims_the_rest() {
        let graph = sample_graph();
        let tiers = OpacityTiers::default();
        let state = FilterState {
            hovered_node_id: Some("M.Sales.Amount".into()),
            ..FilterState::default()
        };
        let highlight = evaluate(&graph, &state, &tiers);

        assert_eq!(highlight.mode, HighlightMode::Hover);
        assert_eq!(highlight.edges[0].direction, EdgeDirection::Outbound);
        assert_eq!(highlight.edges[1].direction, EdgeDirection::Inbound);
        assert_eq!(highlight.edges[2].direction, EdgeDirection::None);
        assert_eq!(highlight.edges[0].opacity, tiers.full);
        assert_eq!(highlight.edges[2].opacity, tiers.dimmed);

        assert_eq!(
            highlight.node_opacity,
            vec![tiers.full, tiers.full, tiers.full, tiers.dimmed]
        );
    }

    #[test]
    fn test_category_filter_dims_edges_not_nodes() {
        let graph = sample_graph();
        let tiers = OpacityTiers::default();
        let state = FilterState {
            selected_kinds: Selection::only([EdgeKind::Relationship]),
            selected_containers: Selection::only(["Product".to_owned()]),
            ..FilterState::default()
        };
        let highlight = evaluate(&graph, &state, &tiers);

        assert_eq!(highlight.mode, HighlightMode::Category);
        assert_eq!(highlight.edges[0].opacity, tiers.faint);
        assert_eq!(highlight.edges[1].opacity, tiers.faint);
        assert_eq!(highlight.edges[2].opacity, tiers.medium);
        assert!(highlight.node_opacity.iter().all(|&o| o == tiers.full));
    }

    #[test]
    fn test_object_selection_matches_either_endpoint_name() {
        let graph = sample_graph();
        let state = FilterState {
            selected_objects: Selection::only(["OrderDate".to_owned()]),
            ..FilterState::default()
        };

        assert!(state.edge_matches(&graph, &graph.edges[0]));
        assert!(!state.edge_matches(&graph, &graph.edges[1]));
        assert!(state.edge_matches(&graph, &graph.edges[2]));
    }

    #[test]
    fn test_unknown_selection_values_match_nothing() {
        let graph = sample_graph();
        let tiers = OpacityTiers::default();
        let state = FilterState {
            selected_containers: Selection::only(["Gone".to_owned()]),
            ..FilterState::default()
        };
        let highlight = evaluate(&graph, &state, &tiers);
        assert!(highlight.edges.iter().all(|e| e.opacity == tiers.faint));
    }

    #[test]
    fn test_unknown_hover_falls_back_to_category_rules() {
        let graph = sample_graph();
        let state = FilterState {
            hovered_node_id: Some("M.Nowhere.Nothing".into()),
            ..FilterState::default()
        };
        let highlight = evaluate(&graph, &state, &OpacityTiers::default());
        assert_eq!(highlight.mode, HighlightMode::Default);
    }

    #[test]
    fn test_hover_overrides_category_and_clearing_restores_it() {
        let graph = sample_graph();
        let tiers = OpacityTiers::default();
        let mut state = FilterState {
            selected_kinds: Selection::only([EdgeKind::MeasureDependency]),
            ..FilterState::default()
        };
        let category_only = evaluate(&graph, &state, &tiers);

        state.hovered_node_id = Some("M.Date.OrderDate".into());
        let hovered = evaluate(&graph, &state, &tiers);
        assert_eq!(hovered.edges[0].opacity, tiers.full);
        assert_eq!(hovered.edges[2].opacity, tiers.full);
        assert_eq!(hovered.edges[0].direction, EdgeDirection::Inbound);

        state.hovered_node_id = None;
        assert_eq!(evaluate(&graph, &state, &tiers), category_only);
    }

    #[test]
    fn test_detail_predicate_ignores_hover_and_honours_focus() {
        let graph = sample_graph();
        let settings = IngestSettings::default();
        let mut state = FilterState {
            hovered_node_id: Some("M.Product.Name".into()),
            ..FilterState::default()
        };
        let rows = graph
            .edges
            .iter()
            .map(|edge| DetailRow::from_edge(&graph, edge))
            .collect::<Vec<_>>();

        let predicate = DetailPredicate::new(&graph, &state, &settings);
        assert!(rows.iter().all(|row| predicate.matches_row(row)));

        state.focused_node_id = Some("M.Sales.Amount".into());
        let predicate = DetailPredicate::new(&graph, &state, &settings);
        let matched = rows
            .iter()
            .map(|row| predicate.matches_row(row))
            .collect::<Vec<_>>();
        assert_eq!(matched, vec![true, true, false]);
    }

    #[test]
    fn test_detail_predicate_kind_and_container() {
        let graph = sample_graph();
        let settings = IngestSettings::default();
        let state = FilterState {
            selected_kinds: Selection::only([EdgeKind::Relationship]),
            selected_containers: Selection::only(["Date".to_owned()]),
            ..FilterState::default()
        };
        let predicate = DetailPredicate::new(&graph, &state, &settings);

        assert!(predicate.matches(
            "M.Sales.Amount",
            "M.Date.OrderDate",
            EdgeKind::Relationship,
            Some("Sales"),
            Some("Date"),
        ));
        assert!(!predicate.matches(
            "M.Sales.Total",
            "M.Sales.Amount",
            EdgeKind::MeasureDependency,
            Some("Sales"),
            Some("Sales"),
        ));
        assert!(!predicate.matches(
            "M.Sales.Amount",
            "M.Product.Name",
            EdgeKind::Relationship,
            Some("Sales"),
            Some("Product"),
        ));
    }

    #[test]
    fn test_detail_predicate_rejects_denylisted_rows() {
        let graph = sample_graph();
        let state = FilterState::default();
        let settings = IngestSettings::default();
        let predicate = DetailPredicate::new(&graph, &state, &settings);

        assert!(!predicate.matches(
            "M.Sales.Amount",
            "M.LocalDateTable_1.Date",
            EdgeKind::Relationship,
            Some("Sales"),
            Some("LocalDateTable_1"),
        ));
        assert!(!predicate.matches(
            "M.DateTableTemplate_2.Date",
            "M.Date.OrderDate",
            EdgeKind::Relationship,
            Some("DateTableTemplate_2"),
            Some("Date"),
        ));
        assert!(predicate.matches(
            "M.Sales.Amount",
            "M.Date.OrderDate",
            EdgeKind::Relationship,
            Some("Sales"),
            Some("Date"),
        ));
    }

    #[test]
    fn test_selection_accepts() {
        let all: Selection<String> = Selection::All;
        assert!(all.accepts::<str>(None));
        let some = Selection::only(["a".to_owned()]);
        assert!(some.accepts(Some("a")));
        assert!(!some.accepts::<str>(None));
        assert!(!some.contains("b"));
    }
}
