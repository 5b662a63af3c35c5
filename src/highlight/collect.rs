use std::collections::HashSet;

use crate::model::ModelGraph;

use super::EdgeDirection;

pub(super) struct HoverNeighbourhood {
    pub(super) nodes: HashSet<usize>,
    pub(super) edges: Vec<EdgeDirection>,
}

/// `None` when the hovered id is not part of the current graph.
pub(super) fn collect_hover_neighbourhood(
    graph: &ModelGraph,
    hovered_id: &str,
) -> Option<HoverNeighbourhood> {
    let hovered = graph.index_of(hovered_id)?;

    let mut nodes = HashSet::from([hovered]);
    let mut edges = Vec::with_capacity(graph.edges.len());

    for edge in &graph.edges {
        let direction = if !edge.touches(hovered_id) {
            EdgeDirection::None
        } else if edge.target_id == hovered_id {
            EdgeDirection::Inbound
        } else {
            EdgeDirection::Outbound
        };

        let neighbour = match direction {
            EdgeDirection::Inbound => Some(edge.source_id.as_str()),
            EdgeDirection::Outbound => Some(edge.target_id.as_str()),
            EdgeDirection::None => None,
        };
        if let Some(index) = neighbour.and_then(|id| graph.index_of(id)) {
            nodes.insert(index);
        }

        edges.push(direction);
    }

    Some(HoverNeighbourhood { nodes, edges })
}
