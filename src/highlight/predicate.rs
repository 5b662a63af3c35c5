use serde::Serialize;

use crate::model::{Edge, EdgeKind, IngestSettings, ModelGraph, RelationshipMeta};
use crate::util::short_name;

use super::FilterState;

/// A row of the external detail table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRow {
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
    pub source_container: Option<String>,
    pub target_container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationshipMeta>,
}

impl DetailRow {
    pub fn from_edge(graph: &ModelGraph, edge: &Edge) -> Self {
        Self {
            source_id: edge.source_id.clone(),
            target_id: edge.target_id.clone(),
            kind: edge.kind,
            source_container: graph.container_of(&edge.source_id).map(str::to_owned),
            target_container: graph.container_of(&edge.target_id).map(str::to_owned),
            relationship: edge.relationship.clone(),
        }
    }
}

/// Hover never reaches this predicate; only categories and the focused node do.
/// Rows touching denylisted containers or objects never match.
#[derive(Clone, Copy)]
pub struct DetailPredicate<'a> {
    graph: &'a ModelGraph,
    state: &'a FilterState,
    settings: &'a IngestSettings,
}

impl<'a> DetailPredicate<'a> {
    pub fn new(
        graph: &'a ModelGraph,
        state: &'a FilterState,
        settings: &'a IngestSettings,
    ) -> Self {
        Self {
            graph,
            state,
            settings,
        }
    }

    /// Rows from outside the current graph fall back to the last id segment.
    fn object_name<'s>(&'s self, id: &'s str) -> &'s str {
        match self.graph.node(id) {
            Some(node) => &node.name,
            None => short_name(id, &self.settings.delimiter),
        }
    }

    pub fn matches(
        &self,
        source_id: &str,
        target_id: &str,
        kind: EdgeKind,
        source_container: Option<&str>,
        target_container: Option<&str>,
    ) -> bool {
        if !self.state.selected_kinds.contains(&kind) {
            return false;
        }

        let source_object = self.object_name(source_id);
        let target_object = self.object_name(target_id);
        let names = [source_container, target_container]
            .into_iter()
            .flatten()
            .chain([source_object, target_object]);
        if self.settings.denylist.denies_any(names) {
            return false;
        }

        if !self.state.endpoint_matches(source_container, Some(source_object))
            && !self.state.endpoint_matches(target_container, Some(target_object))
        {
            return false;
        }

        match self.state.focused_node_id.as_deref() {
            Some(focused) => source_id == focused || target_id == focused,
            None => true,
        }
    }

    pub fn matches_row(&self, row: &DetailRow) -> bool {
        self.matches(
            &row.source_id,
            &row.target_id,
            row.kind,
            row.source_container.as_deref(),
            row.target_container.as_deref(),
        )
    }
}
