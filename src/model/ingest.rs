use std::collections::{HashMap, HashSet};

use crate::error::{Diagnostics, IngestionError, InvalidEdgeError};
use crate::util::{container_id, leaf_id};

use super::denylist::Denylist;
use super::graph::{Edge, EdgeKind, ModelGraph, Node, NodeKind, RelationshipMeta};
use super::records::{DependencyRecord, ObjectKind, RawRecords, RelationshipRecord};

#[derive(Clone, Debug)]
pub struct IngestSettings {
    pub root_name: String,
    pub delimiter: String,
    pub denylist: Denylist,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            root_name: "Model".to_owned(),
            delimiter: ".".to_owned(),
            denylist: Denylist::builtin(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Ingestion {
    pub graph: ModelGraph,
    pub diagnostics: Diagnostics,
}

struct NodeSetBuilder<'a> {
    settings: &'a IngestSettings,
    nodes: Vec<Node>,
    index_by_id: HashMap<String, usize>,
}

impl<'a> NodeSetBuilder<'a> {
    fn new(settings: &'a IngestSettings) -> Self {
        let root = Node {
            id: settings.root_name.clone(),
            name: settings.root_name.clone(),
            parent_id: None,
            kind: NodeKind::Root,
            container: None,
        };
        let mut index_by_id = HashMap::new();
        index_by_id.insert(root.id.clone(), 0);

        Self {
            settings,
            nodes: vec![root],
            index_by_id,
        }
    }

    fn root_id(&self) -> &str {
        &self.nodes[0].id
    }

    fn add_container(&mut self, name: &str, diagnostics: &mut Diagnostics) -> Option<String> {
        let id = container_id(self.root_id(), &self.settings.delimiter, name);

        if let Some(&index) = self.index_by_id.get(&id) {
            let existing = &self.nodes[index];
            if existing.kind == NodeKind::Container {
                return Some(id);
            }
            diagnostics.push_ingestion(IngestionError::DuplicateId {
                id,
                kept: existing.kind.label().to_owned(),
                ignored: NodeKind::Container.label().to_owned(),
            });
            return None;
        }

        let root_id = self.root_id().to_owned();
        self.insert(Node {
            id: id.clone(),
            name: name.to_owned(),
            parent_id: Some(root_id),
            kind: NodeKind::Container,
            container: None,
        });
        Some(id)
    }

    /// `kind: None` accepts whatever leaf already owns the id, and falls back to a column.
    fn add_leaf(
        &mut self,
        container: &str,
        object: &str,
        kind: Option<NodeKind>,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        let parent_id = self.add_container(container, diagnostics)?;
        let id = leaf_id(self.root_id(), &self.settings.delimiter, container, object);

        if let Some(&index) = self.index_by_id.get(&id) {
            let existing = &self.nodes[index];
            if !existing.kind.is_leaf_kind() {
                diagnostics.push_ingestion(IngestionError::DuplicateId {
                    id,
                    kept: existing.kind.label().to_owned(),
                    ignored: kind.unwrap_or(NodeKind::Column).label().to_owned(),
                });
                return None;
            }
            if let Some(kind) = kind
                && kind != existing.kind
            {
                diagnostics.push_ingestion(IngestionError::DuplicateId {
                    id: id.clone(),
                    kept: existing.kind.label().to_owned(),
                    ignored: kind.label().to_owned(),
                });
            }
            return Some(id);
        }

        self.insert(Node {
            id: id.clone(),
            name: object.to_owned(),
            parent_id: Some(parent_id),
            kind: kind.unwrap_or(NodeKind::Column),
            container: Some(container.to_owned()),
        });
        Some(id)
    }

    fn insert(&mut self, node: Node) {
        self.index_by_id.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    fn is_leaf(&self, id: &str) -> bool {
        self.index_by_id
            .get(id)
            .is_some_and(|&index| self.nodes[index].kind.is_leaf_kind())
    }
}

struct EdgeSet {
    edges: Vec<Edge>,
    seen: HashSet<(String, String, EdgeKind)>,
}

impl EdgeSet {
    fn new() -> Self {
        Self {
            edges: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn push(&mut self, edge: Edge, diagnostics: &mut Diagnostics) {
        if edge.source_id == edge.target_id {
            diagnostics.push_invalid_edge(InvalidEdgeError::SelfLoop {
                source_id: edge.source_id,
                target_id: edge.target_id,
            });
            return;
        }

        let key = (edge.source_id.clone(), edge.target_id.clone(), edge.kind);
        if self.seen.insert(key) {
            self.edges.push(edge);
        } else {
            diagnostics.duplicate_edges += 1;
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn ingest(records: &RawRecords, settings: &IngestSettings) -> Ingestion {
    let mut diagnostics = Diagnostics::default();
    let mut nodes = NodeSetBuilder::new(settings);
    let mut edges = EdgeSet::new();

    for (index, record) in records.dependencies.iter().enumerate() {
        ingest_dependency(index, record, settings, &mut nodes, &mut edges, &mut diagnostics);
    }

    ingest_relationships(
        &records.relationships,
        settings,
        &mut nodes,
        &mut edges,
        &mut diagnostics,
    );

    let mut resolved = Vec::with_capacity(edges.edges.len());
    for edge in edges.edges {
        let unresolved = [&edge.source_id, &edge.target_id]
            .into_iter()
            .find(|id| !nodes.is_leaf(id))
            .cloned();
        match unresolved {
            Some(id) => diagnostics.push_ingestion(IngestionError::UnresolvedEndpoint { id }),
            None => resolved.push(edge),
        }
    }

    let root_id = nodes.root_id().to_owned();
    let graph = ModelGraph::new(root_id, nodes.nodes, resolved);

    log::info!(
        "Ingested {} nodes ({} containers), {} edges, {} diagnostics, {} denylisted records",
        graph.node_count(),
        graph.containers().count(),
        graph.edge_count(),
        diagnostics.error_count(),
        diagnostics.denylisted
    );

    Ingestion { graph, diagnostics }
}

fn ingest_dependency(
    index: usize,
    record: &DependencyRecord,
    settings: &IngestSettings,
    nodes: &mut NodeSetBuilder<'_>,
    edges: &mut EdgeSet,
    diagnostics: &mut Diagnostics,
) {
    let Some(container) = non_empty(Some(record.container.as_str())) else {
        diagnostics.push_ingestion(IngestionError::MissingField {
            index,
            field: "container",
        });
        return;
    };
    let Some(object) = non_empty(Some(record.object.as_str())) else {
        diagnostics.push_ingestion(IngestionError::MissingField {
            index,
            field: "object",
        });
        return;
    };
    let Some(subject_kind) = ObjectKind::parse(&record.kind) else {
        diagnostics.push_ingestion(IngestionError::UnsupportedKind {
            index,
            kind: record.kind.clone(),
        });
        return;
    };

    let ref_container = non_empty(record.ref_container.as_deref());
    let ref_object = non_empty(record.ref_object.as_deref());
    let reference = match (ref_container, ref_object) {
        (None, None) => None,
        (Some(ref_container), None) => Some((ref_container, None)),
        (None, Some(_)) => {
            diagnostics.push_ingestion(IngestionError::MissingField {
                index,
                field: "refContainer",
            });
            return;
        }
        (Some(ref_container), Some(ref_object)) => {
            let ref_kind = match non_empty(record.ref_kind.as_deref()) {
                None => None,
                Some(raw) => match ObjectKind::parse(raw) {
                    Some(kind) => Some(kind),
                    None => {
                        diagnostics.push_ingestion(IngestionError::UnsupportedKind {
                            index,
                            kind: raw.to_owned(),
                        });
                        return;
                    }
                },
            };
            Some((ref_container, Some((ref_object, ref_kind))))
        }
    };

    let mut names = vec![container, object];
    if let Some((ref_container, ref_object)) = reference {
        names.push(ref_container);
        if let Some((ref_object, _)) = ref_object {
            names.push(ref_object);
        }
    }
    if settings.denylist.denies_any(names) {
        diagnostics.denylisted += 1;
        return;
    }

    let subject_id = match subject_kind {
        ObjectKind::Leaf(kind) => nodes.add_leaf(container, object, Some(kind), diagnostics),
        ObjectKind::ContainerLevel => {
            nodes.add_container(container, diagnostics);
            None
        }
    };

    let referenced_id = match reference {
        None => None,
        Some((ref_container, None)) => {
            nodes.add_container(ref_container, diagnostics);
            None
        }
        Some((ref_container, Some((ref_object, ref_kind)))) => match ref_kind {
            Some(ObjectKind::ContainerLevel) => {
                nodes.add_container(ref_container, diagnostics);
                None
            }
            Some(ObjectKind::Leaf(kind)) => {
                nodes.add_leaf(ref_container, ref_object, Some(kind), diagnostics)
            }
            None => nodes.add_leaf(ref_container, ref_object, None, diagnostics),
        },
    };

    let edge_kind = match subject_kind {
        ObjectKind::Leaf(NodeKind::Measure) => EdgeKind::MeasureDependency,
        ObjectKind::Leaf(NodeKind::CalculatedColumn) => EdgeKind::CalculatedColumnDependency,
        _ => return,
    };

    if let (Some(source_id), Some(target_id)) = (subject_id, referenced_id) {
        edges.push(
            Edge {
                source_id,
                target_id,
                kind: edge_kind,
                relationship: None,
            },
            diagnostics,
        );
    }
}

fn ingest_relationships(
    records: &[RelationshipRecord],
    settings: &IngestSettings,
    nodes: &mut NodeSetBuilder<'_>,
    edges: &mut EdgeSet,
    diagnostics: &mut Diagnostics,
) {
    let mut groups: Vec<(&str, Vec<(usize, &RelationshipRecord)>)> = Vec::new();
    let mut group_by_id: HashMap<&str, usize> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let Some(relationship_id) = non_empty(Some(record.relationship_id.as_str())) else {
            diagnostics.push_ingestion(IngestionError::MissingField {
                index,
                field: "relationshipId",
            });
            continue;
        };

        let group = *group_by_id.entry(relationship_id).or_insert_with(|| {
            groups.push((relationship_id, Vec::new()));
            groups.len() - 1
        });
        groups[group].1.push((index, record));
    }

    for (relationship_id, rows) in groups {
        let denied = rows.iter().any(|(_, row)| {
            settings.denylist.denies_any([
                row.container.as_str(),
                row.object.as_str(),
                row.ref_container.as_str(),
                row.ref_object.as_str(),
            ])
        });
        if denied {
            diagnostics.denylisted += rows.len();
            continue;
        }

        let [(from_index, from), (to_index, to)] = rows.as_slice() else {
            diagnostics.push_ingestion(IngestionError::MalformedRelationship {
                relationship_id: relationship_id.to_owned(),
                rows: rows.len(),
            });
            continue;
        };

        // Both rows must be complete before either endpoint enters the node set.
        let (Some(from_ref), Some(to_ref)) = (
            relationship_endpoint(*from_index, from, diagnostics),
            relationship_endpoint(*to_index, to, diagnostics),
        ) else {
            continue;
        };

        let source_id = nodes.add_leaf(from_ref.0, from_ref.1, None, diagnostics);
        let target_id = nodes.add_leaf(to_ref.0, to_ref.1, None, diagnostics);
        let (Some(source_id), Some(target_id)) = (source_id, target_id) else {
            continue;
        };

        let meta = RelationshipMeta {
            relationship_id: relationship_id.to_owned(),
            is_active: from.is_active && to.is_active,
            cross_filter_behavior: from
                .cross_filter_behavior
                .clone()
                .or_else(|| to.cross_filter_behavior.clone()),
            from_cardinality: from
                .from_cardinality
                .clone()
                .or_else(|| to.from_cardinality.clone()),
            to_cardinality: from
                .to_cardinality
                .clone()
                .or_else(|| to.to_cardinality.clone()),
        };

        edges.push(
            Edge {
                source_id,
                target_id,
                kind: EdgeKind::Relationship,
                relationship: Some(meta),
            },
            diagnostics,
        );
    }
}

fn relationship_endpoint<'r>(
    index: usize,
    row: &'r RelationshipRecord,
    diagnostics: &mut Diagnostics,
) -> Option<(&'r str, &'r str)> {
    let Some(ref_container) = non_empty(Some(row.ref_container.as_str())) else {
        diagnostics.push_ingestion(IngestionError::MissingField {
            index,
            field: "refContainer",
        });
        return None;
    };
    let Some(ref_object) = non_empty(Some(row.ref_object.as_str())) else {
        diagnostics.push_ingestion(IngestionError::MissingField {
            index,
            field: "refObject",
        });
        return None;
    };
    Some((ref_container, ref_object))
}
