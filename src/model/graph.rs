use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseKindError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Root,
    Container,
    Measure,
    CalculatedColumn,
    Column,
    Partition,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Container => "container",
            Self::Measure => "measure",
            Self::CalculatedColumn => "calculatedColumn",
            Self::Column => "column",
            Self::Partition => "partition",
        }
    }

    pub fn is_leaf_kind(self) -> bool {
        !matches!(self, Self::Root | Self::Container)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    Relationship,
    MeasureDependency,
    CalculatedColumnDependency,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 3] = [
        Self::Relationship,
        Self::MeasureDependency,
        Self::CalculatedColumnDependency,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Relationship => "relationship",
            Self::MeasureDependency => "measureDependency",
            Self::CalculatedColumnDependency => "calculatedColumnDependency",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EdgeKind {
    type Err = ParseKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ParseKindError {
                what: "edge kind",
                value: value.to_owned(),
            })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub kind: NodeKind,
    /// Display name of the owning container, set on leaves only.
    pub container: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipMeta {
    pub relationship_id: String,
    pub is_active: bool,
    pub cross_filter_behavior: Option<String>,
    pub from_cardinality: Option<String>,
    pub to_cardinality: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<RelationshipMeta>,
}

impl Edge {
    pub fn touches(&self, id: &str) -> bool {
        self.source_id == id || self.target_id == id
    }
}

#[derive(Clone, Debug, Default)]
pub struct ModelGraph {
    pub root_id: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    index_by_id: HashMap<String, usize>,
}

impl ModelGraph {
    pub fn new(root_id: impl Into<String>, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            index_by_id.entry(node.id.clone()).or_insert(index);
        }

        Self {
            root_id: root_id.into(),
            nodes,
            edges,
            index_by_id,
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.kind.is_leaf_kind())
    }

    pub fn containers(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .iter()
            .filter(|node| node.kind == NodeKind::Container)
    }

    pub fn kind_counts(&self) -> BTreeMap<EdgeKind, usize> {
        let mut counts = BTreeMap::new();
        for edge in &self.edges {
            *counts.entry(edge.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn container_of(&self, id: &str) -> Option<&str> {
        self.node(id).and_then(|node| node.container.as_deref())
    }
}
