use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IngestionError {
    #[error("relationship {relationship_id} has {rows} rows, expected 2")]
    #[serde(rename_all = "camelCase")]
    MalformedRelationship { relationship_id: String, rows: usize },

    #[error("edge endpoint {id} does not resolve to a leaf")]
    UnresolvedEndpoint { id: String },

    #[error("id {id} is already taken by a {kept}, ignoring {ignored}")]
    DuplicateId {
        id: String,
        kept: String,
        ignored: String,
    },

    #[error("record #{index} has an empty {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("record #{index} has unsupported kind {kind:?}")]
    UnsupportedKind { index: usize, kind: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StructuralError {
    #[error("node set has no root")]
    MissingRoot,

    #[error("node set has more than one root: {ids:?}")]
    MultipleRoots { ids: Vec<String> },

    #[error("node {id} references missing parent {parent_id}")]
    #[serde(rename_all = "camelCase")]
    MissingParent { id: String, parent_id: String },

    #[error("cycle detected through node {id}")]
    Cycle { id: String },

    #[error("node id {id} appears more than once")]
    DuplicateId { id: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InvalidEdgeError {
    #[error("edge {source_id} -> {target_id} points at itself")]
    #[serde(rename_all = "camelCase")]
    SelfLoop {
        source_id: String,
        target_id: String,
    },

    #[error("edge {source_id} -> {target_id} has a degenerate path of {points} points")]
    #[serde(rename_all = "camelCase")]
    DegeneratePath {
        source_id: String,
        target_id: String,
        points: usize,
    },

    #[error("edge {source_id} -> {target_id} references a node outside the tree")]
    #[serde(rename_all = "camelCase")]
    UnknownEndpoint {
        source_id: String,
        target_id: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid denylist pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("tension {0} is outside [0, 1]")]
    InvalidTension(f64),

    #[error("radius step {0} must be positive")]
    InvalidRadiusStep(f64),

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown {what} {value:?}")]
pub struct ParseKindError {
    pub what: &'static str,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub ingestion: Vec<IngestionError>,
    pub invalid_edges: Vec<InvalidEdgeError>,
    pub denylisted: usize,
    pub duplicate_edges: usize,
    pub stale: Option<StructuralError>,
}

impl Diagnostics {
    pub fn error_count(&self) -> usize {
        self.ingestion.len() + self.invalid_edges.len() + usize::from(self.stale.is_some())
    }

    pub fn is_clean(&self) -> bool {
        self.error_count() == 0
    }

    pub(crate) fn push_ingestion(&mut self, error: IngestionError) {
        log::warn!("ingestion: {error}");
        self.ingestion.push(error);
    }

    pub(crate) fn push_invalid_edge(&mut self, error: InvalidEdgeError) {
        log::warn!("invalid edge: {error}");
        self.invalid_edges.push(error);
    }
}
