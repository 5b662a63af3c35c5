pub mod bundle;
pub mod config;
pub mod engine;
pub mod error;
pub mod highlight;
pub mod layout;
pub mod model;
pub mod search;
pub mod tree;
pub mod util;

pub use bundle::{BundleCache, BundleCurve};
pub use config::EngineConfig;
pub use engine::{Dataset, EdgeGeometry, Engine, NodeVisual, RelatedNode};
pub use error::{
    ConfigError, Diagnostics, IngestionError, InvalidEdgeError, ParseKindError, StructuralError,
};
pub use highlight::{
    DetailPredicate, DetailRow, EdgeDirection, FilterState, Highlight, HighlightMode,
    OpacityTiers, Selection, evaluate,
};
pub use layout::{LayoutPosition, RadialLayout};
pub use model::{
    Edge, EdgeKind, IngestSettings, Ingestion, ModelGraph, Node, NodeKind, RawRecords,
    RelationshipMeta, ingest, parse_records,
};
pub use search::{SearchHit, search_nodes};
pub use tree::Tree;
