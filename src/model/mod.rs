mod denylist;
mod graph;
mod ingest;
mod records;

pub use denylist::{DEFAULT_DENYLIST, Denylist};
pub use graph::{Edge, EdgeKind, ModelGraph, Node, NodeKind, RelationshipMeta};
pub use ingest::{IngestSettings, Ingestion, ingest};
pub use records::{DependencyRecord, ObjectKind, RawRecords, RelationshipRecord, parse_records};
