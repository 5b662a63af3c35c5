use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::graph::NodeKind;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRecord {
    pub container: String,
    pub object: String,
    pub kind: String,
    #[serde(default)]
    pub ref_container: Option<String>,
    #[serde(default)]
    pub ref_object: Option<String>,
    #[serde(default)]
    pub ref_kind: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipRecord {
    pub relationship_id: String,
    #[serde(default)]
    pub container: String,
    #[serde(default)]
    pub object: String,
    pub ref_container: String,
    pub ref_object: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub cross_filter_behavior: Option<String>,
    #[serde(default)]
    pub from_cardinality: Option<String>,
    #[serde(default)]
    pub to_cardinality: Option<String>,
}

fn default_active() -> bool {
    true
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecords {
    #[serde(default)]
    pub dependencies: Vec<DependencyRecord>,
    #[serde(default)]
    pub relationships: Vec<RelationshipRecord>,
}

/// How a raw kind string maps onto the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Leaf(NodeKind),
    ContainerLevel,
}

impl ObjectKind {
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['_', ' ', '-'], "");
        let kind = match normalized.as_str() {
            "measure" => Self::Leaf(NodeKind::Measure),
            "calccolumn" | "calculatedcolumn" => Self::Leaf(NodeKind::CalculatedColumn),
            "column" | "datacolumn" => Self::Leaf(NodeKind::Column),
            "partition" => Self::Leaf(NodeKind::Partition),
            "table" | "calctable" | "calculatedtable" | "container" => Self::ContainerLevel,
            _ => return None,
        };
        Some(kind)
    }
}

pub fn parse_records(raw: &str) -> Result<RawRecords> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in record file")?;

    if parsed.is_array() {
        let dependencies = Vec::<DependencyRecord>::deserialize(&parsed)
            .context("invalid dependency record array")?;
        return Ok(RawRecords {
            dependencies,
            relationships: Vec::new(),
        });
    }

    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("unexpected JSON type in record file"))?;
    if !object.contains_key("dependencies") && !object.contains_key("relationships") {
        return Err(anyhow!(
            "record file has neither a dependencies nor a relationships list"
        ));
    }

    RawRecords::deserialize(&parsed).context("invalid record lists in JSON")
}
