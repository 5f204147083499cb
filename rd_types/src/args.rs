//! Block arguments and UI state.

use crate::metric::{Metric, MetricUi};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque reference to a column selected elsewhere on the platform.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlRef {
    #[serde(rename = "blockId")]
    pub block_id: String,
    pub name: String,
}

impl fmt::Display for PlRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.block_id, self.name)
    }
}

/// Arguments handed to the compute engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockArgs {
    #[serde(
        rename = "abundanceRef",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub abundance_ref: Option<PlRef>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl BlockArgs {
    /// The engine only runs once an abundance column has been selected. An
    /// empty metric list does not make the arguments invalid.
    pub fn is_valid(&self) -> bool {
        self.abundance_ref.is_some()
    }
}

/// Graph configuration. Only the fields this block sets are typed, everything
/// else belongs to the graphing component and is carried along verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphState {
    pub title: String,
    pub template: String,
    #[serde(rename = "currentTab", default)]
    pub current_tab: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Table configuration, owned by the table component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableState(pub Value);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiState {
    #[serde(rename = "blockTitle")]
    pub block_title: String,
    #[serde(rename = "graphState")]
    pub graph_state: GraphState,
    #[serde(rename = "tableState", default, skip_serializing_if = "Option::is_none")]
    pub table_state: Option<TableState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<MetricUi>>,
}
