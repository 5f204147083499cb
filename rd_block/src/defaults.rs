//! Initial arguments and UI state of a new block instance.

use crate::adapter::to_args;
use crate::ids::{next_unique, IdSource};
use anyhow::Result;
use rd_types::{BlockArgs, DistanceType, GraphState, Metric, MetricUi, UiState};
use serde_json::{json, Map, Value};

/// Built-in metrics of a new block, in display order.
pub const DEFAULT_DISTANCES: [DistanceType; 6] = [
    DistanceType::F1,
    DistanceType::F2,
    DistanceType::D,
    DistanceType::SharedClonotypes,
    DistanceType::Correlation,
    DistanceType::Jaccard,
];

const DEFAULT_GRAPH_TAB: &str = "settings";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultsProvider {
    block_title: String,
    graph_template: String,
}

impl Default for DefaultsProvider {
    fn default() -> Self {
        DefaultsProvider {
            block_title: "Repertoire Distance".to_string(),
            graph_template: "heatmap".to_string(),
        }
    }
}

impl DefaultsProvider {
    /// Title and graph template from `parameters.toml`.
    pub fn from_parameters() -> Result<Self> {
        Ok(DefaultsProvider {
            block_title: rd_parameters::block_title()?.to_string(),
            graph_template: rd_parameters::graph_template()?.to_string(),
        })
    }

    pub fn block_title(&self) -> &str {
        &self.block_title
    }

    pub fn graph_state(&self) -> GraphState {
        let mut extra = Map::new();
        extra.insert(
            "layersSettings".to_string(),
            json!({ "heatmapClustered": { "normalizationDirection": Value::Null } }),
        );
        GraphState {
            title: self.block_title.clone(),
            template: self.graph_template.clone(),
            current_tab: Some(DEFAULT_GRAPH_TAB.to_string()),
            extra,
        }
    }

    /// The six built-in metrics, each with a fresh id, collapsed.
    pub fn metrics(&self, ids: &dyn IdSource) -> Vec<MetricUi> {
        let mut metrics = Vec::with_capacity(DEFAULT_DISTANCES.len());
        for kind in DEFAULT_DISTANCES {
            let id = next_unique(ids, &metrics);
            metrics.push(MetricUi::new(id, Metric::builtin(kind), false));
        }
        metrics
    }

    /// UI state of a freshly created block.
    pub fn ui_state(&self, ids: &dyn IdSource) -> UiState {
        UiState {
            block_title: self.block_title.clone(),
            graph_state: self.graph_state(),
            table_state: None,
            metrics: Some(self.metrics(ids)),
        }
    }

    /// UI state carrying no metric list, used when a stored payload lacks one.
    pub fn bare_ui_state(&self) -> UiState {
        UiState {
            block_title: self.block_title.clone(),
            graph_state: self.graph_state(),
            table_state: None,
            metrics: None,
        }
    }

    /// Arguments and UI state of a freshly created block. No abundance
    /// column is selected yet, so the arguments start out invalid.
    pub fn block(&self, ids: &dyn IdSource) -> (BlockArgs, UiState) {
        let ui_state = self.ui_state(ids);
        let args = BlockArgs {
            abundance_ref: None,
            metrics: to_args(ui_state.metrics.as_deref().unwrap_or_default()),
        };
        (args, ui_state)
    }
}

/// The single metric used to seed an empty argument list.
pub fn seed_metric() -> Metric {
    Metric::builtin(DistanceType::F1)
}
