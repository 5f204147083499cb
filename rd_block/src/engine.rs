//! Configuration handed to the compute engine.

use crate::errors::BlockError;
use itertools::Itertools;
use log::{debug, warn};
use rd_types::{BlockArgs, Metric, PlRef};
use serde::Serialize;
use std::collections::HashSet;

/// A distance column the engine will produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultColumn {
    pub name: String,
    pub label: String,
}

impl ResultColumn {
    /// `None` unless both the distance and the intersection are set.
    pub fn for_metric(metric: &Metric) -> Option<Self> {
        let (kind, intersection) = (metric.kind?, metric.intersection?);
        Some(ResultColumn {
            name: metric.column_name()?,
            label: format!("{} ({intersection})", kind.label()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineRequest {
    #[serde(rename = "abundanceRef")]
    pub abundance_ref: PlRef,
    /// Passed through in list order, incomplete entries included.
    pub metrics: Vec<Metric>,
    #[serde(rename = "resultColumns")]
    pub result_columns: Vec<ResultColumn>,
}

/// Build the engine request. Fails only when no abundance column is
/// selected; judging the metrics themselves is left to the engine.
pub fn engine_config(args: &BlockArgs) -> Result<EngineRequest, BlockError> {
    let abundance_ref = args
        .abundance_ref
        .clone()
        .ok_or(BlockError::MissingAbundanceRef)?;

    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    let mut result_columns = Vec::new();
    for (i, metric) in args.metrics.iter().enumerate() {
        match ResultColumn::for_metric(metric) {
            Some(col) => {
                if seen.insert(col.name.clone()) {
                    result_columns.push(col);
                } else {
                    duplicates.push(col.name);
                }
            }
            None => debug!("metric #{i} is incomplete and produces no column"),
        }
    }
    if !duplicates.is_empty() {
        warn!(
            "metrics {} are configured more than once, the engine computes each only once",
            duplicates.iter().unique().join(", ")
        );
    }

    Ok(EngineRequest {
        abundance_ref,
        metrics: args.metrics.clone(),
        result_columns,
    })
}
