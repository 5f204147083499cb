//! Upgrade of stored block payloads to the current schema, and the
//! once-per-session seeding of empty argument lists.
//!
//! Payloads written by earlier versions of the block come in five shapes:
//!
//! | version | argument metrics                              | UI metrics               |
//! |---------|-----------------------------------------------|--------------------------|
//! | V1      | `{type, intersection}`                        | none                     |
//! | V2      | `{type, intersection, downsampling}`          | none                     |
//! | V3      | as V2                                         | numeric or missing ids   |
//! | V4      | entries also carry `id` and `isExpanded`      | none or stale            |
//! | V5      | as V2                                         | string ids               |
//!
//! Reading a payload never fails. Values that cannot be understood are
//! logged and treated as unset.

use crate::defaults::{seed_metric, DefaultsProvider};
use crate::ids::{claim_unused, IdSource};
use log::{debug, info, warn};
use rd_types::serde_helpers::{lenient, lenient_variant, NumberOrStr};
use rd_types::{
    BlockArgs, DistanceType, Downsampling, DownsamplingType, GraphState, IntersectionType,
    Metric, MetricId, MetricUi, PlRef, TableState, UiState, ValueChooser,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SchemaVersion {
    #[serde(rename = "v1")]
    V1,
    #[serde(rename = "v2")]
    V2,
    #[serde(rename = "v3")]
    V3,
    #[serde(rename = "v4")]
    V4,
    #[serde(rename = "v5")]
    V5,
}

impl SchemaVersion {
    pub const CURRENT: SchemaVersion = SchemaVersion::V5;

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::V1 => "v1",
            SchemaVersion::V2 => "v2",
            SchemaVersion::V3 => "v3",
            SchemaVersion::V4 => "v4",
            SchemaVersion::V5 => "v5",
        }
    }

    /// Classify a stored `(args, uiState)` pair.
    ///
    /// An empty argument list without UI metrics carries no version
    /// information and is reported as V2.
    pub fn detect(args: &Value, ui_state: Option<&Value>) -> SchemaVersion {
        let args_metrics = metric_objects(args.get("metrics"));
        let ui_metrics = ui_state.and_then(|ui| ui.get("metrics")).filter(|m| m.is_array());

        if args_metrics
            .iter()
            .any(|m| m.contains_key("id") || m.contains_key("isExpanded"))
        {
            SchemaVersion::V4
        } else if let Some(ui_metrics) = ui_metrics {
            let string_ids = metric_objects(Some(ui_metrics))
                .iter()
                .all(|m| matches!(m.get("id"), Some(Value::String(_))));
            if string_ids {
                SchemaVersion::V5
            } else {
                SchemaVersion::V3
            }
        } else if !args_metrics.is_empty()
            && args_metrics
                .iter()
                .any(|m| !m.contains_key("downsampling"))
        {
            SchemaVersion::V1
        } else {
            SchemaVersion::V2
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn metric_objects(metrics: Option<&Value>) -> Vec<&serde_json::Map<String, Value>> {
    match metrics {
        Some(Value::Array(entries)) => entries.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StoredDownsampling {
    #[serde(rename = "type", default, deserialize_with = "lenient_variant")]
    kind: Option<DownsamplingType>,
    #[serde(rename = "valueChooser", default, deserialize_with = "lenient_variant")]
    value_chooser: Option<ValueChooser>,
    #[serde(default)]
    n: Option<Value>,
}

/// Read a stored downsampling depth. Fractional depths are rounded to the
/// nearest whole number of clonotypes; negative or non-numeric ones are
/// dropped.
fn read_depth(value: &Value) -> Option<u64> {
    let depth = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match depth {
        Some(d) if d.is_finite() && d >= 0.0 => {
            let rounded = d.round();
            if rounded != d {
                debug!("rounding downsampling depth {d} to {rounded}");
            }
            Some(rounded as u64)
        }
        _ => {
            warn!("ignoring unusable downsampling depth {value}");
            None
        }
    }
}

impl StoredDownsampling {
    fn into_downsampling(self) -> Downsampling {
        let n = self.n.as_ref().and_then(read_depth);
        Downsampling {
            kind: self.kind.unwrap_or(DownsamplingType::Hypergeometric),
            value_chooser: self.value_chooser.unwrap_or(ValueChooser::Auto),
            n,
        }
    }
}

/// Union of every historical shape of a metric entry.
#[derive(Debug, Clone, Default, Deserialize)]
struct StoredMetric {
    #[serde(rename = "type", default, deserialize_with = "lenient_variant")]
    kind: Option<DistanceType>,
    #[serde(default, deserialize_with = "lenient_variant")]
    intersection: Option<IntersectionType>,
    #[serde(default, deserialize_with = "lenient")]
    downsampling: Option<StoredDownsampling>,
    #[serde(default, deserialize_with = "lenient")]
    id: Option<NumberOrStr>,
    #[serde(rename = "isExpanded", default, deserialize_with = "lenient")]
    is_expanded: Option<bool>,
}

impl StoredMetric {
    fn carries_ui_fields(&self) -> bool {
        self.id.is_some() || self.is_expanded.is_some()
    }

    fn to_metric(&self) -> Metric {
        Metric {
            kind: self.kind,
            intersection: self.intersection,
            downsampling: self
                .downsampling
                .clone()
                .unwrap_or_default()
                .into_downsampling(),
        }
    }

    fn stored_id(&self, prefix: &str) -> Option<MetricId> {
        match &self.id {
            Some(NumberOrStr::Str(s)) if !s.is_empty() => Some(MetricId::from(s.as_str())),
            Some(NumberOrStr::Number(n)) => Some(MetricId::from(format!("{prefix}-{n}"))),
            _ => None,
        }
    }

    fn strip_ui_fields(&mut self) {
        self.id = None;
        self.is_expanded = None;
    }
}

fn read_metrics(what: &str, metrics: Option<&Value>) -> Vec<StoredMetric> {
    let entries = match metrics {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            warn!("{what} metrics are not a list ({other}), treating as empty");
            return Vec::new();
        }
    };
    entries
        .iter()
        .filter_map(|entry| match StoredMetric::deserialize(entry) {
            Ok(metric) => Some(metric),
            Err(err) => {
                warn!("dropping unreadable {what} metric {entry}: {err}");
                None
            }
        })
        .collect()
}

fn read_field<T: serde::de::DeserializeOwned>(value: Option<&Value>, name: &str) -> Option<T> {
    match value.and_then(|v| v.get(name)) {
        None | Some(Value::Null) => None,
        Some(v) => match T::deserialize(v) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!("ignoring unreadable {name} {v}: {err}");
                None
            }
        },
    }
}

/// A stored payload on its way to the current schema.
struct Staged {
    abundance_ref: Option<PlRef>,
    args_metrics: Vec<StoredMetric>,
    block_title: Option<String>,
    graph_state: Option<GraphState>,
    table_state: Option<TableState>,
    ui_metrics: Option<Vec<StoredMetric>>,
}

impl Staged {
    fn read(args: &Value, ui_state: Option<&Value>) -> Staged {
        if !args.is_object() {
            warn!("stored arguments are not an object, treating as empty");
        }
        let ui_metrics = match ui_state.and_then(|ui| ui.get("metrics")) {
            None | Some(Value::Null) => None,
            Some(metrics) => Some(read_metrics("UI", Some(metrics))),
        };
        Staged {
            abundance_ref: read_field(Some(args), "abundanceRef"),
            args_metrics: read_metrics("argument", args.get("metrics")),
            block_title: read_field(ui_state, "blockTitle"),
            graph_state: read_field(ui_state, "graphState"),
            table_state: ui_state
                .and_then(|ui| ui.get("tableState"))
                .filter(|v| !v.is_null())
                .cloned()
                .map(TableState),
            ui_metrics,
        }
    }

    /// V1 -> V2: metrics predating the downsampling setting were always
    /// downsampled hypergeometrically to an automatically chosen depth.
    fn add_downsampling(&mut self) {
        for metric in &mut self.args_metrics {
            if metric.downsampling.is_none() {
                metric.downsampling = Some(StoredDownsampling {
                    kind: Some(DownsamplingType::Hypergeometric),
                    value_chooser: Some(ValueChooser::Auto),
                    n: None,
                });
            }
        }
    }

    /// V2 -> V3: a UI list mirroring the arguments.
    fn add_ui_metrics(&mut self) {
        if self.ui_metrics.is_none() {
            self.ui_metrics = Some(self.args_metrics.clone());
        }
    }

    /// V3 -> V4: numeric UI ids become strings.
    fn stringify_ids(&mut self, prefix: &str) {
        for metric in self.ui_metrics.iter_mut().flatten() {
            if let Some(NumberOrStr::Number(n)) = metric.id {
                metric.id = Some(NumberOrStr::Str(format!("{prefix}-{n}")));
            }
        }
    }

    /// V4 -> V5: ids and expansion flags written into the argument entries
    /// move to the UI list, which those entries replace.
    fn move_ui_fields(&mut self, prefix: &str) {
        if !self.args_metrics.iter().any(StoredMetric::carries_ui_fields) {
            return;
        }
        debug!("moving metric ids out of the stored arguments");
        self.ui_metrics = Some(self.args_metrics.clone());
        self.stringify_ids(prefix);
        for metric in &mut self.args_metrics {
            metric.strip_ui_fields();
        }
    }

    fn finish(self, defaults: &DefaultsProvider, ids: &dyn IdSource) -> (BlockArgs, UiState) {
        let ui_metrics = self.ui_metrics.map(|stored| {
            // Stored ids are claimed before any id is generated; the first
            // occurrence of a stored id keeps it.
            let mut taken = HashSet::new();
            let kept: Vec<Option<MetricId>> = stored
                .iter()
                .map(|entry| match entry.stored_id(ids.prefix()) {
                    Some(id) if taken.insert(id.clone()) => Some(id),
                    Some(id) => {
                        warn!("metric id {id} is used more than once, assigning a new one");
                        None
                    }
                    None => None,
                })
                .collect();
            stored
                .into_iter()
                .zip(kept)
                .map(|(entry, id)| {
                    let id = id.unwrap_or_else(|| claim_unused(ids, &mut taken));
                    MetricUi::new(id, entry.to_metric(), entry.is_expanded.unwrap_or(false))
                })
                .collect::<Vec<_>>()
        });

        let mut ui_state = defaults.bare_ui_state();
        if let Some(title) = self.block_title {
            ui_state.block_title = title;
        }
        if let Some(graph_state) = self.graph_state {
            ui_state.graph_state = graph_state;
        }
        ui_state.table_state = self.table_state;
        ui_state.metrics = ui_metrics;

        let args = BlockArgs {
            abundance_ref: self.abundance_ref,
            metrics: self.args_metrics.iter().map(StoredMetric::to_metric).collect(),
        };
        (args, ui_state)
    }
}

/// Result of [`upgrade`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Upgraded {
    #[serde(rename = "schemaVersion")]
    pub from: SchemaVersion,
    pub args: BlockArgs,
    #[serde(rename = "uiState")]
    pub ui_state: UiState,
}

/// Bring a stored payload of any historical shape to the current schema.
/// The argument and UI lists are not reconciled with each other here; that
/// is [`crate::session::BlockSession::start`]'s job.
pub fn upgrade(
    args: &Value,
    ui_state: Option<&Value>,
    defaults: &DefaultsProvider,
    ids: &dyn IdSource,
) -> Upgraded {
    let from = SchemaVersion::detect(args, ui_state);
    if from < SchemaVersion::CURRENT {
        info!("upgrading stored block from schema {from} to {}", SchemaVersion::CURRENT);
    }
    let mut staged = Staged::read(args, ui_state);
    if from <= SchemaVersion::V1 {
        staged.add_downsampling();
    }
    if from <= SchemaVersion::V2 {
        staged.add_ui_metrics();
    }
    if from <= SchemaVersion::V3 {
        staged.stringify_ids(ids.prefix());
    }
    if from <= SchemaVersion::V4 {
        staged.move_ui_fields(ids.prefix());
    }
    let (args, ui_state) = staged.finish(defaults, ids);
    Upgraded {
        from,
        args,
        ui_state,
    }
}

/// Seeds an empty argument list with one default metric, at most once per
/// session. A non-empty list is never modified.
#[derive(Debug, Default)]
pub struct LegacyMigrator {
    has_run: bool,
}

impl LegacyMigrator {
    pub fn new() -> Self {
        LegacyMigrator::default()
    }

    pub fn has_run(&self) -> bool {
        self.has_run
    }

    /// Returns true if the list was seeded by this call.
    pub fn run(&mut self, args: &mut BlockArgs) -> bool {
        if self.has_run {
            return false;
        }
        self.has_run = true;
        if !args.metrics.is_empty() {
            return false;
        }
        info!("argument list is empty, seeding it with a default metric");
        args.metrics = vec![seed_metric()];
        true
    }
}
