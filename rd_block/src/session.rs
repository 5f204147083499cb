//! One editing session of a block instance.

use crate::adapter::{to_args, to_ui};
use crate::defaults::DefaultsProvider;
use crate::editor::MetricListEditor;
use crate::errors::BlockError;
use crate::ids::IdSource;
use crate::migrate::{upgrade, LegacyMigrator, SchemaVersion};
use log::{debug, info};
use rd_types::{
    BlockArgs, DistanceType, Downsampling, IntersectionType, MetricId, MetricUi, PlRef, UiState,
};
use serde_json::Value;

/// Holds the arguments and UI state of a block while it is being edited.
///
/// The UI metric list is authoritative. After [`BlockSession::start`] and
/// after every edit, the argument list equals `to_args` of the UI list.
pub struct BlockSession<I: IdSource> {
    args: BlockArgs,
    ui_state: UiState,
    ids: I,
    migrator: LegacyMigrator,
}

impl<I: IdSource> BlockSession<I> {
    pub fn new(args: BlockArgs, ui_state: UiState, ids: I) -> Self {
        BlockSession {
            args,
            ui_state,
            ids,
            migrator: LegacyMigrator::new(),
        }
    }

    /// Open a session on a stored payload of any schema version.
    pub fn open(
        args: &Value,
        ui_state: Option<&Value>,
        defaults: &DefaultsProvider,
        ids: I,
    ) -> (Self, SchemaVersion) {
        let upgraded = upgrade(args, ui_state, defaults, &ids);
        (
            BlockSession::new(upgraded.args, upgraded.ui_state, ids),
            upgraded.from,
        )
    }

    /// Reconcile the two metric lists. Only the first call has an effect.
    ///
    /// A non-empty UI list overwrites the arguments. An empty argument list
    /// is then seeded with a single metric, and a missing or empty UI list
    /// is rebuilt from the arguments.
    pub fn start(&mut self) {
        if self.migrator.has_run() {
            return;
        }
        if let Some(metrics) = self.ui_state.metrics.as_deref().filter(|m| !m.is_empty()) {
            self.args.metrics = to_args(metrics);
        }
        self.migrator.run(&mut self.args);
        if self.ui_state.metrics.as_ref().map_or(true, Vec::is_empty) {
            info!(
                "rebuilding UI metric list from {} argument metrics",
                self.args.metrics.len()
            );
            self.ui_state.metrics = Some(to_ui(&self.args.metrics, &self.ids));
        }
    }

    pub fn is_started(&self) -> bool {
        self.migrator.has_run()
    }

    pub fn args(&self) -> &BlockArgs {
        &self.args
    }

    pub fn ui_state(&self) -> &UiState {
        &self.ui_state
    }

    pub fn metrics(&self) -> &[MetricUi] {
        self.ui_state.metrics.as_deref().unwrap_or_default()
    }

    pub fn into_parts(self) -> (BlockArgs, UiState) {
        (self.args, self.ui_state)
    }

    /// Run `f` against the UI metric list and commit the result to the
    /// arguments, whether or not `f` succeeded.
    pub fn edit<T>(
        &mut self,
        f: impl FnOnce(&mut MetricListEditor<'_>) -> Result<T, BlockError>,
    ) -> Result<T, BlockError> {
        let metrics = self.ui_state.metrics.get_or_insert_with(Vec::new);
        let result = f(&mut MetricListEditor::new(metrics, &self.ids));
        self.commit();
        result
    }

    pub fn add_metric(&mut self) -> MetricId {
        let metrics = self.ui_state.metrics.get_or_insert_with(Vec::new);
        let id = MetricListEditor::new(metrics, &self.ids).add_metric();
        self.commit();
        id
    }

    pub fn remove_metric(&mut self, id: &MetricId) -> Result<MetricUi, BlockError> {
        self.edit(|editor| editor.remove_metric(id))
    }

    pub fn set_type(&mut self, id: &MetricId, kind: Option<DistanceType>) -> Result<(), BlockError> {
        self.edit(|editor| editor.set_type(id, kind))
    }

    pub fn set_intersection(
        &mut self,
        id: &MetricId,
        intersection: Option<IntersectionType>,
    ) -> Result<(), BlockError> {
        self.edit(|editor| editor.set_intersection(id, intersection))
    }

    pub fn set_downsampling(
        &mut self,
        id: &MetricId,
        downsampling: Downsampling,
    ) -> Result<(), BlockError> {
        self.edit(|editor| editor.set_downsampling(id, downsampling))
    }

    pub fn set_expanded(&mut self, id: &MetricId, is_expanded: bool) -> Result<(), BlockError> {
        self.edit(|editor| editor.set_expanded(id, is_expanded))
    }

    pub fn set_abundance_ref(&mut self, abundance_ref: Option<PlRef>) {
        debug!(
            "abundance column set to {}",
            abundance_ref
                .as_ref()
                .map_or_else(|| "nothing".to_string(), ToString::to_string)
        );
        self.args.abundance_ref = abundance_ref;
    }

    /// Rename the block. The graph shares the block title.
    pub fn set_block_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        self.ui_state.graph_state.title = title.clone();
        self.ui_state.block_title = title;
    }

    fn commit(&mut self) {
        if let Some(metrics) = &self.ui_state.metrics {
            self.args.metrics = to_args(metrics);
        }
    }
}
