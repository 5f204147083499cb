//! Projections of engine results and the result pool into the values the
//! block UI renders. Every projection is a pure function of a [`RenderCtx`]
//! and yields `None` while its inputs are not available.

use rd_types::column::{ABUNDANCE_IS_PRIMARY, ABUNDANCE_NORMALIZED, IS_ABUNDANCE};
use rd_types::{
    BlockArgs, PColumn, PColumnIdAndSpec, PColumnSpec, PlRef, TableState, UiState, ValueType,
};
use serde::Serialize;

/// Engine output holding one distance column per metric, sample by sample.
pub const PF_OUTPUT: &str = "pf";
/// Engine output holding the same distances with each sample pair once.
pub const PF_UNIQUE_OUTPUT: &str = "pfUnique";

/// A column published by some upstream block.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolColumn {
    pub reference: PlRef,
    pub spec: PColumnSpec,
}

/// Columns published by every block of the project.
pub trait ResultPool {
    fn columns(&self) -> Vec<PoolColumn>;
}

/// Named outputs of this block's compute run.
pub trait WorkflowOutputs {
    /// Columns of the output `name`, or `None` while it is not resolved.
    fn resolve_p_columns(&self, name: &str) -> Option<Vec<PColumn>>;

    /// True once the run has either finished or failed.
    fn is_ready_or_error(&self) -> bool;
}

/// Everything an output projection may look at.
#[derive(Clone, Copy)]
pub struct RenderCtx<'a> {
    pub args: &'a BlockArgs,
    pub ui_state: Option<&'a UiState>,
    pub result_pool: Option<&'a dyn ResultPool>,
    pub outputs: Option<&'a dyn WorkflowOutputs>,
}

impl<'a> RenderCtx<'a> {
    pub fn new(args: &'a BlockArgs) -> Self {
        RenderCtx {
            args,
            ui_state: None,
            result_pool: None,
            outputs: None,
        }
    }

    pub fn with_ui_state(mut self, ui_state: &'a UiState) -> Self {
        self.ui_state = Some(ui_state);
        self
    }

    pub fn with_result_pool(mut self, result_pool: &'a dyn ResultPool) -> Self {
        self.result_pool = Some(result_pool);
        self
    }

    pub fn with_outputs(mut self, outputs: &'a dyn WorkflowOutputs) -> Self {
        self.outputs = Some(outputs);
        self
    }

    fn resolve(&self, name: &str) -> Option<Vec<PColumn>> {
        self.outputs?.resolve_p_columns(name)
    }
}

/// Declarative column predicate: the value type must be one of
/// `value_types` and every listed annotation must be present with the given
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnFilter {
    #[serde(rename = "valueTypes")]
    pub value_types: Vec<ValueType>,
    pub annotations: Vec<(&'static str, &'static str)>,
}

impl ColumnFilter {
    /// Primary, non-normalized abundance columns.
    pub fn abundance() -> Self {
        ColumnFilter {
            value_types: ValueType::all()
                .into_iter()
                .filter(ValueType::is_numeric)
                .collect(),
            annotations: vec![
                (IS_ABUNDANCE, "true"),
                (ABUNDANCE_NORMALIZED, "false"),
                (ABUNDANCE_IS_PRIMARY, "true"),
            ],
        }
    }

    pub fn matches(&self, spec: &PColumnSpec) -> bool {
        self.value_types.contains(&spec.value_type)
            && self
                .annotations
                .iter()
                .all(|&(key, value)| spec.annotation(key) == Some(value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbundanceOption {
    #[serde(rename = "ref")]
    pub reference: PlRef,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataTableView {
    pub columns: Vec<PColumn>,
    #[serde(rename = "tableState", skip_serializing_if = "Option::is_none")]
    pub table_state: Option<TableState>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PFrameView {
    pub columns: Vec<PColumn>,
}

/// Pool columns eligible as the abundance input.
pub fn abundance_options(ctx: &RenderCtx<'_>) -> Option<Vec<AbundanceOption>> {
    let filter = ColumnFilter::abundance();
    let options = ctx
        .result_pool?
        .columns()
        .into_iter()
        .filter(|col| filter.matches(&col.spec))
        .map(|col| AbundanceOption {
            label: col.spec.label().to_string(),
            reference: col.reference,
        })
        .collect();
    Some(options)
}

/// Table over the deduplicated distance columns.
pub fn pt(ctx: &RenderCtx<'_>) -> Option<DataTableView> {
    let columns = ctx.resolve(PF_UNIQUE_OUTPUT)?;
    Some(DataTableView {
        columns,
        table_state: ctx.ui_state.and_then(|ui| ui.table_state.clone()),
    })
}

pub fn pf(ctx: &RenderCtx<'_>) -> Option<PFrameView> {
    Some(PFrameView {
        columns: ctx.resolve(PF_OUTPUT)?,
    })
}

/// Columns the heatmap may plot.
pub fn heatmap_p_cols(ctx: &RenderCtx<'_>) -> Option<Vec<PColumnIdAndSpec>> {
    let columns = ctx.resolve(PF_OUTPUT)?;
    Some(columns.iter().map(PColumnIdAndSpec::from).collect())
}

/// A run is in progress while it is neither ready nor failed. Without any
/// run there is nothing in progress.
pub fn is_running(ctx: &RenderCtx<'_>) -> bool {
    ctx.outputs.map_or(false, |o| !o.is_ready_or_error())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rd_types::column::LABEL;
    use rd_types::PColumnId;
    use std::collections::HashMap;

    pub(crate) struct Pool(pub Vec<PoolColumn>);

    impl ResultPool for Pool {
        fn columns(&self) -> Vec<PoolColumn> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    pub(crate) struct Outputs {
        pub resolved: HashMap<&'static str, Vec<PColumn>>,
        pub ready: bool,
    }

    impl WorkflowOutputs for Outputs {
        fn resolve_p_columns(&self, name: &str) -> Option<Vec<PColumn>> {
            self.resolved.get(name).cloned()
        }

        fn is_ready_or_error(&self) -> bool {
            self.ready
        }
    }

    pub(crate) fn abundance_spec(name: &str, value_type: ValueType) -> PColumnSpec {
        PColumnSpec::new(name, value_type)
            .with_annotation(IS_ABUNDANCE, "true")
            .with_annotation(ABUNDANCE_NORMALIZED, "false")
            .with_annotation(ABUNDANCE_IS_PRIMARY, "true")
    }

    pub(crate) fn pool_column(block: &str, spec: PColumnSpec) -> PoolColumn {
        PoolColumn {
            reference: PlRef {
                block_id: block.to_string(),
                name: spec.name.clone(),
            },
            spec,
        }
    }

    pub(crate) fn distance_column(name: &str) -> PColumn {
        PColumn {
            id: PColumnId(format!("col-{name}")),
            spec: PColumnSpec::new(name, ValueType::Double),
        }
    }

    #[test]
    fn test_abundance_filter() {
        let filter = ColumnFilter::abundance();
        assert!(filter.matches(&abundance_spec("readCount", ValueType::Long)));
        assert!(filter.matches(&abundance_spec("umiFraction", ValueType::Double)));
        assert!(!filter.matches(&abundance_spec("clonotypeKey", ValueType::String)));
        let normalized = abundance_spec("readFraction", ValueType::Double)
            .with_annotation(ABUNDANCE_NORMALIZED, "true");
        assert!(!filter.matches(&normalized));
        let mut secondary = abundance_spec("umiCount", ValueType::Int);
        secondary.annotations.remove(ABUNDANCE_IS_PRIMARY);
        assert!(!filter.matches(&secondary));
    }

    #[test]
    fn test_abundance_options() {
        let args = BlockArgs::default();
        assert_eq!(abundance_options(&RenderCtx::new(&args)), None);

        let pool = Pool(vec![
            pool_column(
                "mixcr",
                abundance_spec("readCount", ValueType::Long).with_annotation(LABEL, "Number of reads"),
            ),
            pool_column("mixcr", PColumnSpec::new("cdr3", ValueType::String)),
            pool_column("mixcr", abundance_spec("umiCount", ValueType::Int)),
        ]);
        let options = abundance_options(&RenderCtx::new(&args).with_result_pool(&pool)).unwrap();
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["Number of reads", "umiCount"]);
        assert_eq!(options[1].reference.to_string(), "mixcr/umiCount");
    }

    #[test]
    fn test_frames_wait_for_outputs() {
        let args = BlockArgs::default();
        let ctx = RenderCtx::new(&args);
        assert_eq!(pt(&ctx), None);
        assert_eq!(pf(&ctx), None);
        assert_eq!(heatmap_p_cols(&ctx), None);
        assert!(!is_running(&ctx));

        let outputs = Outputs::default();
        let ctx = ctx.with_outputs(&outputs);
        assert_eq!(pf(&ctx), None);
        assert!(is_running(&ctx));
    }

    #[test]
    fn test_frames_resolved() {
        let args = BlockArgs::default();
        let mut ui = crate::defaults::DefaultsProvider::default().bare_ui_state();
        ui.table_state = Some(TableState(serde_json::json!({"gridState": {}})));
        let outputs = Outputs {
            resolved: HashMap::from([
                (PF_OUTPUT, vec![distance_column("F1_CDR3ntVJ"), distance_column("D_CDR3nt")]),
                (PF_UNIQUE_OUTPUT, vec![distance_column("F1_CDR3ntVJ")]),
            ]),
            ready: true,
        };
        let ctx = RenderCtx::new(&args).with_ui_state(&ui).with_outputs(&outputs);

        let table = pt(&ctx).unwrap();
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.table_state, ui.table_state);

        assert_eq!(pf(&ctx).unwrap().columns.len(), 2);
        let ids: Vec<_> = heatmap_p_cols(&ctx)
            .unwrap()
            .into_iter()
            .map(|c| c.column_id.0)
            .collect();
        assert_eq!(ids, ["col-F1_CDR3ntVJ", "col-D_CDR3nt"]);
        assert!(!is_running(&ctx));
    }
}
