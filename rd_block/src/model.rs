//! The block as seen by the host application: defaults, the validity gate,
//! named outputs, title and navigation.

use crate::defaults::DefaultsProvider;
use crate::ids::IdSource;
use crate::outputs::{self, RenderCtx};
use anyhow::Result;
use log::warn;
use rd_types::{BlockArgs, UiState};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A named output: a pure function of the render context.
pub type OutputFn = for<'a> fn(&RenderCtx<'a>) -> Option<Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: &'static str,
    pub href: &'static str,
}

impl Section {
    const fn link(label: &'static str, href: &'static str) -> Self {
        Section {
            kind: "link",
            label,
            href,
        }
    }
}

static SECTIONS: [Section; 2] = [
    Section::link("Main", "/"),
    Section::link("Distance Graph", "/distanceGraph"),
];

fn to_json<T: Serialize>(name: &str, value: Option<T>) -> Option<Value> {
    match serde_json::to_value(value?) {
        Ok(v) => Some(v),
        Err(err) => {
            warn!("could not render output {name}: {err}");
            None
        }
    }
}

fn render_abundance_options(ctx: &RenderCtx<'_>) -> Option<Value> {
    to_json("abundanceOptions", outputs::abundance_options(ctx))
}

fn render_pt(ctx: &RenderCtx<'_>) -> Option<Value> {
    to_json("pt", outputs::pt(ctx))
}

fn render_pf(ctx: &RenderCtx<'_>) -> Option<Value> {
    to_json("pf", outputs::pf(ctx))
}

fn render_heatmap_p_cols(ctx: &RenderCtx<'_>) -> Option<Value> {
    to_json("heatmapPCols", outputs::heatmap_p_cols(ctx))
}

fn render_is_running(ctx: &RenderCtx<'_>) -> Option<Value> {
    Some(Value::Bool(outputs::is_running(ctx)))
}

pub struct BlockModel {
    defaults: DefaultsProvider,
    outputs: BTreeMap<&'static str, OutputFn>,
}

impl Default for BlockModel {
    fn default() -> Self {
        BlockModel::new(DefaultsProvider::default())
    }
}

impl BlockModel {
    pub fn new(defaults: DefaultsProvider) -> Self {
        let outputs = BTreeMap::from([
            ("abundanceOptions", render_abundance_options as OutputFn),
            ("pt", render_pt as OutputFn),
            ("pf", render_pf as OutputFn),
            ("heatmapPCols", render_heatmap_p_cols as OutputFn),
            ("isRunning", render_is_running as OutputFn),
        ]);
        BlockModel { defaults, outputs }
    }

    pub fn from_parameters() -> Result<Self> {
        Ok(BlockModel::new(DefaultsProvider::from_parameters()?))
    }

    pub fn defaults(&self) -> &DefaultsProvider {
        &self.defaults
    }

    /// Arguments and UI state of a new block instance.
    pub fn initial_state(&self, ids: &dyn IdSource) -> (BlockArgs, UiState) {
        self.defaults.block(ids)
    }

    /// The block may run once an abundance column is selected.
    pub fn args_valid(&self, args: &BlockArgs) -> bool {
        args.is_valid()
    }

    /// Title shown in the project tree.
    pub fn title(&self, ui_state: Option<&UiState>) -> String {
        match ui_state {
            Some(ui) if !ui.block_title.trim().is_empty() => ui.block_title.clone(),
            _ => self.defaults.block_title().to_string(),
        }
    }

    pub fn sections(&self) -> &'static [Section] {
        &SECTIONS
    }

    pub fn output_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.outputs.keys().copied()
    }

    /// Value of the output `name`, or `None` if it is not ready or unknown.
    pub fn render(&self, name: &str, ctx: &RenderCtx<'_>) -> Option<Value> {
        let output = self.outputs.get(name)?;
        output(ctx)
    }

    /// Every output that currently has a value.
    pub fn render_all(&self, ctx: &RenderCtx<'_>) -> BTreeMap<&'static str, Value> {
        self.outputs
            .iter()
            .filter_map(|(&name, output)| Some((name, output(ctx)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::outputs::tests::{abundance_spec, distance_column, pool_column, Outputs, Pool};
    use crate::outputs::PF_OUTPUT;
    use pretty_assertions::assert_eq;
    use rd_types::{Metric, PlRef, ValueType};
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_validity_gate() {
        let model = BlockModel::default();
        let (mut args, _) = model.initial_state(&SequentialIds::default());
        assert_eq!(args.metrics.len(), 6);
        assert!(!model.args_valid(&args));

        args.metrics.clear();
        args.abundance_ref = Some(PlRef {
            block_id: "mixcr".into(),
            name: "readCount".into(),
        });
        assert!(model.args_valid(&args));

        args.metrics.push(Metric::new(None, None, rd_types::Downsampling::none_auto()));
        assert!(model.args_valid(&args));
    }

    #[test]
    fn test_title() {
        let model = BlockModel::default();
        assert_eq!(model.title(None), "Repertoire Distance");
        let (_, mut ui) = model.initial_state(&SequentialIds::default());
        ui.block_title = "  ".to_string();
        assert_eq!(model.title(Some(&ui)), "Repertoire Distance");
        ui.block_title = "TRB distances".to_string();
        assert_eq!(model.title(Some(&ui)), "TRB distances");
    }

    #[test]
    fn test_sections() {
        let sections = serde_json::to_value(BlockModel::default().sections()).unwrap();
        assert_eq!(
            sections,
            json!([
                {"type": "link", "label": "Main", "href": "/"},
                {"type": "link", "label": "Distance Graph", "href": "/distanceGraph"},
            ])
        );
    }

    #[test]
    fn test_render() {
        let model = BlockModel::default();
        let names: Vec<_> = model.output_names().collect();
        assert_eq!(names, ["abundanceOptions", "heatmapPCols", "isRunning", "pf", "pt"]);

        let args = BlockArgs::default();
        let ctx = RenderCtx::new(&args);
        assert_eq!(model.render("nope", &ctx), None);
        assert_eq!(model.render("pf", &ctx), None);
        assert_eq!(
            model.render_all(&ctx),
            BTreeMap::from([("isRunning", json!(false))])
        );

        let pool = Pool(vec![pool_column("mixcr", abundance_spec("readCount", ValueType::Long))]);
        let outputs = Outputs {
            resolved: HashMap::from([(PF_OUTPUT, vec![distance_column("F2_CDR3ntVJ")])]),
            ready: false,
        };
        let ctx = ctx.with_result_pool(&pool).with_outputs(&outputs);
        let rendered = model.render_all(&ctx);
        assert_eq!(
            rendered.keys().copied().collect::<Vec<_>>(),
            ["abundanceOptions", "heatmapPCols", "isRunning", "pf"]
        );
        assert_eq!(rendered["isRunning"], json!(true));
        assert_eq!(
            rendered["abundanceOptions"],
            json!([{"ref": {"blockId": "mixcr", "name": "readCount"}, "label": "readCount"}])
        );
        assert_eq!(
            rendered["heatmapPCols"],
            json!([{
                "columnId": "col-F2_CDR3ntVJ",
                "spec": {"name": "F2_CDR3ntVJ", "valueType": "Double"},
            }])
        );
    }
}
