//! rd_block
#![deny(missing_docs)]

use anyhow::{Context, Result};
use docopt::Docopt;
use env_logger::Builder;
use log::{info, LevelFilter};
use rd_block::engine::engine_config;
use rd_block::ids::{IdSource, MetricIdGenerator, SequentialIds};
use rd_block::model::BlockModel;
use rd_block::session::BlockSession;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;

const USAGE: &str = "
Repertoire distance block tools
Usage:
  rd_block defaults [--stable-ids]
  rd_block migrate <args-json> [<ui-json>] [--stable-ids]
  rd_block validate <args-json>
  rd_block engine-config <args-json>
  rd_block --help
Options:
     --stable-ids      Number new metric ids 1, 2, ... instead of by time.
     --help            Show this screen.
";

#[derive(Debug, Deserialize)]
struct Args {
    cmd_defaults: bool,
    cmd_migrate: bool,
    cmd_validate: bool,
    cmd_engine_config: bool,
    arg_args_json: Option<String>,
    arg_ui_json: Option<String>,
    flag_stable_ids: bool,
}

fn init_log() {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                buf.timestamp_seconds(),
                record.level(),
                record.args()
            )
        })
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
}

fn read_json(path: &str) -> Result<Value> {
    let path = Path::new(path);
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn main() -> Result<()> {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());
    init_log();

    let model = BlockModel::from_parameters()?;
    let ids: Box<dyn IdSource> = if args.flag_stable_ids {
        Box::new(SequentialIds::new(rd_parameters::metric_id_prefix()?))
    } else {
        Box::new(MetricIdGenerator::from_parameters()?)
    };
    let stored_args = match &args.arg_args_json {
        Some(path) => read_json(path)?,
        None => Value::Null,
    };

    if args.cmd_defaults {
        let (block_args, ui_state) = model.initial_state(ids.as_ref());
        print_json(&json!({
            "args": block_args,
            "uiState": ui_state,
            "title": model.title(Some(&ui_state)),
            "sections": model.sections(),
        }))?;
    } else if args.cmd_migrate {
        let stored_ui = args.arg_ui_json.as_deref().map(read_json).transpose()?;
        let (mut session, from) =
            BlockSession::open(&stored_args, stored_ui.as_ref(), model.defaults(), ids.as_ref());
        session.start();
        info!("read schema {from}, {} metrics", session.metrics().len());
        let (block_args, ui_state) = session.into_parts();
        print_json(&json!({
            "schemaVersion": from,
            "args": block_args,
            "uiState": ui_state,
        }))?;
    } else if args.cmd_validate || args.cmd_engine_config {
        let (session, _) =
            BlockSession::open(&stored_args, None, model.defaults(), ids.as_ref());
        let (block_args, _) = session.into_parts();
        let request = engine_config(&block_args)?;
        if args.cmd_validate {
            info!(
                "arguments are valid: {} metrics, {} result columns",
                request.metrics.len(),
                request.result_columns.len()
            );
        } else {
            print_json(&request)?;
        }
    } else {
        unimplemented!()
    }
    Ok(())
}
