//! rd_parameters
//!
//! Tunable block parameters, read from `parameters.toml` next to the running
//! executable when present.
// Warning groups (as of rust 1.55)
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]

use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

const PARAMETERS_FILE: &str = "parameters.toml";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
struct Parameters {
    /// Title of a newly created block, also used when the UI state has none.
    block_title: String,
    /// Graph template requested by the default graph state.
    graph_template: String,
    /// Prefix of generated metric identifiers.
    metric_id_prefix: String,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            block_title: "Repertoire Distance".to_string(),
            graph_template: "heatmap".to_string(),
            metric_id_prefix: "metric".to_string(),
        }
    }
}

static PARAMETERS: OnceLock<Result<Parameters>> = OnceLock::new();

fn load_parameters(path: &Path) -> Result<Parameters> {
    let s = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
    toml::from_str(&s).with_context(|| path.display().to_string())
}

/// Return a reference to the global parameters.
/// The parameters may need to be loaded; if loading fails, return Err.
fn parameters() -> &'static Result<Parameters> {
    PARAMETERS.get_or_init(|| {
        let path = std::env::current_exe()
            .context("Unable to locate the running executable")?
            .with_file_name(PARAMETERS_FILE);
        parameters_at(&path)
    })
}

/// Load `path`, or fall back to the defaults if there is no such file.
fn parameters_at(path: &Path) -> Result<Parameters> {
    if path.exists() {
        load_parameters(path)
    } else {
        warn!(
            "could not find {PARAMETERS_FILE} at {}, falling back to defaults",
            path.display()
        );
        Ok(Parameters::default())
    }
}

macro_rules! parameter_getter {
    ($a:ident, $t:ty) => {
        pub fn $a() -> Result<&'static $t> {
            let val: &'static $t = match parameters() {
                Err(e) => return Err(anyhow::anyhow!("{e:#}")),
                Ok(p) => &p.$a,
            };
            if Parameters::default().$a != *val {
                warn!("using non-default {} = {:?}", stringify!($a), val);
            }
            Ok(val)
        }
    };
}

parameter_getter!(block_title, str);
parameter_getter!(graph_template, str);
parameter_getter!(metric_id_prefix, str);

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        // No parameters.toml is installed next to the test binary.
        assert_eq!(block_title().unwrap(), "Repertoire Distance");
        assert_eq!(graph_template().unwrap(), "heatmap");
        assert_eq!(metric_id_prefix().unwrap(), "metric");
    }

    #[test]
    fn test_partial_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "block_title = \"Clonotype overlap\"")?;
        let params = load_parameters(file.path())?;
        assert_eq!(params.block_title, "Clonotype overlap");
        assert_eq!(params.graph_template, "heatmap");
        Ok(())
    }

    #[test]
    fn test_missing_file_falls_back() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let params = parameters_at(&dir.path().join(PARAMETERS_FILE))?;
        assert_eq!(params, Parameters::default());

        let path = dir.path().join(PARAMETERS_FILE);
        std::fs::write(&path, "metric_id_prefix = \"distance\"\n")?;
        assert_eq!(parameters_at(&path)?.metric_id_prefix, "distance");
        Ok(())
    }

    #[test]
    fn test_unknown_key() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "heatmap = true")?;
        let err = load_parameters(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("unknown field"));
        Ok(())
    }
}
