//! Project configuration stored in `benchci.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::query::UnorderedPlacement;

/// Default config file name, relative to the working directory.
pub const CONFIG_FILE: &str = "benchci.toml";

/// Top-level configuration (TOML).
///
/// Missing fields default to the directory layout used by the reports site.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BenchConfig {
    pub output: OutputConfig,
    pub query: QueryConfig,
    /// Named evaluation runs, executed in name order by `benchci evaluate`.
    pub runs: BTreeMap<String, RunConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory holding raw evaluation logs (`*.json`).
    pub logs: PathBuf,
    /// Directory receiving `database.json` and generated pages.
    pub reports: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            logs: PathBuf::from("logs"),
            reports: PathBuf::from("reports"),
        }
    }
}

impl OutputConfig {
    pub fn database_path(&self) -> PathBuf {
        self.reports.join("database.json")
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryConfig {
    /// Placement of rows whose sort value cannot be ordered.
    pub unordered: UnorderedPlacement,
}

/// One evaluation run. Fields are optional so incomplete runs can be
/// reported and skipped instead of failing the whole config.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub model: Option<String>,
    pub limit: Option<u32>,
    pub evals: Option<Vec<String>>,
    pub json: bool,
}

impl BenchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.output.logs.as_os_str().is_empty() {
            return Err(anyhow!("output.logs must be non-empty"));
        }
        if self.output.reports.as_os_str().is_empty() {
            return Err(anyhow!("output.reports must be non-empty"));
        }
        for (name, run) in &self.runs {
            if let Some(evals) = &run.evals
                && evals.iter().any(|eval_name| eval_name.trim().is_empty())
            {
                return Err(anyhow!("runs.{name}.evals entries must be non-empty"));
            }
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BenchConfig::default()`.
pub fn load_config(path: &Path) -> Result<BenchConfig> {
    if !path.exists() {
        let cfg = BenchConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BenchConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
