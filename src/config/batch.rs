use crate::metrics::{FocusMetric, MetricParams};
use crate::stats::Normalization;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything a batch run needs; passed explicitly to the driver.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Folder scanned (non-recursively) for input planes.
    pub input_dir: PathBuf,
    /// Substring a file name must contain to be picked up, e.g. `".tif"`.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Metrics to compute, in column order.
    #[serde(default = "default_metrics")]
    pub metrics: Vec<FocusMetric>,
    #[serde(default)]
    pub metric_params: MetricParams,
    /// Normalization applied before scoring; statistics use raw values.
    #[serde(default)]
    pub normalize: Option<Normalization>,
    #[serde(default)]
    pub output: OutputConfig,
}

impl BatchConfig {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            extension: default_extension(),
            metrics: default_metrics(),
            metric_params: MetricParams::default(),
            normalize: None,
            output: OutputConfig::default(),
        }
    }

    /// Directory the table and report are written to.
    pub fn output_dir(&self) -> &Path {
        self.output.dir.as_deref().unwrap_or(self.input_dir.as_path())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Defaults to the input folder.
    pub dir: Option<PathBuf>,
    /// Table name is `<prefix>_<YYYYmmdd_HHMMSS>.csv`.
    pub table_prefix: String,
    /// Also write the full report as pretty JSON next to the table.
    pub json_report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            table_prefix: "focus_metrics".to_string(),
            json_report: false,
        }
    }
}

fn default_extension() -> String {
    ".tif".to_string()
}

fn default_metrics() -> Vec<FocusMetric> {
    FocusMetric::ALL.to_vec()
}

pub fn load_config(path: &Path) -> Result<BatchConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
