//! Batch driver: score every plane in a folder and tabulate the results.
//!
//! Flow
//! - `list_inputs` picks the files of `input_dir` whose name contains the
//!   configured extension (hidden files skipped, sorted by name).
//! - Each file is decoded to a 16-bit grayscale plane, summarized with
//!   [`IntensityStats`] and scored with the configured metrics. With the
//!   `parallel` feature files are processed on the rayon pool.
//! - A file that fails to decode or is too small for a metric becomes a
//!   [`BatchFailure`]; the remaining rows are unaffected.
//! - `write_outputs` writes one CSV row per scored plane and, optionally,
//!   the whole [`BatchReport`] as JSON.
use crate::config::BatchConfig;
use crate::image::io::{load_grayscale_u16, write_json_file, write_text_file, IoError};
use crate::image::{ImageView, Sample};
use crate::metrics::{FocusMetric, MetricError, MetricParams, MetricScores};
use crate::stats::{IntensityStats, Normalization, StatsError};
use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Columns preceding the metric scores in the CSV table.
pub const STATS_COLUMNS: [&str; 7] = ["name", "max", "min", "mean", "var", "norm_var", "kurtosis"];

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to list {}: {source}", .path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no metrics selected")]
    NoMetrics,
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Why a single plane could not be scored.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Metric(#[from] MetricError),
}

/// One scored plane.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub stats: IntensityStats,
    pub scores: MetricScores,
    pub elapsed_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub name: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub metrics: Vec<FocusMetric>,
    pub records: Vec<ImageRecord>,
    pub failures: Vec<BatchFailure>,
    pub total_ms: f64,
}

/// Paths written by [`write_outputs`].
#[derive(Clone, Debug)]
pub struct BatchOutputs {
    pub table: PathBuf,
    pub json_report: Option<PathBuf>,
}

/// Files in `cfg.input_dir` whose name contains `cfg.extension`.
pub fn list_inputs(cfg: &BatchConfig) -> Result<Vec<PathBuf>, BatchError> {
    let list_err = |source: std::io::Error| BatchError::ListDir {
        path: cfg.input_dir.clone(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(&cfg.input_dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.starts_with('.') || !name.contains(cfg.extension.as_str()) {
            continue;
        }
        if entry.file_type().map_err(list_err)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Summarize and score one plane.
///
/// Statistics always describe the raw intensities; with `normalize` set the
/// metrics score the normalized plane instead.
pub fn evaluate_plane<I>(
    name: impl Into<String>,
    img: &I,
    metrics: &[FocusMetric],
    params: &MetricParams,
    normalize: Option<Normalization>,
) -> Result<ImageRecord, RecordError>
where
    I: ImageView + Sync,
    I::Pixel: Sample,
{
    let start = Instant::now();
    let stats = IntensityStats::compute(img)?;
    let scores = match normalize {
        Some(normalization) => {
            MetricScores::compute(&normalization.apply(img), metrics, params)?
        }
        None => MetricScores::compute(img, metrics, params)?,
    };
    Ok(ImageRecord {
        name: name.into(),
        width: img.width(),
        height: img.height(),
        stats,
        scores,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}

/// Decode `path` and score it.
pub fn evaluate_file(path: &Path, cfg: &BatchConfig) -> Result<ImageRecord, RecordError> {
    let gray = load_grayscale_u16(path)?;
    let record = evaluate_plane(
        display_name(path),
        &gray.as_view(),
        &cfg.metrics,
        &cfg.metric_params,
        cfg.normalize,
    )?;
    debug!(
        "scored {} ({}x{}) in {:.3} ms",
        record.name, record.width, record.height, record.elapsed_ms
    );
    Ok(record)
}

/// Score every input of `cfg`. Per-file failures are collected in the
/// report; only listing errors abort the run.
pub fn run_batch(cfg: &BatchConfig) -> Result<BatchReport, BatchError> {
    if cfg.metrics.is_empty() {
        return Err(BatchError::NoMetrics);
    }
    let start = Instant::now();
    let inputs = list_inputs(cfg)?;
    info!(
        "scoring {} file(s) from {} with {} metric(s)",
        inputs.len(),
        cfg.input_dir.display(),
        cfg.metrics.len()
    );

    #[cfg(feature = "parallel")]
    let results: Vec<_> = inputs
        .par_iter()
        .map(|path| (path, evaluate_file(path, cfg)))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = inputs
        .iter()
        .map(|path| (path, evaluate_file(path, cfg)))
        .collect();

    let mut report = BatchReport {
        metrics: cfg.metrics.clone(),
        ..Default::default()
    };
    for (path, result) in results {
        match result {
            Ok(record) => report.records.push(record),
            Err(err) => {
                warn!("skipping {}: {err}", path.display());
                report.failures.push(BatchFailure {
                    name: display_name(path),
                    reason: err.to_string(),
                });
            }
        }
    }
    report.total_ms = start.elapsed().as_secs_f64() * 1000.0;
    info!(
        "scored {} plane(s), {} failure(s) in {:.1} ms",
        report.records.len(),
        report.failures.len(),
        report.total_ms
    );
    Ok(report)
}

/// Render records as CSV: the statistics columns, then one column per metric
/// in `metrics` order. A metric missing from a record leaves an empty cell.
pub fn csv_table(records: &[ImageRecord], metrics: &[FocusMetric]) -> String {
    let header: Vec<&str> = STATS_COLUMNS
        .iter()
        .copied()
        .chain(metrics.iter().map(|m| m.name()))
        .collect();
    let mut out = header.join(",");
    out.push('\n');
    for record in records {
        out.push_str(&csv_row(record, metrics));
        out.push('\n');
    }
    out
}

/// One CSV line (without terminator) for `record`.
pub fn csv_row(record: &ImageRecord, metrics: &[FocusMetric]) -> String {
    let s = &record.stats;
    let stats = [s.max, s.min, s.mean, s.var, s.norm_var, s.kurtosis]
        .into_iter()
        .map(|v| v.to_string());
    let scores = metrics.iter().map(|&metric| {
        record
            .scores
            .get(metric)
            .map(|v| v.to_string())
            .unwrap_or_default()
    });
    std::iter::once(csv_field(&record.name))
        .chain(stats)
        .chain(scores)
        .collect::<Vec<_>>()
        .join(",")
}

/// Write the CSV table (and the JSON report when enabled) into the output
/// directory, stamped with the local time.
pub fn write_outputs(cfg: &BatchConfig, report: &BatchReport) -> Result<BatchOutputs, BatchError> {
    let stem = format!(
        "{}_{}",
        cfg.output.table_prefix,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let dir = cfg.output_dir();

    let table = dir.join(format!("{stem}.csv"));
    write_text_file(&table, &csv_table(&report.records, &report.metrics))?;

    let json_report = if cfg.output.json_report {
        let path = dir.join(format!("{stem}.json"));
        write_json_file(&path, report)?;
        Some(path)
    } else {
        None
    };
    Ok(BatchOutputs { table, json_report })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
