#![doc = include_str!("../README.md")]

// Core: image planes and focus metrics.
pub mod image;
pub mod metrics;
pub mod stats;

// Batch tooling built on top of the core.
pub mod batch;
pub mod config;

// --- High-level re-exports -------------------------------------------------

pub use crate::image::{ImageF32, ImageRef, ImageU16, ImageU8, ImageView, Sample};
pub use crate::metrics::{
    absolute_laplacian, block_total_variation, brenner, squared_laplacian, symmetric_vollath_f4,
    tenengrad, total_variation, vollath_f4, vollath_f5, FocusMetric, MetricError, MetricParams,
    MetricScores, DEFAULT_BLOCK_SIZE,
};
pub use crate::stats::IntensityStats;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use focus_metrics::prelude::*;
///
/// # fn main() -> Result<(), MetricError> {
/// let (w, h) = (64usize, 48usize);
/// let pixels = vec![0u16; w * h];
/// let plane = ImageU16::new(w, h, &pixels);
///
/// let sharpness = tenengrad(&plane)?;
/// let all = MetricScores::compute_all(&plane, &MetricParams::default())?;
/// println!("tenengrad={sharpness} metrics={}", all.len());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{ImageF32, ImageU16, ImageU8, ImageView};
    pub use crate::metrics::*;
}
