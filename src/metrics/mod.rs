//! Focus (sharpness) measures over single-channel planes.
//!
//! Every metric walks the interior of the plane, sums a local contrast term
//! built from a small finite-difference stencil, and divides by a
//! metric-specific pixel count `n_px`. The stencil width fixes the margin
//! that is skipped, the divisor and whether the term is signed; those
//! conventions differ per metric and are part of each score's contract.
//!
//! - Differential: [`brenner`], [`absolute_laplacian`], [`squared_laplacian`],
//!   [`total_variation`], [`block_total_variation`], [`tenengrad`].
//! - Correlative: [`vollath_f4`], [`vollath_f5`], [`symmetric_vollath_f4`].
//!
//! Accumulation happens in `f64`; the returned score is `f32`. Planes smaller
//! than a metric's stencil yield [`MetricError::ImageTooSmall`] instead of a
//! NaN/Inf from an empty interior. Non-finite pixels are not screened: a NaN
//! or infinity in the input propagates into the score.
//!
//! Metrics hold no state and never mutate their input, so any number of them
//! can run concurrently on the same plane.
pub mod correlative;
pub mod differential;

pub use correlative::{symmetric_vollath_f4, vollath_f4, vollath_f5};
pub use differential::{
    absolute_laplacian, block_total_variation, brenner, squared_laplacian, tenengrad,
    total_variation,
};

use crate::image::{ImageView, Sample};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Block edge length used by Block Total Variation unless configured.
pub const DEFAULT_BLOCK_SIZE: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MetricError {
    #[error("{metric} needs at least {min_width}x{min_height} pixels, got {width}x{height}")]
    ImageTooSmall {
        metric: FocusMetric,
        width: usize,
        height: usize,
        min_width: usize,
        min_height: usize,
    },
    #[error("block size must be a positive even integer, got {block_size}")]
    InvalidBlockSize { block_size: usize },
}

/// Every focus measure the crate implements.
///
/// Serialized names match the column names of the batch CSV output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FocusMetric {
    #[serde(rename = "brenner")]
    Brenner,
    #[serde(rename = "abs_laplacian")]
    AbsoluteLaplacian,
    #[serde(rename = "sqr_laplacian")]
    SquaredLaplacian,
    #[serde(rename = "tv")]
    TotalVariation,
    #[serde(rename = "block_tv")]
    BlockTotalVariation,
    #[serde(rename = "tenengrad")]
    Tenengrad,
    #[serde(rename = "vollath_f4")]
    VollathF4,
    #[serde(rename = "vollath_f5")]
    VollathF5,
    #[serde(rename = "sym_vollath_f4")]
    SymmetricVollathF4,
}

impl FocusMetric {
    pub const ALL: [FocusMetric; 9] = [
        FocusMetric::Brenner,
        FocusMetric::AbsoluteLaplacian,
        FocusMetric::SquaredLaplacian,
        FocusMetric::TotalVariation,
        FocusMetric::BlockTotalVariation,
        FocusMetric::Tenengrad,
        FocusMetric::VollathF4,
        FocusMetric::VollathF5,
        FocusMetric::SymmetricVollathF4,
    ];

    /// Short column name, identical to the serde name.
    pub fn name(self) -> &'static str {
        match self {
            FocusMetric::Brenner => "brenner",
            FocusMetric::AbsoluteLaplacian => "abs_laplacian",
            FocusMetric::SquaredLaplacian => "sqr_laplacian",
            FocusMetric::TotalVariation => "tv",
            FocusMetric::BlockTotalVariation => "block_tv",
            FocusMetric::Tenengrad => "tenengrad",
            FocusMetric::VollathF4 => "vollath_f4",
            FocusMetric::VollathF5 => "vollath_f5",
            FocusMetric::SymmetricVollathF4 => "sym_vollath_f4",
        }
    }

    /// Smallest `(width, height)` with a non-empty interior.
    pub fn min_size(self, block_size: usize) -> (usize, usize) {
        match self {
            FocusMetric::VollathF4 => (4, 3),
            FocusMetric::SymmetricVollathF4 => (5, 5),
            FocusMetric::BlockTotalVariation => (block_size + 1, block_size + 1),
            _ => (3, 3),
        }
    }

    /// Score `img` with this metric.
    pub fn score<I>(self, img: &I, params: &MetricParams) -> Result<f32, MetricError>
    where
        I: ImageView + Sync,
        I::Pixel: Sample,
    {
        match self {
            FocusMetric::Brenner => brenner(img),
            FocusMetric::AbsoluteLaplacian => absolute_laplacian(img),
            FocusMetric::SquaredLaplacian => squared_laplacian(img),
            FocusMetric::TotalVariation => total_variation(img),
            FocusMetric::BlockTotalVariation => block_total_variation(img, params.block_size),
            FocusMetric::Tenengrad => tenengrad(img),
            FocusMetric::VollathF4 => vollath_f4(img),
            FocusMetric::VollathF5 => vollath_f5(img),
            FocusMetric::SymmetricVollathF4 => symmetric_vollath_f4(img),
        }
    }
}

impl fmt::Display for FocusMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tunables shared by the metric dispatch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricParams {
    /// Neighbourhood edge length for Block Total Variation (even).
    pub block_size: usize,
}

impl Default for MetricParams {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

/// Scores of several metrics for one plane, ordered as [`FocusMetric::ALL`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricScores {
    values: BTreeMap<FocusMetric, f32>,
}

impl MetricScores {
    /// Run each metric in `metrics` on `img`. Fails on the first metric
    /// whose precondition the plane does not meet.
    pub fn compute<I>(
        img: &I,
        metrics: &[FocusMetric],
        params: &MetricParams,
    ) -> Result<Self, MetricError>
    where
        I: ImageView + Sync,
        I::Pixel: Sample,
    {
        let mut values = BTreeMap::new();
        for &metric in metrics {
            values.insert(metric, metric.score(img, params)?);
        }
        Ok(Self { values })
    }

    /// Run every metric.
    pub fn compute_all<I>(img: &I, params: &MetricParams) -> Result<Self, MetricError>
    where
        I: ImageView + Sync,
        I::Pixel: Sample,
    {
        Self::compute(img, &FocusMetric::ALL, params)
    }

    pub fn get(&self, metric: FocusMetric) -> Option<f32> {
        self.values.get(&metric).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FocusMetric, f32)> + '_ {
        self.values.iter().map(|(&m, &v)| (m, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub(crate) fn ensure_min_size<I: ImageView>(
    img: &I,
    metric: FocusMetric,
    (min_width, min_height): (usize, usize),
) -> Result<(), MetricError> {
    let (width, height) = (img.width(), img.height());
    if width < min_width || height < min_height {
        return Err(MetricError::ImageTooSmall {
            metric,
            width,
            height,
            min_width,
            min_height,
        });
    }
    Ok(())
}

#[inline]
pub(crate) fn normalize(acc: f64, n_px: usize) -> f32 {
    (acc / n_px as f64) as f32
}

#[inline]
pub(crate) fn px<T: Sample>(row: &[T], x: usize) -> f64 {
    row[x].to_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageF32;

    fn ramp(w: usize, h: usize) -> ImageF32 {
        let data = (0..w * h).map(|i| ((i * 7) % 13) as f32).collect();
        ImageF32::from_vec(w, h, data).expect("dimensions match")
    }

    #[test]
    fn dispatch_matches_direct_calls() {
        let img = ramp(16, 12);
        let params = MetricParams { block_size: 4 };
        assert_eq!(FocusMetric::Brenner.score(&img, &params), brenner(&img));
        assert_eq!(
            FocusMetric::BlockTotalVariation.score(&img, &params),
            block_total_variation(&img, 4)
        );
        assert_eq!(
            FocusMetric::SymmetricVollathF4.score(&img, &params),
            symmetric_vollath_f4(&img)
        );
    }

    #[test]
    fn compute_all_fills_every_metric_in_order() {
        let img = ramp(20, 20);
        let scores = MetricScores::compute_all(&img, &MetricParams::default()).expect("scores");
        let order: Vec<_> = scores.iter().map(|(m, _)| m).collect();
        assert_eq!(order, FocusMetric::ALL.to_vec());
    }

    #[test]
    fn compute_reports_first_failing_metric() {
        let img = ramp(6, 6);
        let err = MetricScores::compute_all(&img, &MetricParams::default()).unwrap_err();
        assert!(matches!(
            err,
            MetricError::ImageTooSmall {
                metric: FocusMetric::BlockTotalVariation,
                ..
            }
        ));
    }

    #[test]
    fn serde_names_follow_column_names() {
        for metric in FocusMetric::ALL {
            let json = serde_json::to_string(&metric).expect("serialize");
            assert_eq!(json, format!("\"{}\"", metric.name()));
        }
        let parsed: FocusMetric = serde_json::from_str("\"sym_vollath_f4\"").expect("parse");
        assert_eq!(parsed, FocusMetric::SymmetricVollathF4);
    }

    #[test]
    fn error_message_names_metric_and_sizes() {
        let err = brenner(&ImageF32::new(2, 9)).unwrap_err();
        assert_eq!(err.to_string(), "brenner needs at least 3x3 pixels, got 2x9");
    }
}
