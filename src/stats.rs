//! Global intensity statistics and normalization for a single plane.
//!
//! These are reported next to the focus scores: a blurred plane and a dim
//! plane can have similar focus scores, and the intensity summary tells them
//! apart.
use crate::image::{ImageF32, ImageView, Sample};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("cannot compute statistics of an empty image")]
    Empty,
}

/// Summary of the intensity distribution of one plane.
///
/// Variance and kurtosis use the population (biased) estimators. Kurtosis is
/// the excess (Fisher) kurtosis, 0 for a normal distribution. On a constant
/// plane `kurtosis` is NaN, and `norm_var` is NaN when the mean is zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntensityStats {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    pub var: f64,
    /// `var / mean²`
    pub norm_var: f64,
    pub kurtosis: f64,
}

impl IntensityStats {
    pub fn compute<I>(img: &I) -> Result<Self, StatsError>
    where
        I: ImageView,
        I::Pixel: Sample,
    {
        if img.is_empty() {
            return Err(StatsError::Empty);
        }
        let n = img.len() as f64;

        let mut max = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;
        let mut sum = 0.0;
        for row in img.rows() {
            for v in row.iter().map(|v| v.to_f64()) {
                max = max.max(v);
                min = min.min(v);
                sum += v;
            }
        }
        let mean = sum / n;

        let (mut m2, mut m4) = (0.0, 0.0);
        for row in img.rows() {
            for v in row.iter().map(|v| v.to_f64()) {
                let d = v - mean;
                let d2 = d * d;
                m2 += d2;
                m4 += d2 * d2;
            }
        }
        m2 /= n;
        m4 /= n;

        let kurtosis = if m2 == 0.0 {
            f64::NAN
        } else {
            m4 / (m2 * m2) - 3.0
        };
        let norm_var = if mean == 0.0 {
            f64::NAN
        } else {
            m2 / (mean * mean)
        };

        Ok(Self {
            max,
            min,
            mean,
            var: m2,
            norm_var,
            kurtosis,
        })
    }
}

/// Intensity normalization applied to a plane before it is scored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Rescale to `[0, 1]`.
    MinMax,
    /// Zero mean, unit standard deviation.
    Standardize,
}

impl Normalization {
    pub fn apply<I>(self, img: &I) -> ImageF32
    where
        I: ImageView,
        I::Pixel: Sample,
    {
        match self {
            Normalization::MinMax => normalize_min_max(img, 0.0, 1.0),
            Normalization::Standardize => normalize_standardize(img),
        }
    }
}

/// Linearly rescale intensities to `[new_min, new_max]`.
///
/// A constant plane maps to `new_min` everywhere.
pub fn normalize_min_max<I>(img: &I, new_min: f32, new_max: f32) -> ImageF32
where
    I: ImageView,
    I::Pixel: Sample,
{
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for row in img.rows() {
        for v in row.iter().map(|v| v.to_f64()) {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    let span = hi - lo;
    let scale = if span > 0.0 {
        (new_max - new_min) as f64 / span
    } else {
        0.0
    };
    map_to_f32(img, |v| ((v - lo) * scale + new_min as f64) as f32)
}

/// Shift to zero mean and scale to unit (population) standard deviation.
///
/// A constant or empty plane maps to zeros.
pub fn normalize_standardize<I>(img: &I) -> ImageF32
where
    I: ImageView,
    I::Pixel: Sample,
{
    let Ok(stats) = IntensityStats::compute(img) else {
        return ImageF32::new(img.width(), img.height());
    };
    let std = stats.var.sqrt();
    let inv = if std > 0.0 { 1.0 / std } else { 0.0 };
    map_to_f32(img, |v| ((v - stats.mean) * inv) as f32)
}

fn map_to_f32<I>(img: &I, f: impl Fn(f64) -> f32) -> ImageF32
where
    I: ImageView,
    I::Pixel: Sample,
{
    let mut out = ImageF32::new(img.width(), img.height());
    for (y, row) in img.rows().enumerate() {
        for (x, v) in row.iter().enumerate() {
            out.set(x, y, f(v.to_f64()));
        }
    }
    out
}
