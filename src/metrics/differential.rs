//! Differential focus measures: sums of squared or absolute finite
//! differences.
//!
//! All of them are invariant under adding a constant to the plane and under
//! negating it, and score exactly zero on a constant plane.
//!
//! Complexity: O(W·H) per call, except Block Total Variation which is
//! O(W·H·b²) for block size `b`.
use super::{ensure_min_size, normalize, px, FocusMetric, MetricError};
use crate::image::{ImageView, Sample};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

type Kernel3 = [[f64; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Brenner gradient: mean squared difference between the pixels one row
/// above and one row below, over the 1-pixel interior.
///
/// `n_px = (H-2)(W-2)`.
pub fn brenner<I>(img: &I) -> Result<f32, MetricError>
where
    I: ImageView,
    I::Pixel: Sample,
{
    ensure_min_size(img, FocusMetric::Brenner, FocusMetric::Brenner.min_size(0))?;
    let (w, h) = (img.width(), img.height());

    let mut acc = 0.0;
    for y in 1..h - 1 {
        let up = img.row(y - 1);
        let down = img.row(y + 1);
        for x in 1..w - 1 {
            let d = px(up, x) - px(down, x);
            acc += d * d;
        }
    }
    Ok(normalize(acc, (h - 2) * (w - 2)))
}

/// Sum of absolute horizontal and vertical second differences
/// `|2c - l - r| + |2c - u - d|`, averaged over the interior.
pub fn absolute_laplacian<I>(img: &I) -> Result<f32, MetricError>
where
    I: ImageView,
    I::Pixel: Sample,
{
    let metric = FocusMetric::AbsoluteLaplacian;
    ensure_min_size(img, metric, metric.min_size(0))?;
    let (w, h) = (img.width(), img.height());

    let mut acc = 0.0;
    for y in 1..h - 1 {
        let (up, mid, down) = (img.row(y - 1), img.row(y), img.row(y + 1));
        for x in 1..w - 1 {
            let c2 = 2.0 * px(mid, x);
            acc += (c2 - px(mid, x - 1) - px(mid, x + 1)).abs()
                + (c2 - px(up, x) - px(down, x)).abs();
        }
    }
    Ok(normalize(acc, (h - 2) * (w - 2)))
}

/// Squared 8-connected Laplacian `(8c - Σ neighbours)²`, averaged over the
/// interior.
pub fn squared_laplacian<I>(img: &I) -> Result<f32, MetricError>
where
    I: ImageView,
    I::Pixel: Sample,
{
    let metric = FocusMetric::SquaredLaplacian;
    ensure_min_size(img, metric, metric.min_size(0))?;
    let (w, h) = (img.width(), img.height());

    let mut acc = 0.0;
    for y in 1..h - 1 {
        let (up, mid, down) = (img.row(y - 1), img.row(y), img.row(y + 1));
        for x in 1..w - 1 {
            let orthogonal = px(mid, x - 1) + px(mid, x + 1) + px(up, x) + px(down, x);
            let diagonal = px(up, x - 1) + px(down, x + 1) + px(up, x + 1) + px(down, x - 1);
            let lap = 8.0 * px(mid, x) - orthogonal - diagonal;
            acc += lap * lap;
        }
    }
    Ok(normalize(acc, (h - 2) * (w - 2)))
}

/// Total Variation: mean Euclidean norm of the central-difference gradient
/// `sqrt((r - l)² + (d - u)²)`.
pub fn total_variation<I>(img: &I) -> Result<f32, MetricError>
where
    I: ImageView,
    I::Pixel: Sample,
{
    let metric = FocusMetric::TotalVariation;
    ensure_min_size(img, metric, metric.min_size(0))?;
    let (w, h) = (img.width(), img.height());

    let mut acc = 0.0;
    for y in 1..h - 1 {
        let (up, mid, down) = (img.row(y - 1), img.row(y), img.row(y + 1));
        for x in 1..w - 1 {
            let gx = px(mid, x + 1) - px(mid, x - 1);
            let gy = px(down, x) - px(up, x);
            acc += (gx * gx + gy * gy).sqrt();
        }
    }
    Ok(normalize(acc, (h - 2) * (w - 2)))
}

/// Block Total Variation: for every pixel at least `block_size / 2` away from
/// the border, sum `|c - v|` over the `block_size × block_size` block whose
/// rows and columns span `[p - b/2, p + b/2)`.
///
/// `n_px = (H - b)(W - b)`. `block_size` must be even and non-zero, and the
/// plane must be larger than the block in both directions.
///
/// With the `parallel` feature rows are scored on the rayon pool; partial
/// sums are still added in row order so the result does not depend on
/// scheduling.
pub fn block_total_variation<I>(img: &I, block_size: usize) -> Result<f32, MetricError>
where
    I: ImageView + Sync,
    I::Pixel: Sample,
{
    if block_size == 0 || block_size % 2 != 0 {
        return Err(MetricError::InvalidBlockSize { block_size });
    }
    let metric = FocusMetric::BlockTotalVariation;
    ensure_min_size(img, metric, metric.min_size(block_size))?;
    let (w, h) = (img.width(), img.height());
    let half = block_size / 2;

    let row_sum = |y: usize| -> f64 {
        let centre_row = img.row(y);
        let block_rows: Vec<&[I::Pixel]> = (y - half..y + half).map(|yb| img.row(yb)).collect();
        let mut acc = 0.0;
        for x in half..w - half {
            let c = px(centre_row, x);
            for row in &block_rows {
                for &v in &row[x - half..x + half] {
                    acc += (c - v.to_f64()).abs();
                }
            }
        }
        acc
    };

    #[cfg(feature = "parallel")]
    let partials: Vec<f64> = (half..h - half).into_par_iter().map(row_sum).collect();
    #[cfg(not(feature = "parallel"))]
    let partials: Vec<f64> = (half..h - half).map(row_sum).collect();

    let acc: f64 = partials.iter().sum();
    Ok(normalize(acc, (h - block_size) * (w - block_size)))
}

/// Tenengrad: mean squared Sobel gradient magnitude `gx² + gy²` over the
/// interior.
pub fn tenengrad<I>(img: &I) -> Result<f32, MetricError>
where
    I: ImageView,
    I::Pixel: Sample,
{
    let metric = FocusMetric::Tenengrad;
    ensure_min_size(img, metric, metric.min_size(0))?;
    let (w, h) = (img.width(), img.height());

    let mut acc = 0.0;
    for y in 1..h - 1 {
        let rows = [img.row(y - 1), img.row(y), img.row(y + 1)];
        for x in 1..w - 1 {
            let mut gx = 0.0;
            let mut gy = 0.0;
            for (ky, &row) in rows.iter().enumerate() {
                let kx_row = &SOBEL_KERNEL_X[ky];
                let ky_row = &SOBEL_KERNEL_Y[ky];
                let (l, c, r) = (px(row, x - 1), px(row, x), px(row, x + 1));
                gx += l * kx_row[0] + c * kx_row[1] + r * kx_row[2];
                gy += l * ky_row[0] + c * ky_row[1] + r * ky_row[2];
            }
            acc += gx * gx + gy * gy;
        }
    }
    Ok(normalize(acc, (h - 2) * (w - 2)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ImageF32, ImageU16, ImageU8};

    fn assert_close(actual: f32, expected: f64) {
        let tol = 1e-5 * expected.abs().max(1.0);
        assert!(
            (actual as f64 - expected).abs() <= tol,
            "actual={actual} expected={expected}"
        );
    }

    fn bright_centre() -> ImageF32 {
        let mut img = ImageF32::new(5, 5);
        img.set(2, 2, 1.0);
        img
    }

    #[test]
    fn single_bright_pixel_reference_scores() {
        let img = bright_centre();
        assert_close(brenner(&img).unwrap(), 2.0 / 9.0);
        assert_close(absolute_laplacian(&img).unwrap(), 8.0 / 9.0);
        assert_close(squared_laplacian(&img).unwrap(), 8.0);
        assert_close(total_variation(&img).unwrap(), 4.0 / 9.0);
        assert_close(tenengrad(&img).unwrap(), 24.0 / 9.0);
    }

    #[test]
    fn brenner_reads_two_rows_apart() {
        // Rows 0..4 hold 0, 1, 4, 9; only rows 1 and 2 are interior.
        let rows: Vec<Vec<f32>> = (0..4).map(|y| vec![(y * y) as f32; 3]).collect();
        let img = ImageF32::from_rows(&rows).unwrap();
        // (0 - 4)² and (1 - 9)² at the single interior column.
        assert_close(brenner(&img).unwrap(), (16.0 + 64.0) / 2.0);
    }

    #[test]
    fn block_tv_matches_nested_sum() {
        let data: Vec<f32> = vec![
            3.0, 1.0, 4.0, 1.0, //
            5.0, 9.0, 2.0, 6.0, //
            5.0, 3.0, 5.0, 8.0, //
            9.0, 7.0, 9.0, 3.0,
        ];
        let img = ImageF32::from_vec(4, 4, data.clone()).unwrap();
        let b = 2usize;
        let half = b / 2;
        let mut expected = 0.0f64;
        for y in half..4 - half {
            for x in half..4 - half {
                for yb in y - half..y + half {
                    for xb in x - half..x + half {
                        expected += (data[y * 4 + x] as f64 - data[yb * 4 + xb] as f64).abs();
                    }
                }
            }
        }
        expected /= ((4 - b) * (4 - b)) as f64;
        assert_close(block_total_variation(&img, b).unwrap(), expected);
    }

    #[test]
    fn block_tv_on_linear_ramp() {
        // v = 4y + x: every 2×2 block contributes 5 + 4 + 1 + 0.
        let data: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let img = ImageF32::from_vec(4, 4, data).unwrap();
        assert_close(block_total_variation(&img, 2).unwrap(), 10.0);
    }

    #[test]
    fn block_tv_rejects_bad_block_sizes() {
        let img = ImageF32::new(16, 16);
        for block_size in [0, 3, 7] {
            assert_eq!(
                block_total_variation(&img, block_size),
                Err(MetricError::InvalidBlockSize { block_size })
            );
        }
    }

    #[test]
    fn block_tv_requires_plane_larger_than_block() {
        let img = ImageF32::new(8, 20);
        let err = block_total_variation(&img, 8).unwrap_err();
        assert_eq!(
            err,
            MetricError::ImageTooSmall {
                metric: FocusMetric::BlockTotalVariation,
                width: 8,
                height: 20,
                min_width: 9,
                min_height: 9,
            }
        );
        assert!(block_total_variation(&ImageF32::new(9, 9), 8).is_ok());
    }

    #[test]
    fn integer_planes_score_like_floats() {
        let bytes: Vec<u8> = (0..36).map(|i| ((i * 37) % 251) as u8).collect();
        let words: Vec<u16> = bytes.iter().map(|&b| b as u16).collect();
        let floats = ImageF32::from_vec(6, 6, bytes.iter().map(|&b| b as f32).collect()).unwrap();
        let u8_view = ImageU8::new(6, 6, &bytes);
        let u16_view = ImageU16::new(6, 6, &words);

        assert_eq!(tenengrad(&u8_view), tenengrad(&floats));
        assert_eq!(squared_laplacian(&u16_view), squared_laplacian(&floats));
        // Integer pixels must not wrap when differences go negative.
        assert!(absolute_laplacian(&u8_view).unwrap() > 0.0);
    }

    #[test]
    fn strided_view_scores_only_its_window() {
        // 4×4 window inside a 6-wide buffer whose padding columns are huge.
        let mut buf = vec![1000.0f32; 6 * 4];
        for y in 0..4 {
            for x in 0..4 {
                buf[y * 6 + x] = (x + y) as f32;
            }
        }
        let view = crate::image::ImageRef {
            w: 4,
            h: 4,
            stride: 6,
            data: &buf,
        };
        // Gradient of x + y is (2, 2) at each interior pixel.
        assert_close(total_variation(&view).unwrap(), (8.0f64).sqrt());
    }

    #[test]
    fn nan_pixels_propagate() {
        let mut img = bright_centre();
        img.set(2, 1, f32::NAN);
        assert!(total_variation(&img).unwrap().is_nan());
    }
}
