//! Correlative focus measures (Vollath family): products of a pixel with its
//! neighbours rather than pure differences.
//!
//! Vollath F4 and F5 keep the sign of their terms and depend on the absolute
//! intensity level; Symmetric Vollath F4 takes absolute values per direction.
use super::{ensure_min_size, normalize, px, FocusMetric, MetricError};
use crate::image::{ImageView, Sample};

/// Vollath F4: `Σ c · (r₁ - r₂)` where `r₁`, `r₂` are the pixels one and two
/// columns to the right. Signed.
///
/// Visits y in `[1, H-2]`, x in `[1, W-3]`; `n_px = (H-2)(W-3)`.
pub fn vollath_f4<I>(img: &I) -> Result<f32, MetricError>
where
    I: ImageView,
    I::Pixel: Sample,
{
    let metric = FocusMetric::VollathF4;
    ensure_min_size(img, metric, metric.min_size(0))?;
    let (w, h) = (img.width(), img.height());

    let mut acc = 0.0;
    for y in 1..h - 1 {
        let row = img.row(y);
        for x in 1..w - 2 {
            acc += px(row, x) * (px(row, x + 1) - px(row, x + 2));
        }
    }
    Ok(normalize(acc, (h - 2) * (w - 3)))
}

/// Vollath F5: autocorrelation at lag one column minus the squared image
/// total.
///
/// `score = (Σ c · r₁ - (Σ all pixels)² / n_px) / n_px` with the sum taken
/// over the 1-pixel interior and `n_px = (H-2)(W-2)` used for both
/// divisions. The image total covers every pixel, border included.
pub fn vollath_f5<I>(img: &I) -> Result<f32, MetricError>
where
    I: ImageView,
    I::Pixel: Sample,
{
    let metric = FocusMetric::VollathF5;
    ensure_min_size(img, metric, metric.min_size(0))?;
    let (w, h) = (img.width(), img.height());
    let n_px = (h - 2) * (w - 2);

    let mut acc = 0.0;
    for y in 1..h - 1 {
        let row = img.row(y);
        for x in 1..w - 1 {
            acc += px(row, x) * px(row, x + 1);
        }
    }

    let total: f64 = img
        .rows()
        .map(|row| row.iter().map(|v| v.to_f64()).sum::<f64>())
        .sum();
    acc -= total * total / n_px as f64;

    Ok(normalize(acc, n_px))
}

/// Symmetric Vollath F4: `Σ |c · (f₁ - f₂)|` over the four directions
/// +x, -x, +y, -y, where `f₁`, `f₂` are the pixels one and two steps away.
///
/// The stencil reaches two pixels in every direction, so the visited pixels
/// are y in `[2, H-3]`, x in `[2, W-3]`. The divisor stays
/// `n_px = (H-2)(W-2)` so scores line up with the other 1-pixel-margin
/// metrics.
pub fn symmetric_vollath_f4<I>(img: &I) -> Result<f32, MetricError>
where
    I: ImageView,
    I::Pixel: Sample,
{
    let metric = FocusMetric::SymmetricVollathF4;
    ensure_min_size(img, metric, metric.min_size(0))?;
    let (w, h) = (img.width(), img.height());

    let mut acc = 0.0;
    for y in 2..h - 2 {
        let (up2, up1, mid, down1, down2) = (
            img.row(y - 2),
            img.row(y - 1),
            img.row(y),
            img.row(y + 1),
            img.row(y + 2),
        );
        for x in 2..w - 2 {
            let c = px(mid, x);
            acc += (c * (px(mid, x + 1) - px(mid, x + 2))).abs()
                + (c * (px(mid, x - 1) - px(mid, x - 2))).abs()
                + (c * (px(down1, x) - px(down2, x))).abs()
                + (c * (px(up1, x) - px(up2, x))).abs();
        }
    }
    Ok(normalize(acc, (h - 2) * (w - 2)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageF32;

    fn assert_close(actual: f32, expected: f64) {
        let tol = 1e-5 * expected.abs().max(1.0);
        assert!(
            (actual as f64 - expected).abs() <= tol,
            "actual={actual} expected={expected}"
        );
    }

    fn bright_centre(value: f32) -> ImageF32 {
        let mut img = ImageF32::new(5, 5);
        img.set(2, 2, value);
        img
    }

    #[test]
    fn single_bright_pixel_reference_scores() {
        let img = bright_centre(1.0);
        assert_close(vollath_f4(&img).unwrap(), 0.0);
        assert_close(vollath_f5(&img).unwrap(), -1.0 / 81.0);
        assert_close(symmetric_vollath_f4(&img).unwrap(), 0.0);
    }

    #[test]
    fn vollath_f4_keeps_sign() {
        let rows = vec![
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 2.0, 5.0, 1.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ];
        let img = ImageF32::from_rows(&rows).unwrap();
        // Single visited pixel: 2 · (5 - 1), n_px = 1.
        assert_close(vollath_f4(&img).unwrap(), 8.0);

        let flipped = ImageF32::from_rows(&[
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 2.0, 1.0, 5.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap();
        assert_close(vollath_f4(&flipped).unwrap(), -8.0);
    }

    #[test]
    fn vollath_f5_divides_by_interior_count_twice() {
        // 4×3 plane of ones: interior sum 2, total 12, n_px = 2.
        let img = ImageF32::from_vec(4, 3, vec![1.0; 12]).unwrap();
        assert_close(vollath_f5(&img).unwrap(), (2.0 - 144.0 / 2.0) / 2.0);
    }

    #[test]
    fn symmetric_vollath_f4_sees_every_direction() {
        for (x, y) in [(3, 2), (1, 2), (2, 3), (2, 1)] {
            let mut img = bright_centre(2.0);
            img.set(x, y, 1.0);
            // |2 · (1 - 0)| in exactly one direction, n_px = 9.
            assert_close(symmetric_vollath_f4(&img).unwrap(), 2.0 / 9.0);
        }
    }

    #[test]
    fn minimum_sizes() {
        assert!(vollath_f4(&ImageF32::new(3, 3)).is_err());
        assert!(vollath_f4(&ImageF32::new(4, 3)).is_ok());
        assert!(vollath_f5(&ImageF32::new(3, 2)).is_err());
        assert!(vollath_f5(&ImageF32::new(3, 3)).is_ok());
        assert!(symmetric_vollath_f4(&ImageF32::new(5, 4)).is_err());
        assert!(symmetric_vollath_f4(&ImageF32::new(5, 5)).is_ok());
    }
}
