#![allow(dead_code)]

use focus_metrics::ImageF32;

/// Generates a simple high-contrast checkerboard plane.
pub fn checkerboard_f32(width: usize, height: usize, cell: usize) -> ImageF32 {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert!(cell > 0, "cell size must be positive");

    let mut img = ImageF32::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let val = if ((x / cell) + (y / cell)) & 1 == 0 {
                32.0
            } else {
                220.0
            };
            img.set(x, y, val);
        }
    }
    img
}

/// Integer-valued pseudo-random texture in [0, 255], reproducible per seed.
pub fn texture_f32(width: usize, height: usize, seed: u32) -> ImageF32 {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let mut img = ImageF32::new(width, height);
    for y in 0..height {
        for x in 0..width {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            img.set(x, y, (state % 256) as f32);
        }
    }
    img
}

/// 3×3 box blur with replicated borders.
pub fn box_blur3(img: &ImageF32) -> ImageF32 {
    let (w, h) = (img.w, img.h);
    let mut out = ImageF32::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for yy in [y.saturating_sub(1), y, (y + 1).min(h - 1)] {
                for xx in [x.saturating_sub(1), x, (x + 1).min(w - 1)] {
                    acc += img.get(xx, yy);
                }
            }
            out.set(x, y, acc / 9.0);
        }
    }
    out
}

/// Widen a float plane to 16-bit, clamping to the representable range.
pub fn to_u16(img: &ImageF32) -> Vec<u16> {
    img.data
        .iter()
        .map(|&v| v.round().clamp(0.0, u16::MAX as f32) as u16)
        .collect()
}
