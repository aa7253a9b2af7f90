/// Borrowed single-channel plane over any pixel type, with an explicit row
/// stride so sub-regions of a larger buffer can be scored without copying.
#[derive(Clone, Copy, Debug)]
pub struct ImageRef<'a, T> {
    pub w: usize,
    pub h: usize,
    pub stride: usize, // elements between rows
    pub data: &'a [T],
}

/// 8-bit plane view.
pub type ImageU8<'a> = ImageRef<'a, u8>;
/// 16-bit plane view, the usual microscopy camera depth.
pub type ImageU16<'a> = ImageRef<'a, u16>;

impl<'a, T: Copy> ImageRef<'a, T> {
    /// Tightly packed view (`stride == w`).
    ///
    /// # Panics
    /// If `data` holds fewer than `w * h` elements; see [`Self::from_slice`]
    /// for a checked variant.
    pub fn new(w: usize, h: usize, data: &'a [T]) -> Self {
        match Self::from_slice(w, h, w, data) {
            Some(view) => view,
            None => panic!(
                "buffer of {} elements is too short for a {w}x{h} plane",
                data.len()
            ),
        }
    }

    /// Checked strided view. Returns `None` when `stride < w` or `data` is
    /// shorter than `stride * (h - 1) + w`.
    pub fn from_slice(w: usize, h: usize, stride: usize, data: &'a [T]) -> Option<Self> {
        if stride < w {
            return None;
        }
        let needed = match h {
            0 => 0,
            _ => stride.checked_mul(h - 1)?.checked_add(w)?,
        };
        (data.len() >= needed).then_some(Self {
            w,
            h,
            stride,
            data,
        })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[y * self.stride + x]
    }
}

impl<'a, T: Copy> crate::image::traits::ImageView for ImageRef<'a, T> {
    type Pixel = T;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[T] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
    #[inline]
    fn as_slice(&self) -> Option<&[T]> {
        (self.stride == self.w).then_some(&self.data[..self.w * self.h])
    }
}
