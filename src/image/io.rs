//! I/O helpers for grayscale planes and JSON.
//!
//! - `load_grayscale_u16`: read a PNG/TIFF/etc. into an owned 16-bit gray
//!   buffer. 8-bit inputs are widened, colour inputs are converted to luma.
//!   TIFF files are treated as z-stacks and yield their middle page.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::ImageU16;
use log::debug;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode TIFF {}: {source}", .path.display())]
    Tiff {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },
    #[error("unsupported TIFF pixel layout {color} in {}", .path.display())]
    UnsupportedTiff { path: PathBuf, color: String },
    #[error("failed to serialize JSON for {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Owned 16-bit grayscale buffer with borrowed view conversion.
#[derive(Clone, Debug)]
pub struct GrayImageU16 {
    width: usize,
    height: usize,
    data: Vec<u16>,
}

impl GrayImageU16 {
    pub fn new(width: usize, height: usize, data: Vec<u16>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Borrow as a read-only `ImageU16` view
    pub fn as_view(&self) -> ImageU16<'_> {
        ImageU16::new(self.width, self.height, &self.data)
    }
}

/// Load an image from disk and convert to 16-bit grayscale.
///
/// `.tif`/`.tiff` files go through [`load_tiff_mid_plane`]; every other
/// format is decoded by `image` and only its first frame is read.
pub fn load_grayscale_u16(path: &Path) -> Result<GrayImageU16, IoError> {
    if is_tiff(path) {
        return load_tiff_mid_plane(path);
    }
    let img = image::open(path)
        .map_err(|source| IoError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .into_luma16();
    let width = img.width() as usize;
    let height = img.height() as usize;
    Ok(GrayImageU16::new(width, height, img.into_raw()))
}

/// Decode the middle page (`pages / 2`) of a multi-page grayscale TIFF.
///
/// A single-page file yields that page. 8-bit pages are widened the way
/// `image` widens luma (`v * 257`) so both decoding paths agree.
pub fn load_tiff_mid_plane(path: &Path) -> Result<GrayImageU16, IoError> {
    let tiff_err = |source: tiff::TiffError| IoError::Tiff {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(|source| IoError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(tiff_err)?;

    let mut pages = 1;
    while decoder.more_images() {
        decoder.next_image().map_err(tiff_err)?;
        pages += 1;
    }
    let mid = pages / 2;
    decoder.seek_to_image(mid).map_err(tiff_err)?;

    let (width, height) = decoder.dimensions().map_err(tiff_err)?;
    let color = decoder.colortype().map_err(tiff_err)?;
    let data = match (color, decoder.read_image().map_err(tiff_err)?) {
        (ColorType::Gray(16), DecodingResult::U16(data)) => data,
        (ColorType::Gray(8), DecodingResult::U8(data)) => {
            data.into_iter().map(|v| u16::from(v) * 257).collect()
        }
        (color, _) => {
            return Err(IoError::UnsupportedTiff {
                path: path.to_path_buf(),
                color: format!("{color:?}"),
            })
        }
    };
    debug!(
        "{}: decoded page {mid} of {pages} ({width}x{height})",
        path.display()
    );
    Ok(GrayImageU16::new(width as usize, height as usize, data))
}

fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| IoError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_text_file(path, &json)
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_text_file(path: &Path, contents: &str) -> Result<(), IoError> {
    ensure_parent_dir(path)?;
    fs::write(path, contents).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent_dir(path: &Path) -> Result<(), IoError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| IoError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}
