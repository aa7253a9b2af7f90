//! Single-channel image planes consumed by the metrics.
//!
//! - `ImageView`: row access shared by owned and borrowed planes.
//! - `Sample`: pixel types (integer or float) readable as `f64`.
//! - `ImageF32`: owned float plane.
//! - `ImageRef`: borrowed strided plane over any pixel type.
pub mod f32;
pub mod io;
pub mod traits;
pub mod view;

pub use self::f32::ImageF32;
pub use self::traits::{ImageView, Rows, Sample};
pub use self::view::{ImageRef, ImageU16, ImageU8};
