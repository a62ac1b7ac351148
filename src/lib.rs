//! CPU raster effects for premultiplied RGBA8 images.
//!
//! The crate pipes a [`PixelBuffer`] through pure transforms: resizing and
//! placement under a [`ContentMode`], cropping and edge insets, rotation and
//! flips, rounded-corner masking, tint and grayscale, and an approximated
//! Gaussian [`blur`] with presets. Operations that rasterize geometry go
//! through a [`DrawingSurface`], backed by a software rasterizer.
//!
//! Constraints that hold everywhere:
//!
//! * inputs are never mutated; every operation returns a new buffer
//! * pixel data stays premultiplied RGBA8 end to end
//! * operations are all-or-nothing: on error, no partial output escapes

#![forbid(unsafe_code)]

mod blur;
mod color;
mod content_mode;
mod error;
mod geom;
mod geometry;
mod mask;
mod math;
mod pixmap;
mod surface;

pub use blur::{BlendMode, BlurParams, BlurPreset, blur, blur_preset, blur_with_tint};
pub use color::{grayscale, tint};
pub use content_mode::{ContentMode, fit_rect};
pub use error::{RasterError, RasterResult};
pub use geom::{
    Affine, BezPath, CornerSet, EdgeInsets, FillRule, LineJoin, Point, Rect, Rgba, Size, Vec2,
};
pub use geometry::{
    crop, draw_in_rect, flip_horizontal, flip_vertical, inset_edges, resize, resize_with_mode,
    rotate, rotate_180, rotate_left_90, rotate_right_90,
};
pub use mask::round_corners;
pub use pixmap::{MAX_DIMENSION, PixelBuffer};
pub use surface::{CpuSurface, DrawingSurface, render};
