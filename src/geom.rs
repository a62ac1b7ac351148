use crate::error::{RasterError, RasterResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Size, Vec2};

/// Straight (non-premultiplied) RGBA color, each channel 0..=255.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Gray level and alpha given as 0..=1 fractions, mirroring how the blur
    /// preset constants are conventionally written.
    pub fn from_white(white: f64, alpha: f64) -> Self {
        let w = (white.clamp(0.0, 1.0) * 255.0).round() as u8;
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(w, w, w, a)
    }

    pub fn is_opaque(self) -> bool {
        self.a == 255
    }

    /// Premultiplied RGBA8 form of this color.
    pub fn to_premul(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            crate::math::mul_div255_u8(u16::from(c), u16::from(a))
        }
        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}

/// Per-edge insets in points. Positive values expand the canvas, negative
/// values shrink it.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EdgeInsets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl EdgeInsets {
    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub const fn uniform(v: f64) -> Self {
        Self::new(v, v, v, v)
    }

    pub fn horizontal(self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(self) -> f64 {
        self.top + self.bottom
    }

    pub fn is_finite(self) -> bool {
        self.top.is_finite()
            && self.left.is_finite()
            && self.bottom.is_finite()
            && self.right.is_finite()
    }
}

/// Selects which corners participate in corner rounding. The empty set means
/// no rounding at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CornerSet {
    pub top_left: bool,
    pub top_right: bool,
    pub bottom_left: bool,
    pub bottom_right: bool,
}

impl CornerSet {
    pub const fn all() -> Self {
        Self {
            top_left: true,
            top_right: true,
            bottom_left: true,
            bottom_right: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            top_left: false,
            top_right: false,
            bottom_left: false,
            bottom_right: false,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Self::none()
    }
}

/// Line join style for stroked borders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Fill rule for path filling on a [`crate::DrawingSurface`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// Validate a target size in points: both dimensions must be positive and
/// finite. Shared guard for every operation that allocates an output canvas.
pub(crate) fn require_positive_size(size: Size, what: &str) -> RasterResult<()> {
    if !size.width.is_finite() || !size.height.is_finite() || size.width <= 0.0 || size.height <= 0.0
    {
        return Err(RasterError::invalid_size(format!(
            "{what} must have positive dimensions, got {:.3}x{:.3}",
            size.width, size.height
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_premul_scales_by_alpha() {
        let c = Rgba::new(255, 128, 0, 128);
        assert_eq!(c.to_premul(), [128, 64, 0, 128]);
        assert_eq!(Rgba::TRANSPARENT.to_premul(), [0, 0, 0, 0]);
    }

    #[test]
    fn from_white_matches_preset_notation() {
        assert_eq!(Rgba::from_white(1.0, 0.3), Rgba::new(255, 255, 255, 77));
        assert_eq!(Rgba::from_white(0.11, 0.73), Rgba::new(28, 28, 28, 186));
    }

    #[test]
    fn corner_set_all_and_none() {
        assert!(CornerSet::none().is_empty());
        assert!(!CornerSet::all().is_empty());
    }

    #[test]
    fn positive_size_guard_rejects_degenerate() {
        assert!(require_positive_size(Size::new(1.0, 1.0), "t").is_ok());
        assert!(require_positive_size(Size::new(0.0, 1.0), "t").is_err());
        assert!(require_positive_size(Size::new(1.0, -2.0), "t").is_err());
        assert!(require_positive_size(Size::new(f64::NAN, 1.0), "t").is_err());
    }
}
