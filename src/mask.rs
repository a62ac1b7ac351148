//! Rounded-corner masking and optional inner border stroking.

use kurbo::{RoundedRect, RoundedRectRadii, Shape};

use crate::{
    error::{RasterError, RasterResult},
    geom::{BezPath, CornerSet, LineJoin, Rect, Rgba},
    pixmap::PixelBuffer,
    surface::render,
};

/// Clip `src` to a rounded rectangle and optionally stroke a border just
/// inside the clipped edge. `radius` and `border_width` are in points and
/// are clamped to half the shorter side; the output keeps the source size.
pub fn round_corners(
    src: &PixelBuffer,
    radius: f64,
    corners: CornerSet,
    border_width: f64,
    border_color: Option<Rgba>,
    join: LineJoin,
) -> RasterResult<PixelBuffer> {
    if !radius.is_finite() || !border_width.is_finite() {
        return Err(RasterError::invalid_parameter(
            "corner radius and border width must be finite",
        ));
    }
    if src.is_empty() {
        return Ok(src.clone());
    }
    let size = src.size_points();
    let max_r = size.width.min(size.height) / 2.0;
    let radius = radius.clamp(0.0, max_r);
    let border_width = border_width.clamp(0.0, max_r);

    let rounding = radius > 0.0 && !corners.is_empty();
    let border = border_color.filter(|c| c.a > 0 && border_width > 0.0);
    if !rounding && border.is_none() {
        return Ok(src.clone());
    }

    let rect = size.to_rect();
    render(size, src.scale(), true, |s| {
        s.clip(&corner_path(rect, radius, corners));
        s.draw(src, rect)?;
        if let Some(color) = border {
            // Stroke centered on the inset rect, so the border stays fully
            // inside the image bounds.
            let inset = rect.inflate(-border_width / 2.0, -border_width / 2.0);
            let inner_radius = (radius - border_width / 2.0).max(0.0);
            s.stroke(
                &corner_path(inset, inner_radius, corners),
                border_width,
                color,
                join,
            );
        }
        Ok(())
    })
}

fn corner_path(rect: Rect, radius: f64, corners: CornerSet) -> BezPath {
    let r = |on: bool| if on { radius } else { 0.0 };
    RoundedRect::from_rect(
        rect,
        RoundedRectRadii::new(
            r(corners.top_left),
            r(corners.top_right),
            r(corners.bottom_right),
            r(corners.bottom_left),
        ),
    )
    .to_path(0.05)
}
