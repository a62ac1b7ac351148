//! Geometric transforms: resize, crop, edge insets, rotation and flips.
//!
//! Rotations by exact quarter turns and both flips are lossless index
//! permutations; everything else resamples through a drawing surface.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::{
    content_mode::{ContentMode, covers_dest, fit_rect},
    error::{RasterError, RasterResult},
    geom::{Affine, EdgeInsets, FillRule, Point, Rect, Rgba, Size, require_positive_size},
    pixmap::PixelBuffer,
    surface::render,
};

/// Resample `src` to `target` (in points), stretching to fill.
pub fn resize(src: &PixelBuffer, target: Size) -> RasterResult<PixelBuffer> {
    require_positive_size(target, "resize target")?;
    render(target, src.scale(), src.has_alpha_channel(), |s| {
        s.draw(src, target.to_rect())
    })
}

/// Resample `src` into a `target`-sized buffer, placing the content per
/// `mode`. Pixels the content does not cover stay transparent, so the
/// result carries an alpha channel unless the placement covers everything.
pub fn resize_with_mode(
    src: &PixelBuffer,
    target: Size,
    mode: ContentMode,
) -> RasterResult<PixelBuffer> {
    require_positive_size(target, "resize target")?;
    let dest = target.to_rect();
    let placed = fit_rect(src.size_points(), dest, mode);
    let has_alpha = src.has_alpha_channel() || !covers_dest(placed, dest);
    render(target, src.scale(), has_alpha, |s| {
        if placed.width() > 0.0 && placed.height() > 0.0 {
            s.draw(src, placed)?;
        }
        Ok(())
    })
}

/// Extract the sub-image under `rect` (in points). The rect is intersected
/// with the image bounds; an empty intersection yields an empty buffer.
pub fn crop(src: &PixelBuffer, rect: Rect) -> RasterResult<PixelBuffer> {
    if !(rect.x0.is_finite() && rect.y0.is_finite() && rect.x1.is_finite() && rect.y1.is_finite()) {
        return Err(RasterError::invalid_parameter("crop rect must be finite"));
    }
    if src.is_empty() {
        return Ok(PixelBuffer::empty(src.scale()));
    }
    let scale = src.scale();
    let r = rect.abs();
    let x0 = ((r.x0 * scale).round().max(0.0)) as i64;
    let y0 = ((r.y0 * scale).round().max(0.0)) as i64;
    let x1 = ((r.x1 * scale).round()).min(f64::from(src.width())) as i64;
    let y1 = ((r.y1 * scale).round()).min(f64::from(src.height())) as i64;
    if x1 <= x0 || y1 <= y0 {
        return Ok(PixelBuffer::empty(scale));
    }
    let (x0, y0) = (x0 as u32, y0 as u32);
    let (w, h) = ((x1 as u32) - x0, (y1 as u32) - y0);

    let src_stride = src.width() as usize * 4;
    let dst_stride = w as usize * 4;
    let mut out = vec![0u8; dst_stride * h as usize];
    let data = src.data();
    for row in 0..h as usize {
        let src_off = (y0 as usize + row) * src_stride + x0 as usize * 4;
        out[row * dst_stride..(row + 1) * dst_stride]
            .copy_from_slice(&data[src_off..src_off + dst_stride]);
    }
    PixelBuffer::from_premul_data(w, h, scale, src.has_alpha_channel(), out)
}

/// Grow (or shrink, with negative insets) the canvas around `src` by
/// `insets`, optionally painting the newly exposed border area with `fill`.
/// The original content keeps its size and shifts by the top/left insets.
pub fn inset_edges(
    src: &PixelBuffer,
    insets: EdgeInsets,
    fill: Option<Rgba>,
) -> RasterResult<PixelBuffer> {
    if !insets.is_finite() {
        return Err(RasterError::invalid_parameter("edge insets must be finite"));
    }
    let size = src.size_points();
    let target = Size::new(
        size.width + insets.horizontal(),
        size.height + insets.vertical(),
    );
    require_positive_size(target, "inset result")?;

    let inner = Rect::new(
        insets.left,
        insets.top,
        insets.left + size.width,
        insets.top + size.height,
    );
    let exposed = insets.top > 0.0 || insets.left > 0.0 || insets.bottom > 0.0 || insets.right > 0.0;
    let fill = fill.filter(|c| c.a > 0 && exposed);
    let has_alpha = src.has_alpha_channel() || (exposed && fill.is_none_or(|c| !c.is_opaque()));

    render(target, src.scale(), has_alpha, |s| {
        if let Some(color) = fill {
            use kurbo::Shape;
            // Even-odd ring between the outer canvas and the image area, so
            // transparency inside the image area is not painted over.
            let mut ring = target.to_rect().to_path(0.05);
            ring.extend(inner.to_path(0.05));
            s.fill_path(&ring, color, FillRule::EvenOdd);
        }
        s.draw(src, inner)
    })
}

/// Rotate `src` by `radians` (positive is counterclockwise). With
/// `fit_size` the canvas grows to hold the whole rotated image; without it
/// the canvas keeps the source size and corners are cut off.
///
/// Exact multiples of a quarter turn take a lossless permutation path and
/// reproduce source pixels bit for bit.
#[tracing::instrument(skip(src))]
pub fn rotate(src: &PixelBuffer, radians: f64, fit_size: bool) -> RasterResult<PixelBuffer> {
    if !radians.is_finite() {
        return Err(RasterError::invalid_parameter("rotation angle must be finite"));
    }
    if src.is_empty() {
        return Ok(PixelBuffer::empty(src.scale()));
    }
    if let Some(turns) = exact_quarter_turns(radians)
        && let Some(out) = rotate_quarter(src, turns, fit_size)?
    {
        return Ok(out);
    }

    let size = src.size_points();
    let rot = Affine::rotate(-radians);
    let target = if fit_size {
        rotated_bbox(size, rot).size()
    } else {
        size
    };
    let center = Point::new(target.width / 2.0, target.height / 2.0);
    let transform = Affine::translate((center.x, center.y))
        * rot
        * Affine::translate((-size.width / 2.0, -size.height / 2.0));
    render(target, src.scale(), true, |s| {
        s.set_transform(transform);
        s.draw(src, size.to_rect())
    })
}

/// Rotate a quarter turn counterclockwise, growing the canvas.
pub fn rotate_left_90(src: &PixelBuffer) -> RasterResult<PixelBuffer> {
    rotate(src, FRAC_PI_2, true)
}

/// Rotate a quarter turn clockwise, growing the canvas.
pub fn rotate_right_90(src: &PixelBuffer) -> RasterResult<PixelBuffer> {
    rotate(src, -FRAC_PI_2, true)
}

/// Rotate a half turn.
pub fn rotate_180(src: &PixelBuffer) -> RasterResult<PixelBuffer> {
    rotate(src, PI, false)
}

/// Mirror top-to-bottom.
pub fn flip_vertical(src: &PixelBuffer) -> RasterResult<PixelBuffer> {
    let h = src.height();
    permute(src, src.width(), h, |x, y| (x, h - 1 - y))
}

/// Mirror left-to-right.
pub fn flip_horizontal(src: &PixelBuffer) -> RasterResult<PixelBuffer> {
    let w = src.width();
    permute(src, w, src.height(), |x, y| (w - 1 - x, y))
}

/// Draw `src` onto an open surface, placed in `rect` per `mode`, optionally
/// clipping the content to `rect`.
pub fn draw_in_rect(
    surface: &mut dyn crate::surface::DrawingSurface,
    src: &PixelBuffer,
    rect: Rect,
    mode: ContentMode,
    clips: bool,
) -> RasterResult<()> {
    if src.is_empty() {
        return Ok(());
    }
    let placed = fit_rect(src.size_points(), rect, mode);
    if placed.width() <= 0.0 || placed.height() <= 0.0 {
        return Ok(());
    }
    if clips && !covers_dest(rect.abs(), placed) {
        use kurbo::Shape;
        surface.clip(&rect.abs().to_path(0.05));
    }
    surface.draw(src, placed)
}

/// Number of counterclockwise quarter turns `radians` represents, if it is
/// an exact multiple of a quarter turn (within 1e-9 of one).
fn exact_quarter_turns(radians: f64) -> Option<u8> {
    let turns = radians / FRAC_PI_2;
    let nearest = turns.round();
    if (turns - nearest).abs() < 1e-9 {
        Some(nearest.rem_euclid(4.0) as u8)
    } else {
        None
    }
}

/// Lossless quarter-turn path. Returns `Ok(None)` when the requested
/// combination cannot keep the permutation exact (odd turns on a
/// non-square image without growing the canvas), deferring to the resampled
/// path.
fn rotate_quarter(
    src: &PixelBuffer,
    turns: u8,
    fit_size: bool,
) -> RasterResult<Option<PixelBuffer>> {
    let (w, h) = (src.width(), src.height());
    match turns {
        0 => Ok(Some(src.clone())),
        2 => Ok(Some(permute(src, w, h, |x, y| (w - 1 - x, h - 1 - y))?)),
        odd => {
            if !fit_size && w != h {
                return Ok(None);
            }
            let out = if odd == 1 {
                // Counterclockwise: the right edge becomes the top.
                permute(src, h, w, |x, y| (w - 1 - y, x))?
            } else {
                permute(src, h, w, |x, y| (y, h - 1 - x))?
            };
            Ok(Some(out))
        }
    }
}

/// Build a dimension-swapping or mirroring copy of `src` where output pixel
/// `(x, y)` reads source pixel `src_index(x, y)`.
fn permute(
    src: &PixelBuffer,
    out_w: u32,
    out_h: u32,
    src_index: impl Fn(u32, u32) -> (u32, u32),
) -> RasterResult<PixelBuffer> {
    if src.is_empty() {
        return Ok(PixelBuffer::empty(src.scale()));
    }
    let src_stride = src.width() as usize * 4;
    let data = src.data();
    let mut out = vec![0u8; out_w as usize * out_h as usize * 4];
    for y in 0..out_h {
        for x in 0..out_w {
            let (sx, sy) = src_index(x, y);
            let s = sy as usize * src_stride + sx as usize * 4;
            let d = (y as usize * out_w as usize + x as usize) * 4;
            out[d..d + 4].copy_from_slice(&data[s..s + 4]);
        }
    }
    PixelBuffer::from_premul_data(out_w, out_h, src.scale(), src.has_alpha_channel(), out)
}

fn rotated_bbox(size: Size, rot: Affine) -> Rect {
    let corners = [
        Point::new(0.0, 0.0),
        Point::new(size.width, 0.0),
        Point::new(0.0, size.height),
        Point::new(size.width, size.height),
    ];
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for c in corners {
        let p = rot * c;
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Rect::new(min.x, min.y, max.x, max.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 4x2 buffer whose pixel values encode their own coordinates, so
    /// permutations are easy to assert on.
    fn gradient() -> PixelBuffer {
        let mut data = Vec::new();
        for y in 0..2u8 {
            for x in 0..4u8 {
                data.extend_from_slice(&[x * 10, y * 10, 0, 255]);
            }
        }
        PixelBuffer::from_premul_data(4, 2, 1.0, false, data).unwrap()
    }

    #[test]
    fn crop_extracts_expected_pixels() {
        let src = gradient();
        let out = crop(&src, Rect::new(1.0, 0.0, 3.0, 2.0)).unwrap();
        assert_eq!(out.width(), 2);
        assert_eq!(out.height(), 2);
        assert_eq!(out.pixel(0, 0), [10, 0, 0, 255]);
        assert_eq!(out.pixel(1, 1), [20, 10, 0, 255]);
    }

    #[test]
    fn crop_outside_bounds_is_empty() {
        let src = gradient();
        let out = crop(&src, Rect::new(-50.0, -50.0, -40.0, -40.0)).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.scale(), src.scale());
    }

    #[test]
    fn crop_clamps_to_image_bounds() {
        let src = gradient();
        let out = crop(&src, Rect::new(2.0, -10.0, 100.0, 100.0)).unwrap();
        assert_eq!(out.width(), 2);
        assert_eq!(out.height(), 2);
        assert_eq!(out.pixel(0, 0), [20, 0, 0, 255]);
    }

    #[test]
    fn crop_rejects_non_finite_rect() {
        let src = gradient();
        assert!(crop(&src, Rect::new(0.0, 0.0, f64::NAN, 1.0)).is_err());
    }

    #[test]
    fn flips_are_involutions() {
        let src = gradient();
        let twice = flip_vertical(&flip_vertical(&src).unwrap()).unwrap();
        assert_eq!(twice.data(), src.data());
        let twice = flip_horizontal(&flip_horizontal(&src).unwrap()).unwrap();
        assert_eq!(twice.data(), src.data());
    }

    #[test]
    fn flip_horizontal_mirrors_rows() {
        let out = flip_horizontal(&gradient()).unwrap();
        assert_eq!(out.pixel(0, 0), [30, 0, 0, 255]);
        assert_eq!(out.pixel(3, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn quarter_turn_left_swaps_dimensions() {
        let out = rotate_left_90(&gradient()).unwrap();
        assert_eq!(out.width(), 2);
        assert_eq!(out.height(), 4);
        // Source right edge becomes the top row.
        assert_eq!(out.pixel(0, 0), [30, 0, 0, 255]);
        assert_eq!(out.pixel(1, 0), [30, 10, 0, 255]);
    }

    #[test]
    fn four_quarter_turns_compose_to_identity() {
        let src = gradient();
        let mut cur = src.clone();
        for _ in 0..4 {
            cur = rotate_left_90(&cur).unwrap();
        }
        assert_eq!(cur.data(), src.data());
    }

    #[test]
    fn left_then_right_is_identity() {
        let src = gradient();
        let back = rotate_right_90(&rotate_left_90(&src).unwrap()).unwrap();
        assert_eq!(back.data(), src.data());
    }

    #[test]
    fn wrapped_quarter_angle_takes_exact_path() {
        let src = gradient();
        let direct = rotate_left_90(&src).unwrap();
        let wrapped = rotate(&src, FRAC_PI_2 + 4.0 * FRAC_PI_2, true).unwrap();
        assert_eq!(wrapped.data(), direct.data());
    }

    #[test]
    fn rotate_180_reverses_pixels() {
        let out = rotate_180(&gradient()).unwrap();
        assert_eq!(out.pixel(0, 0), [30, 10, 0, 255]);
        assert_eq!(out.pixel(3, 1), [0, 0, 0, 255]);
    }

    #[test]
    fn resize_changes_dimensions() {
        let src = PixelBuffer::filled(Rgba::new(0, 255, 0, 255), Size::new(4.0, 4.0), 1.0).unwrap();
        let out = resize(&src, Size::new(8.0, 2.0)).unwrap();
        assert_eq!(out.width(), 8);
        assert_eq!(out.height(), 2);
        assert_eq!(out.pixel(4, 1), [0, 255, 0, 255]);
    }

    #[test]
    fn resize_with_fit_leaves_transparent_bars() {
        let src = PixelBuffer::filled(Rgba::WHITE, Size::new(4.0, 4.0), 1.0).unwrap();
        let out = resize_with_mode(&src, Size::new(8.0, 4.0), ContentMode::ScaleAspectFit).unwrap();
        assert!(out.has_alpha_channel());
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(out.pixel(4, 2), [255, 255, 255, 255]);
    }

    #[test]
    fn inset_edges_paints_border_and_keeps_content() {
        let src = PixelBuffer::filled(Rgba::new(255, 0, 0, 255), Size::new(4.0, 4.0), 1.0).unwrap();
        let out = inset_edges(&src, EdgeInsets::uniform(2.0), Some(Rgba::new(0, 0, 255, 255)))
            .unwrap();
        assert_eq!(out.width(), 8);
        assert_eq!(out.height(), 8);
        assert_eq!(out.pixel(0, 0), [0, 0, 255, 255]);
        assert_eq!(out.pixel(4, 4), [255, 0, 0, 255]);
    }

    #[test]
    fn inset_shrink_past_zero_fails() {
        let src = PixelBuffer::filled(Rgba::WHITE, Size::new(4.0, 4.0), 1.0).unwrap();
        assert!(inset_edges(&src, EdgeInsets::uniform(-3.0), None).is_err());
    }
}
