use std::sync::Arc;

use crate::{
    error::{RasterError, RasterResult},
    geom::{Affine, BezPath, FillRule, LineJoin, Rect, Rgba, Size},
    pixmap::{PixelBuffer, points_to_pixels},
};

/// A 2D drawing target the engine composites through.
///
/// Every operation that cannot be expressed as a direct pixel permutation
/// opens one surface, issues a bounded sequence of these calls, and ends the
/// session with exactly one [`DrawingSurface::snapshot`]. Coordinates are in
/// points; the surface applies its own samples-per-point scale.
pub trait DrawingSurface {
    /// Surface geometry in point space.
    fn size_points(&self) -> Size;

    /// Samples per point.
    fn scale(&self) -> f64;

    /// Set the transform applied to subsequent draw/fill/clip/stroke calls.
    fn set_transform(&mut self, transform: Affine);

    /// Draw `image` scaled into `rect`.
    fn draw(&mut self, image: &PixelBuffer, rect: Rect) -> RasterResult<()>;

    /// Fill `rect` with `color`.
    fn fill(&mut self, rect: Rect, color: Rgba);

    /// Fill an arbitrary path with `color` under the given fill rule.
    fn fill_path(&mut self, path: &BezPath, color: Rgba, rule: FillRule);

    /// Restrict all subsequent drawing to the interior of `path`.
    fn clip(&mut self, path: &BezPath);

    /// Stroke `path` with the given line width, color and join style.
    fn stroke(&mut self, path: &BezPath, width: f64, color: Rgba, join: LineJoin);

    /// End the drawing session and read the result back.
    fn snapshot(&mut self) -> RasterResult<PixelBuffer>;
}

/// Open a scoped drawing session on a fresh CPU surface, run `f` against it,
/// and return the snapshot. This is the one way operations in this crate
/// produce a rasterized output buffer.
pub fn render<F>(size: Size, scale: f64, has_alpha: bool, f: F) -> RasterResult<PixelBuffer>
where
    F: FnOnce(&mut dyn DrawingSurface) -> RasterResult<()>,
{
    let mut surface = CpuSurface::new(size, scale, has_alpha)?;
    f(&mut surface)?;
    surface.snapshot()
}

/// Software [`DrawingSurface`] backed by a `vello_cpu` render context.
pub struct CpuSurface {
    width_px: u16,
    height_px: u16,
    scale: f64,
    has_alpha: bool,
    transform: Affine,
    clip_depth: usize,
    ctx: vello_cpu::RenderContext,
}

impl CpuSurface {
    pub fn new(size: Size, scale: f64, has_alpha: bool) -> RasterResult<Self> {
        let (width, height) = points_to_pixels(size, scale)?;
        let width_px: u16 = width
            .try_into()
            .map_err(|_| RasterError::invalid_size("surface width exceeds u16"))?;
        let height_px: u16 = height
            .try_into()
            .map_err(|_| RasterError::invalid_size("surface height exceeds u16"))?;
        Ok(Self {
            width_px,
            height_px,
            scale,
            has_alpha,
            transform: Affine::IDENTITY,
            clip_depth: 0,
            ctx: vello_cpu::RenderContext::new(width_px, height_px),
        })
    }

    /// Device transform for the current session: user transform in point
    /// space followed by the points-to-pixels scale.
    fn device_transform(&self) -> Affine {
        Affine::scale(self.scale) * self.transform
    }

    fn apply_transform(&mut self, local: Affine) {
        let full = self.device_transform() * local;
        self.ctx.set_transform(affine_to_cpu(full));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }
}

impl DrawingSurface for CpuSurface {
    fn size_points(&self) -> Size {
        Size::new(
            f64::from(self.width_px) / self.scale,
            f64::from(self.height_px) / self.scale,
        )
    }

    fn scale(&self) -> f64 {
        self.scale
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn draw(&mut self, image: &PixelBuffer, rect: Rect) -> RasterResult<()> {
        if image.is_empty() || rect.width() <= 0.0 || rect.height() <= 0.0 {
            return Ok(());
        }
        let paint = image_to_paint(image)?;
        let (w_px, h_px) = (f64::from(image.width()), f64::from(image.height()));

        // Position the image pixel grid so that it exactly fills `rect` in
        // point space.
        let place = Affine::translate((rect.x0, rect.y0))
            * Affine::scale_non_uniform(rect.width() / w_px, rect.height() / h_px);
        self.apply_transform(place);
        self.ctx.set_paint(paint);
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w_px, h_px));
        Ok(())
    }

    fn fill(&mut self, rect: Rect, color: Rgba) {
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return;
        }
        self.apply_transform(Affine::IDENTITY);
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.fill_rect(&rect_to_cpu(rect));
    }

    fn fill_path(&mut self, path: &BezPath, color: Rgba, rule: FillRule) {
        self.apply_transform(Affine::IDENTITY);
        self.ctx.set_fill_rule(fill_rule_to_cpu(rule));
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.fill_path(&bezpath_to_cpu(path));
        self.ctx.set_fill_rule(vello_cpu::peniko::Fill::NonZero);
    }

    fn clip(&mut self, path: &BezPath) {
        self.apply_transform(Affine::IDENTITY);
        self.ctx.push_clip_layer(&bezpath_to_cpu(path));
        self.clip_depth += 1;
    }

    fn stroke(&mut self, path: &BezPath, width: f64, color: Rgba, join: LineJoin) {
        if width <= 0.0 || color.a == 0 {
            return;
        }
        self.apply_transform(Affine::IDENTITY);
        self.ctx
            .set_stroke(vello_cpu::kurbo::Stroke::new(width).with_join(join_to_cpu(join)));
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.stroke_path(&bezpath_to_cpu(path));
    }

    fn snapshot(&mut self) -> RasterResult<PixelBuffer> {
        while self.clip_depth > 0 {
            self.ctx.pop_layer();
            self.clip_depth -= 1;
        }
        self.ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width_px, self.height_px);
        self.ctx.render_to_pixmap(&mut pixmap);
        PixelBuffer::from_premul_data(
            u32::from(self.width_px),
            u32::from(self.height_px),
            self.scale,
            self.has_alpha,
            pixmap.data_as_u8_slice().to_vec(),
        )
    }
}

fn image_to_paint(image: &PixelBuffer) -> RasterResult<vello_cpu::Image> {
    let w: u16 = image
        .width()
        .try_into()
        .map_err(|_| RasterError::invalid_size("image width exceeds u16"))?;
    let h: u16 = image
        .height()
        .try_into()
        .map_err(|_| RasterError::invalid_size("image height exceeds u16"))?;

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(image.width() as usize * image.height() as usize);
    for px in image.data().chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn color_to_cpu(c: Rgba) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn fill_rule_to_cpu(rule: FillRule) -> vello_cpu::peniko::Fill {
    match rule {
        FillRule::NonZero => vello_cpu::peniko::Fill::NonZero,
        FillRule::EvenOdd => vello_cpu::peniko::Fill::EvenOdd,
    }
}

fn join_to_cpu(join: LineJoin) -> vello_cpu::kurbo::Join {
    match join {
        LineJoin::Miter => vello_cpu::kurbo::Join::Miter,
        LineJoin::Round => vello_cpu::kurbo::Join::Round,
        LineJoin::Bevel => vello_cpu::kurbo::Join::Bevel,
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_produces_solid_snapshot() {
        let buf = render(Size::new(4.0, 4.0), 1.0, false, |s| {
            s.fill(Rect::new(0.0, 0.0, 4.0, 4.0), Rgba::new(255, 0, 0, 255));
            Ok(())
        })
        .unwrap();
        assert_eq!(buf.width(), 4);
        assert_eq!(buf.height(), 4);
        assert_eq!(buf.pixel(2, 2), [255, 0, 0, 255]);
        assert!(!buf.has_alpha_channel());
    }

    #[test]
    fn scale_doubles_pixel_dimensions() {
        let buf = render(Size::new(3.0, 5.0), 2.0, true, |_| Ok(())).unwrap();
        assert_eq!(buf.width(), 6);
        assert_eq!(buf.height(), 10);
        assert_eq!(buf.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn draw_places_image_in_rect() {
        let red = PixelBuffer::filled(Rgba::new(255, 0, 0, 255), Size::new(2.0, 2.0), 1.0).unwrap();
        let buf = render(Size::new(4.0, 4.0), 1.0, true, |s| {
            s.draw(&red, Rect::new(2.0, 2.0, 4.0, 4.0))
        })
        .unwrap();
        assert_eq!(buf.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(buf.pixel(3, 3), [255, 0, 0, 255]);
    }

    #[test]
    fn clip_confines_fill() {
        use kurbo::Shape;
        let clip_path = Rect::new(0.0, 0.0, 2.0, 4.0).to_path(0.05);
        let buf = render(Size::new(4.0, 4.0), 1.0, true, |s| {
            s.clip(&clip_path);
            s.fill(Rect::new(0.0, 0.0, 4.0, 4.0), Rgba::WHITE);
            Ok(())
        })
        .unwrap();
        assert_eq!(buf.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(buf.pixel(3, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn surface_rejects_degenerate_size() {
        assert!(CpuSurface::new(Size::new(0.0, 4.0), 1.0, true).is_err());
        assert!(CpuSurface::new(Size::new(4.0, 4.0), 0.0, true).is_err());
    }
}
