use crate::{
    error::{RasterError, RasterResult},
    geom::{Rgba, Size, require_positive_size},
};

/// Largest supported pixel dimension. Matches the `u16` pixmap limit of the
/// CPU rasterizer backing [`crate::DrawingSurface`].
pub const MAX_DIMENSION: u32 = u16::MAX as u32;

/// An owned, fixed-size grid of premultiplied RGBA8 samples.
///
/// `PixelBuffer` is the input and output of every operation in this crate.
/// It is immutable once constructed; transforms always allocate a fresh
/// output buffer. `scale` is the samples-per-point factor: the buffer's
/// geometry in point space is `width / scale` by `height / scale`.
///
/// The only buffer with zero dimensions is the designated empty buffer, the
/// defined result of a crop whose intersection with the source is empty.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    scale: f64,
    has_alpha: bool,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a zeroed (fully transparent) buffer.
    pub fn new(width: u32, height: u32, scale: f64, has_alpha: bool) -> RasterResult<Self> {
        validate_dims(width, height, scale)?;
        if width == 0 || height == 0 {
            return Err(RasterError::invalid_size(
                "pixel buffer dimensions must be > 0 (use PixelBuffer::empty)",
            ));
        }
        let len = byte_len(width, height)?;
        let data = try_alloc_zeroed(len)?;
        Ok(Self {
            width,
            height,
            scale,
            has_alpha,
            data,
        })
    }

    /// Wrap existing premultiplied RGBA8 bytes.
    pub fn from_premul_data(
        width: u32,
        height: u32,
        scale: f64,
        has_alpha: bool,
        data: Vec<u8>,
    ) -> RasterResult<Self> {
        validate_dims(width, height, scale)?;
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(RasterError::invalid_size(format!(
                "pixel data length {} does not match {}x{}x4",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            scale,
            has_alpha,
            data,
        })
    }

    /// The zero-size buffer returned by degenerate-but-valid operations.
    pub fn empty(scale: f64) -> Self {
        Self {
            width: 0,
            height: 0,
            scale: if scale.is_finite() && scale > 0.0 {
                scale
            } else {
                1.0
            },
            has_alpha: true,
            data: Vec::new(),
        }
    }

    /// A solid-color image of the given point size.
    pub fn filled(color: Rgba, size: Size, scale: f64) -> RasterResult<Self> {
        require_positive_size(size, "filled image size")?;
        let (width, height) = points_to_pixels(size, scale)?;
        let mut buf = Self::new(width, height, scale, !color.is_opaque())?;
        let px = color.to_premul();
        for chunk in buf.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
        Ok(buf)
    }

    /// Convert a straight-alpha decoded image into a premultiplied buffer.
    /// This is the decoder-collaborator boundary: container formats are
    /// decoded elsewhere and handed over as an [`image::RgbaImage`].
    pub fn from_image(img: &image::RgbaImage, scale: f64) -> RasterResult<Self> {
        let (width, height) = img.dimensions();
        let mut data = img.as_raw().clone();
        let mut has_alpha = false;
        for px in data.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            has_alpha |= a != 255;
            if a == 0 {
                px[0] = 0;
                px[1] = 0;
                px[2] = 0;
                continue;
            }
            px[0] = ((u16::from(px[0]) * a + 127) / 255) as u8;
            px[1] = ((u16::from(px[1]) * a + 127) / 255) as u8;
            px[2] = ((u16::from(px[2]) * a + 127) / 255) as u8;
        }
        Self::from_premul_data(width, height, scale, has_alpha, data)
    }

    /// Convert back to a straight-alpha image for hand-off to an encoder.
    pub fn to_image(&self) -> RasterResult<image::RgbaImage> {
        let mut data = self.data.clone();
        for px in data.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            px[0] = ((u16::from(px[0]) * 255 + a / 2) / a).min(255) as u8;
            px[1] = ((u16::from(px[1]) * 255 + a / 2) / a).min(255) as u8;
            px[2] = ((u16::from(px[2]) * 255 + a / 2) / a).min(255) as u8;
        }
        image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| RasterError::invalid_size("buffer does not fit an RgbaImage"))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples per point.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Whether this buffer may contain non-opaque pixels.
    pub fn has_alpha_channel(&self) -> bool {
        self.has_alpha
    }

    /// Geometry of this buffer in point space.
    pub fn size_points(&self) -> Size {
        Size::new(
            f64::from(self.width) / self.scale,
            f64::from(self.height) / self.scale,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Premultiplied RGBA sample at pixel `(x, y)`.
    ///
    /// # Panics
    /// Panics if `(x, y)` is out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

/// Convert a point-space size into pixel dimensions, rounding to the nearest
/// whole pixel.
pub(crate) fn points_to_pixels(size: Size, scale: f64) -> RasterResult<(u32, u32)> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RasterError::invalid_parameter("scale must be > 0"));
    }
    let w = (size.width * scale).round();
    let h = (size.height * scale).round();
    if w < 1.0 || h < 1.0 {
        return Err(RasterError::invalid_size(format!(
            "size {:.3}x{:.3} at scale {scale} is smaller than one pixel",
            size.width, size.height
        )));
    }
    if w > f64::from(MAX_DIMENSION) || h > f64::from(MAX_DIMENSION) {
        return Err(RasterError::invalid_size(format!(
            "size {w}x{h} exceeds the maximum dimension {MAX_DIMENSION}"
        )));
    }
    Ok((w as u32, h as u32))
}

/// Allocate a zeroed byte vector, surfacing allocation failure as
/// [`RasterError::OutOfMemory`] instead of aborting.
pub(crate) fn try_alloc_zeroed(len: usize) -> RasterResult<Vec<u8>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| RasterError::out_of_memory(format!("failed to allocate {len} bytes")))?;
    v.resize(len, 0);
    Ok(v)
}

pub(crate) fn byte_len(width: u32, height: u32) -> RasterResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| RasterError::invalid_size("pixel buffer byte length overflow"))
}

fn validate_dims(width: u32, height: u32, scale: f64) -> RasterResult<()> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RasterError::invalid_parameter("scale must be > 0"));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(RasterError::invalid_size(format!(
            "dimensions {width}x{height} exceed the maximum dimension {MAX_DIMENSION}"
        )));
    }
    Ok(())
}
