//! Per-pixel color transforms on premultiplied RGBA8 data.

use crate::{
    error::RasterResult,
    geom::Rgba,
    math::{luma_q16, mul_div255_u8},
    pixmap::PixelBuffer,
};

/// Replace every non-transparent pixel's color with `color`, keeping the
/// source alpha. Output stays premultiplied.
pub fn tint(src: &PixelBuffer, color: Rgba) -> RasterResult<PixelBuffer> {
    let mut out = src.clone();
    for px in out.data_mut().chunks_exact_mut(4) {
        let a = px[3];
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
        } else {
            px[0] = mul_div255_u8(u16::from(color.r), u16::from(a));
            px[1] = mul_div255_u8(u16::from(color.g), u16::from(a));
            px[2] = mul_div255_u8(u16::from(color.b), u16::from(a));
        }
    }
    Ok(out)
}

/// Convert to grayscale using BT.709 luminance weights. Alpha is untouched;
/// the conversion is idempotent on already-gray pixels.
pub fn grayscale(src: &PixelBuffer) -> RasterResult<PixelBuffer> {
    let mut out = src.clone();
    for px in out.data_mut().chunks_exact_mut(4) {
        let l = luma_q16(px[0], px[1], px[2]);
        px[0] = l;
        px[1] = l;
        px[2] = l;
    }
    Ok(out)
}

const WR: f32 = 0.2126;
const WG: f32 = 0.7152;
const WB: f32 = 0.0722;

/// Scale color saturation in place. `s = 1.0` is identity, `0.0` is
/// grayscale, above `1.0` oversaturates. Channels are clamped to each
/// pixel's alpha to keep the data premultiplied.
pub(crate) fn apply_saturation(data: &mut [u8], s: f32) {
    if s == 1.0 {
        return;
    }
    let t = 1.0 - s;
    // Standard luminance-preserving saturation matrix.
    let m = [
        [WR * t + s, WG * t, WB * t],
        [WR * t, WG * t + s, WB * t],
        [WR * t, WG * t, WB * t + s],
    ];
    for px in data.chunks_exact_mut(4) {
        let a = f32::from(px[3]);
        let (r, g, b) = (f32::from(px[0]), f32::from(px[1]), f32::from(px[2]));
        for (i, row) in m.iter().enumerate() {
            let v = row[0] * r + row[1] * g + row[2] * b;
            px[i] = v.clamp(0.0, a).round() as u8;
        }
    }
}
