/// BT.709 luminance weights in 16.16 fixed point. The three weights sum to
/// exactly 65536 so that `luma_q16(l, l, l) == l` and grayscale is idempotent
/// at the integer level.
pub(crate) const LUMA_R_Q16: u32 = 13933;
pub(crate) const LUMA_G_Q16: u32 = 46871;
pub(crate) const LUMA_B_Q16: u32 = 4732;

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

pub(crate) fn luma_q16(r: u8, g: u8, b: u8) -> u8 {
    let acc = LUMA_R_Q16 * u32::from(r) + LUMA_G_Q16 * u32::from(g) + LUMA_B_Q16 * u32::from(b);
    ((acc + 32768) >> 16) as u8
}

/// Blend `a` toward `b` by weight `w` (0 => a, 255 => b).
pub(crate) fn lerp_u8(a: u8, b: u8, w: u8) -> u8 {
    let iw = 255 - u16::from(w);
    mul_div255_u8(u16::from(a), iw).saturating_add(mul_div255_u8(u16::from(b), u16::from(w)))
}
