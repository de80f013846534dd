pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Broadcast (BT.601) luma of an 8-bit RGB triple, normalized to `[0, 1]`.
pub(crate) fn luma(r: u8, g: u8, b: u8) -> f64 {
    (f64::from(r) * 0.299 + f64::from(g) * 0.587 + f64::from(b) * 0.114) / 255.0
}

/// Fractional part in `[0, 1)`, matching `x - floor(x)`.
pub(crate) fn fract(x: f64) -> f64 {
    x - x.floor()
}

/// Remainder with the sign of the dividend (like `%` on floats in most languages).
pub(crate) fn rem_trunc(x: f64, m: f64) -> f64 {
    x % m
}

/// Euclidean remainder in `[0, m)` for positive `m`.
pub(crate) fn rem_pos(x: f64, m: f64) -> f64 {
    ((x % m) + m) % m
}

pub(crate) fn clamp_u8(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
