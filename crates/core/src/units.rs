//! Length and font-size units used by slide XML.

/// English Metric Units per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// English Metric Units per typographic point.
pub const EMU_PER_POINT: i64 = 12_700;

/// Convert inches to EMU, rounding to the nearest unit.
pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH as f64).round() as i64
}

/// Convert points to the hundredths-of-a-point scale used by `sz` attributes.
pub fn points_to_centipoints(points: f64) -> i64 {
    (points * 100.0).round() as i64
}

/// Convert a `sz` attribute value (hundredths of a point) to points.
pub fn centipoints_to_points(centipoints: i64) -> f64 {
    centipoints as f64 / 100.0
}
