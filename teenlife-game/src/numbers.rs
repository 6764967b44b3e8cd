//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 and clamp it to the i32 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i32>(clamped).unwrap_or(0)
}

/// Round a f64 percentage into a `0..=100` byte, returning 0 for non-finite values.
#[must_use]
pub fn round_f64_to_percent(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    cast::<f64, u8>(value.clamp(0.0, 100.0).round()).unwrap_or(0)
}

/// Convert grade hundredths to a display-friendly f64.
#[must_use]
pub fn points_to_f64(points: i32) -> f64 {
    f64::from(points) / f64::from(crate::constants::GRADE_SCALE)
}

/// Convert a f64 grade into hundredths, rounding to the nearest hundredth.
#[must_use]
pub fn f64_to_points(grade: f64) -> i32 {
    round_f64_to_i32(grade * f64::from(crate::constants::GRADE_SCALE))
}

/// Convert a usize count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}
