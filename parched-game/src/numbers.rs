//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert f32 seconds to whole milliseconds, rounding up and clamping negatives to 0.
#[must_use]
pub fn secs_to_millis(value: f32) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let millis = (f64::from(value) * 1000.0).ceil();
    cast::<f64, u64>(millis).unwrap_or(u64::MAX)
}

/// Widen a sprint tick count for decay arithmetic.
#[must_use]
pub fn count_to_f32(value: u32) -> f32 {
    cast::<u32, f32>(value).unwrap_or(f32::MAX)
}
