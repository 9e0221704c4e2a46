//! Decisecond time handling
//!
//! Clip bounds are stored as whole deciseconds (tenths of a second) so that
//! repeated slider adjustments never accumulate float drift, and so command
//! arguments render in one stable, locale-independent format.

/// Convert seconds to deciseconds, rounding to the nearest tenth.
///
/// Returns `None` for negative or non-finite input.
pub fn to_deciseconds(seconds: f64) -> Option<u32> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some((seconds * 10.0).round() as u32)
}

/// Convert seconds to deciseconds, truncating toward zero.
///
/// Used for durations: rounding up could let a clip bound exceed the real
/// media length.
pub fn to_deciseconds_floor(seconds: f64) -> Option<u32> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some((seconds * 10.0).floor() as u32)
}

/// Deciseconds back to seconds.
pub fn to_seconds(deciseconds: u32) -> f64 {
    f64::from(deciseconds) / 10.0
}

/// Render deciseconds as fixed-point seconds with exactly one decimal place.
///
/// This is the stable numeric format used for engine command arguments:
/// always a `.` separator, never scientific notation, never locale-dependent.
pub fn format_deciseconds(deciseconds: u32) -> String {
    format!("{}.{}", deciseconds / 10, deciseconds % 10)
}
