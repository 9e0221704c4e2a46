//! Clip range model
//!
//! Holds the user-selectable interval `[start, end]` bounded by the current
//! media duration. Bounds are stored as deciseconds (see `utils::time`) so
//! repeated adjustments stay exact; callers interact in plain seconds.

use serde::Serialize;

use crate::error::RangeError;
use crate::utils::time;

/// A selected clip interval, fixed to decisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClipRange {
    start_ds: u32,
    end_ds: u32,
}

impl ClipRange {
    /// Start bound in seconds.
    pub fn start_seconds(&self) -> f64 {
        time::to_seconds(self.start_ds)
    }

    /// End bound in seconds.
    pub fn end_seconds(&self) -> f64 {
        time::to_seconds(self.end_ds)
    }

    /// Start bound in deciseconds.
    pub fn start_deciseconds(&self) -> u32 {
        self.start_ds
    }

    /// End bound in deciseconds.
    pub fn end_deciseconds(&self) -> u32 {
        self.end_ds
    }

    /// Clip length in seconds. Zero-length ranges are legal.
    pub fn len_seconds(&self) -> f64 {
        time::to_seconds(self.end_ds - self.start_ds)
    }
}

/// Mutable model for the selectable clip interval.
///
/// Invariant: `0 <= start <= end <= duration` at all times. A new duration
/// (new media selected) resets the range to `[0, min(5, duration)]`; rejected
/// updates leave the previous range untouched.
#[derive(Debug, Clone)]
pub struct ClipRangeModel {
    duration_seconds: f64,
    duration_ds: u32,
    range: ClipRange,
}

impl ClipRangeModel {
    /// Create a model with no media loaded (duration zero).
    pub fn new() -> Self {
        Self {
            duration_seconds: 0.0,
            duration_ds: 0,
            range: ClipRange {
                start_ds: 0,
                end_ds: 0,
            },
        }
    }

    /// Install a new media duration and reset the range to `[0, min(5, d)]`.
    ///
    /// Called exactly once per newly ingested `SourceMedia`. Negative or
    /// non-finite durations are treated as zero.
    pub fn set_duration(&mut self, duration_seconds: f64) {
        let duration_ds = time::to_deciseconds_floor(duration_seconds).unwrap_or(0);
        self.duration_seconds = if duration_seconds.is_finite() && duration_seconds > 0.0 {
            duration_seconds
        } else {
            0.0
        };
        self.duration_ds = duration_ds;
        self.range = ClipRange {
            start_ds: 0,
            end_ds: duration_ds.min(50),
        };
    }

    /// Update the selected range, in seconds.
    ///
    /// Rejects inverted or out-of-bounds input without touching the current
    /// range. Accepted values are snapped to deciseconds and clamped so the
    /// end never lands past the stored duration.
    pub fn set_range(&mut self, start: f64, end: f64) -> Result<(), RangeError> {
        let (start_ds, end_ds) = match (time::to_deciseconds(start), time::to_deciseconds(end)) {
            (Some(s), Some(e)) => (s, e),
            _ => {
                return Err(RangeError::OutOfBounds {
                    start,
                    end,
                    duration: self.duration_seconds,
                })
            }
        };
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        if end > self.duration_seconds {
            return Err(RangeError::OutOfBounds {
                start,
                end,
                duration: self.duration_seconds,
            });
        }

        let end_ds = end_ds.min(self.duration_ds);
        let start_ds = start_ds.min(end_ds);
        self.range = ClipRange { start_ds, end_ds };
        Ok(())
    }

    /// Current selected range.
    pub fn current(&self) -> ClipRange {
        self.range
    }

    /// Slider bounds for the presentation layer: `(0, duration)` in seconds.
    pub fn bounds(&self) -> (f64, f64) {
        (0.0, self.duration_seconds)
    }

    /// Duration of the current media in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }
}

impl Default for ClipRangeModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_model_is_empty() {
        let model = ClipRangeModel::new();
        assert_eq!(model.current().start_seconds(), 0.0);
        assert_eq!(model.current().end_seconds(), 0.0);
        assert_eq!(model.bounds(), (0.0, 0.0));
    }

    #[test]
    fn set_duration_resets_to_zero_to_five() {
        let mut model = ClipRangeModel::new();
        model.set_duration(10.0);
        assert_eq!(model.current().start_seconds(), 0.0);
        assert_eq!(model.current().end_seconds(), 5.0);
        assert_eq!(model.bounds(), (0.0, 10.0));
    }

    #[test]
    fn set_duration_caps_default_at_short_media() {
        let mut model = ClipRangeModel::new();
        model.set_duration(3.0);
        assert_eq!(model.current().end_seconds(), 3.0);

        model.set_duration(0.0);
        assert_eq!(model.current().end_seconds(), 0.0);
    }

    #[test]
    fn set_duration_ignores_garbage() {
        let mut model = ClipRangeModel::new();
        model.set_duration(f64::NAN);
        assert_eq!(model.bounds(), (0.0, 0.0));
        model.set_duration(-4.0);
        assert_eq!(model.bounds(), (0.0, 0.0));
    }

    #[test]
    fn valid_range_round_trips_exactly() {
        let mut model = ClipRangeModel::new();
        model.set_duration(10.0);
        model.set_range(1.5, 4.2).unwrap();
        assert_eq!(model.current().start_seconds(), 1.5);
        assert_eq!(model.current().end_seconds(), 4.2);
    }

    #[test]
    fn repeated_no_op_sets_do_not_drift() {
        let mut model = ClipRangeModel::new();
        model.set_duration(10.0);
        for _ in 0..100 {
            let current = model.current();
            model
                .set_range(current.start_seconds(), current.end_seconds())
                .unwrap();
        }
        assert_eq!(model.current().start_seconds(), 0.0);
        assert_eq!(model.current().end_seconds(), 5.0);
    }

    #[test]
    fn zero_length_range_is_accepted() {
        let mut model = ClipRangeModel::new();
        model.set_duration(10.0);
        model.set_range(3.2, 3.2).unwrap();
        assert_eq!(model.current().start_seconds(), 3.2);
        assert_eq!(model.current().end_seconds(), 3.2);
        assert_eq!(model.current().len_seconds(), 0.0);
    }

    #[test]
    fn full_span_range_is_accepted() {
        let mut model = ClipRangeModel::new();
        model.set_duration(10.0);
        model.set_range(0.0, 10.0).unwrap();
        assert_eq!(model.current().end_seconds(), 10.0);
    }

    #[test]
    fn inverted_range_is_rejected_and_previous_kept() {
        let mut model = ClipRangeModel::new();
        model.set_duration(10.0);
        model.set_range(2.0, 8.0).unwrap();

        let err = model.set_range(8.0, 2.0).unwrap_err();
        assert!(matches!(err, RangeError::Inverted { .. }));
        assert_eq!(model.current().start_seconds(), 2.0);
        assert_eq!(model.current().end_seconds(), 8.0);
    }

    #[test]
    fn out_of_bounds_range_is_rejected_and_previous_kept() {
        let mut model = ClipRangeModel::new();
        model.set_duration(10.0);
        model.set_range(2.0, 8.0).unwrap();

        assert!(matches!(
            model.set_range(-1.0, 5.0),
            Err(RangeError::OutOfBounds { .. })
        ));
        assert!(matches!(
            model.set_range(5.0, 10.5),
            Err(RangeError::OutOfBounds { .. })
        ));
        assert!(matches!(
            model.set_range(f64::NAN, 5.0),
            Err(RangeError::OutOfBounds { .. })
        ));
        assert_eq!(model.current().start_seconds(), 2.0);
        assert_eq!(model.current().end_seconds(), 8.0);
    }

    #[test]
    fn rejection_is_idempotent() {
        let mut model = ClipRangeModel::new();
        model.set_duration(10.0);
        let before = model.current();
        for _ in 0..5 {
            let _ = model.set_range(9.0, 3.0);
        }
        assert_eq!(model.current(), before);
    }

    #[test]
    fn end_clamped_to_decisecond_floor_of_duration() {
        let mut model = ClipRangeModel::new();
        model.set_duration(10.06);
        // 10.06s floors to 100 deciseconds; a request right at the raw
        // duration snaps down rather than overshooting the stored bound.
        model.set_range(0.0, 10.06).unwrap();
        assert_eq!(model.current().end_deciseconds(), 100);
    }
}
