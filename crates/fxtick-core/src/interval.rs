//! Interval clamping

use std::fmt;

/// Timer interval in logical-time units, always within `[1, 2^31 - 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval(u32);

impl Interval {
    pub const MIN: Interval = Interval(1);
    pub const MAX: Interval = Interval(i32::MAX as u32);

    /// Clamp a script-supplied interval.
    ///
    /// Absent, NaN, zero and negative values map to [`Interval::MIN`];
    /// fractional values are floored; anything past the top (including
    /// +infinity) maps to [`Interval::MAX`].
    pub fn clamp(ticks: Option<f64>) -> Self {
        let Some(ticks) = ticks else {
            return Self::MIN;
        };
        if ticks.is_nan() || ticks < 1.0 {
            return Self::MIN;
        }
        if ticks >= Self::MAX.0 as f64 {
            return Self::MAX;
        }
        // In range and >= 1, so the cast cannot truncate past u32
        Self(ticks.floor() as u32)
    }

    pub const fn ticks(self) -> u32 {
        self.0
    }

    /// Firing rule: strictly more than the interval must have elapsed.
    pub const fn is_due(self, elapsed: u64) -> bool {
        elapsed > self.0 as u64
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_defaults_to_min() {
        assert_eq!(Interval::clamp(None), Interval::MIN);
        assert_eq!(Interval::clamp(Some(0.0)), Interval::MIN);
        assert_eq!(Interval::clamp(Some(-25.0)), Interval::MIN);
        assert_eq!(Interval::clamp(Some(f64::NAN)), Interval::MIN);
        assert_eq!(Interval::clamp(Some(f64::NEG_INFINITY)), Interval::MIN);
        assert_eq!(Interval::clamp(Some(0.7)), Interval::MIN);
    }

    #[test]
    fn test_clamp_floors() {
        assert_eq!(Interval::clamp(Some(16.9)).ticks(), 16);
        assert_eq!(Interval::clamp(Some(1.0)).ticks(), 1);
    }

    #[test]
    fn test_clamp_upper_bound() {
        assert_eq!(Interval::clamp(Some(2_147_483_647.0)).ticks(), 2_147_483_647);
        assert_eq!(Interval::clamp(Some(1e12)), Interval::MAX);
        assert_eq!(Interval::clamp(Some(f64::INFINITY)), Interval::MAX);
    }

    #[test]
    fn test_is_due_is_strict() {
        let interval = Interval::clamp(Some(5.0));
        assert!(!interval.is_due(4));
        assert!(!interval.is_due(5));
        assert!(interval.is_due(6));
    }
}
