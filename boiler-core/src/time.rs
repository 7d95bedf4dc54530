//! Monotonic millisecond timestamps.
//!
//! The platform counter is a 32-bit quantity that wraps roughly every 49.7
//! days. Only differences between two readings are ever compared, always via
//! wrapping subtraction, so the wrap is invisible to the state machines.

use core::fmt;
use core::ops::Add;

/// Reading of the platform's free-running millisecond counter.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Millis(u32);

impl Millis {
    /// Counter value at boot.
    pub const ZERO: Self = Self(0);

    /// Wraps a raw counter reading.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Truncates a wider timestamp to the 32-bit counter width.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_u64(raw: u64) -> Self {
        Self(raw as u32)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`, tolerant of counter wrap.
    #[must_use]
    pub const fn elapsed_since(self, earlier: Millis) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }
}

impl Add<u32> for Millis {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        Self(self.0.wrapping_add(rhs))
    }
}

impl From<u32> for Millis {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_plain_difference_without_wrap() {
        let start = Millis::new(1_000);
        assert_eq!(Millis::new(4_000).elapsed_since(start), 3_000);
    }

    #[test]
    fn elapsed_survives_counter_wrap() {
        let start = Millis::new(u32::MAX - 99);
        let now = start + 3_000;
        assert_eq!(now.as_u32(), 2_900);
        assert_eq!(now.elapsed_since(start), 3_000);
    }

    #[test]
    fn from_u64_keeps_low_bits() {
        let raw = u64::from(u32::MAX) + 6;
        assert_eq!(Millis::from_u64(raw), Millis::new(5));
    }
}
