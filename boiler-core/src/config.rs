//! Timing constants, the runtime-adjustable operation duration, and the
//! deployment pin map.

use core::fmt;

use crate::channel::{CHANNEL_COUNT, ChannelId};

/// Quiet window inserted before every operation.
pub const SETTLE_DELAY_MS: u32 = 3_000;
/// Hold time after which a press is classified as a cancel.
pub const LONG_PRESS_MS: u32 = 3_000;
/// Presses released within this window are treated as contact bounce.
pub const DEBOUNCE_MS: u32 = 50;

pub const MIN_OPERATION_MINUTES: u32 = 20;
pub const MAX_OPERATION_MINUTES: u32 = 60;
pub const DEFAULT_OPERATION_MINUTES: u32 = 30;
pub const MILLIS_PER_MINUTE: u32 = 60_000;

/// Errors reported when reconfiguring the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// Requested duration lies outside the accepted minute range.
    OutOfRange { minutes: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::OutOfRange { minutes } => write!(
                f,
                "operation duration {minutes}min outside {MIN_OPERATION_MINUTES}..={MAX_OPERATION_MINUTES}"
            ),
        }
    }
}

/// Runtime configuration mutated by the serial `timer` command.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Config {
    operation_duration_ms: u32,
}

impl Config {
    /// Boot configuration (30 minute operations).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            operation_duration_ms: DEFAULT_OPERATION_MINUTES * MILLIS_PER_MINUTE,
        }
    }

    /// Time the operation output stays asserted.
    #[must_use]
    pub const fn operation_duration_ms(&self) -> u32 {
        self.operation_duration_ms
    }

    /// Operation duration in whole minutes, as reported to the host.
    #[must_use]
    pub const fn operation_minutes(&self) -> u32 {
        self.operation_duration_ms / MILLIS_PER_MINUTE
    }

    /// Updates the operation duration; out-of-range values leave it unchanged.
    pub fn set_operation_minutes(&mut self, minutes: u32) -> Result<(), ConfigError> {
        if !(MIN_OPERATION_MINUTES..=MAX_OPERATION_MINUTES).contains(&minutes) {
            return Err(ConfigError::OutOfRange { minutes });
        }

        self.operation_duration_ms = minutes * MILLIS_PER_MINUTE;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw hardware pin numbers wired to one channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChannelPins {
    pub button: u8,
    pub control: u8,
    pub operation: u8,
}

impl ChannelPins {
    #[must_use]
    pub const fn new(button: u8, control: u8, operation: u8) -> Self {
        Self {
            button,
            control,
            operation,
        }
    }
}

/// Deployment-time mapping from channels to board pins.
///
/// Only the control pin is visible to the host (in `led <pin> ...` lines);
/// the remaining numbers document the wiring for diagnostics.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PinMap {
    channels: [ChannelPins; CHANNEL_COUNT],
}

impl PinMap {
    /// Wiring of the reference board.
    pub const DEFAULT: Self = Self::new([
        ChannelPins::new(2, 6, 10),
        ChannelPins::new(3, 7, 11),
        ChannelPins::new(4, 8, 12),
        ChannelPins::new(5, 9, 13),
    ]);

    #[must_use]
    pub const fn new(channels: [ChannelPins; CHANNEL_COUNT]) -> Self {
        Self { channels }
    }

    #[must_use]
    pub const fn pins(&self, channel: ChannelId) -> ChannelPins {
        self.channels[channel.as_index()]
    }

    /// Pin number reported in status lines for `channel`.
    #[must_use]
    pub const fn control(&self, channel: ChannelId) -> u8 {
        self.pins(channel).control
    }
}

impl Default for PinMap {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_duration_is_thirty_minutes() {
        let config = Config::new();
        assert_eq!(config.operation_duration_ms(), 1_800_000);
        assert_eq!(config.operation_minutes(), 30);
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut config = Config::new();
        config.set_operation_minutes(20).expect("lower bound accepted");
        assert_eq!(config.operation_duration_ms(), 20 * 60_000);
        config.set_operation_minutes(60).expect("upper bound accepted");
        assert_eq!(config.operation_duration_ms(), 60 * 60_000);
    }

    #[test]
    fn out_of_range_leaves_duration_untouched() {
        let mut config = Config::new();
        assert_eq!(
            config.set_operation_minutes(19),
            Err(ConfigError::OutOfRange { minutes: 19 })
        );
        assert_eq!(
            config.set_operation_minutes(61),
            Err(ConfigError::OutOfRange { minutes: 61 })
        );
        assert_eq!(config.operation_minutes(), DEFAULT_OPERATION_MINUTES);
    }

    #[test]
    fn default_pin_map_matches_reference_board() {
        let pins = PinMap::DEFAULT;
        assert_eq!(pins.control(ChannelId::Master), 6);
        assert_eq!(pins.control(ChannelId::C), 9);
        assert_eq!(pins.pins(ChannelId::B), ChannelPins::new(4, 8, 12));
    }
}
