//! Hardware capability consumed by the super-loop.
//!
//! Firmware implements [`Platform`] over GPIO and a UART; host tests and the
//! emulator implement it over plain arrays so the controller runs without
//! hardware.

use core::fmt;

use crate::channel::ChannelId;
use crate::input::PinLevel;

/// Logical state of an output line.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Level {
    On,
    #[default]
    Off,
}

impl Level {
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Level::On)
    }

    /// Lowercase keyword used on the serial link.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Level::On => "on",
            Level::Off => "off",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The two outputs owned by every channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputLine {
    /// Indicator that the channel is queued or running.
    Control,
    /// Load output asserted during the operation window.
    Operation,
}

/// Abstraction over the board's pins and serial port.
pub trait Platform {
    /// Samples the button for `channel`.
    fn sample(&mut self, channel: ChannelId) -> PinLevel;

    /// Drives one output line.
    fn drive(&mut self, channel: ChannelId, line: OutputLine, level: Level);

    /// Returns the next received serial byte without blocking.
    fn read_byte(&mut self) -> Option<u8>;

    /// Queues one complete, newline-terminated status line for transmission.
    fn transmit(&mut self, line: &[u8]);

    /// Whether `lines` more status lines can be queued without loss.
    ///
    /// The controller leaves received bytes unread while this is `false`.
    fn can_transmit(&self, lines: usize) -> bool {
        let _ = lines;
        true
    }
}
