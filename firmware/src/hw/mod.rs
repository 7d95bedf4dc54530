//! Board bindings for the controller's `Platform` capability.

#![cfg(target_os = "none")]

use boiler_core::channel::{CHANNEL_COUNT, ChannelId};
use boiler_core::input::PinLevel;
use boiler_core::platform::{Level, OutputLine, Platform};
use embassy_stm32::gpio::{self, Input, Output};

use crate::serial::SerialLink;

/// The three GPIO lines of one channel.
pub struct ChannelIo<'d> {
    pub button: Input<'d>,
    pub control: Output<'d>,
    pub operation: Output<'d>,
}

/// GPIO plus the serial queues, as seen by the control loop.
pub struct BoardPlatform<'d> {
    channels: [ChannelIo<'d>; CHANNEL_COUNT],
    link: &'static SerialLink,
}

impl<'d> BoardPlatform<'d> {
    pub fn new(channels: [ChannelIo<'d>; CHANNEL_COUNT], link: &'static SerialLink) -> Self {
        Self { channels, link }
    }

    pub fn link(&self) -> &'static SerialLink {
        self.link
    }

    fn io_mut(&mut self, channel: ChannelId) -> &mut ChannelIo<'d> {
        &mut self.channels[channel.as_index()]
    }
}

impl Platform for BoardPlatform<'_> {
    fn sample(&mut self, channel: ChannelId) -> PinLevel {
        PinLevel::from_active_low(self.io_mut(channel).button.is_high())
    }

    fn drive(&mut self, channel: ChannelId, line: OutputLine, level: Level) {
        let io = self.io_mut(channel);
        let output = match line {
            OutputLine::Control => &mut io.control,
            OutputLine::Operation => &mut io.operation,
        };
        output.set_level(if level.is_on() {
            gpio::Level::High
        } else {
            gpio::Level::Low
        });
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.link.try_next_byte()
    }

    fn transmit(&mut self, line: &[u8]) {
        // Overflow is counted by the link and logged by the control task.
        let _ = self.link.queue_line(line);
    }

    fn can_transmit(&self, lines: usize) -> bool {
        self.link.tx_free() >= lines
    }
}
