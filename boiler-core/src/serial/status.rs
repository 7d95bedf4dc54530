//! Status lines mirrored to the host.
//!
//! The scheduler and the serial command handler both report through a
//! [`StatusSink`]; [`StatusFormatter`] keeps the textual rendering consistent
//! across firmware and host front-ends.

use core::fmt;

use heapless::{Deque, String};

use crate::channel::ChannelId;
use crate::config::PinMap;
use crate::platform::Level;

/// Longest rendered status line (`timer 60\n`, `led 255 off\n`).
pub const MAX_STATUS_LINE: usize = 16;

/// Number of status lines buffered between two flushes.
pub const OUTBOX_CAPACITY: usize = 16;

/// Rendered status line ready for transmission.
pub type StatusText = String<MAX_STATUS_LINE>;

/// Structured status emission.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatusLine {
    /// Control LED transition (or `init` report) for a channel.
    Led { channel: ChannelId, level: Level },
    /// Configured operation duration in minutes.
    Timer { minutes: u32 },
}

/// Receiver for status emissions.
pub trait StatusSink {
    fn emit(&mut self, line: StatusLine);
}

/// Sink that discards everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopStatusSink;

impl StatusSink for NoopStatusSink {
    fn emit(&mut self, _: StatusLine) {}
}

/// Bounded transmit queue shared by the scheduler and the command handler.
#[derive(Clone, Debug, Default)]
pub struct Outbox {
    lines: Deque<StatusLine, OUTBOX_CAPACITY>,
    dropped: u32,
}

impl Outbox {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Deque::new(),
            dropped: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Slots left before further lines are dropped.
    #[must_use]
    pub fn free(&self) -> usize {
        OUTBOX_CAPACITY - self.lines.len()
    }

    /// Returns and clears the number of lines discarded because the outbox
    /// was full.
    pub fn take_dropped(&mut self) -> u32 {
        core::mem::take(&mut self.dropped)
    }

    /// Removes the oldest pending line.
    pub fn pop(&mut self) -> Option<StatusLine> {
        self.lines.pop_front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusLine> {
        self.lines.iter()
    }
}

impl StatusSink for Outbox {
    fn emit(&mut self, line: StatusLine) {
        if self.lines.push_back(line).is_err() {
            self.dropped = self.dropped.saturating_add(1);
        }
    }
}

/// Helper that renders [`StatusLine`]s using the board's pin numbers.
#[derive(Copy, Clone, Debug)]
pub struct StatusFormatter<'a> {
    pins: &'a PinMap,
}

impl<'a> StatusFormatter<'a> {
    #[must_use]
    pub const fn new(pins: &'a PinMap) -> Self {
        Self { pins }
    }

    /// Writes the line including its trailing `\n`.
    pub fn write_line<W: fmt::Write>(&self, line: &StatusLine, writer: &mut W) -> fmt::Result {
        match line {
            StatusLine::Led { channel, level } => {
                writeln!(writer, "led {} {}", self.pins.control(*channel), level)
            }
            StatusLine::Timer { minutes } => writeln!(writer, "timer {minutes}"),
        }
    }

    /// Renders the line into a fixed-size buffer.
    pub fn render(&self, line: &StatusLine) -> Result<StatusText, fmt::Error> {
        let mut text = StatusText::new();
        self.write_line(line, &mut text)?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn led_lines_use_control_pin_numbers() {
        let pins = PinMap::DEFAULT;
        let formatter = StatusFormatter::new(&pins);
        let on = formatter
            .render(&StatusLine::Led {
                channel: ChannelId::A,
                level: Level::On,
            })
            .expect("fits");
        assert_eq!(on.as_str(), "led 7 on\n");

        let off = formatter
            .render(&StatusLine::Led {
                channel: ChannelId::Master,
                level: Level::Off,
            })
            .expect("fits");
        assert_eq!(off.as_str(), "led 6 off\n");
    }

    #[test]
    fn timer_line_reports_minutes() {
        let pins = PinMap::DEFAULT;
        let rendered = StatusFormatter::new(&pins)
            .render(&StatusLine::Timer { minutes: 45 })
            .expect("fits");
        assert_eq!(rendered.as_str(), "timer 45\n");
    }

    #[test]
    fn outbox_counts_overflow_instead_of_growing() {
        let mut outbox = Outbox::new();
        for minutes in 0..=OUTBOX_CAPACITY as u32 {
            outbox.emit(StatusLine::Timer { minutes });
        }
        assert_eq!(outbox.len(), OUTBOX_CAPACITY);
        assert_eq!(outbox.free(), 0);
        assert_eq!(outbox.take_dropped(), 1);
        assert_eq!(outbox.take_dropped(), 0);
        assert_eq!(outbox.pop(), Some(StatusLine::Timer { minutes: 0 }));
    }
}
