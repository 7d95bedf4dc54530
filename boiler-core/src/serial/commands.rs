//! Execution of serial command lines.
//!
//! [`ControlChannel`] owns the receive buffer and the runtime configuration.
//! It never touches the scheduler directly; `master on|off` become synthetic
//! press events that the controller forwards on the next tick.

use core::fmt;

use heapless::Deque;

use crate::channel::{ALL_CHANNELS, CHANNEL_COUNT, ChannelId};
use crate::config::{Config, ConfigError, PinMap};
use crate::input::PressEvent;
use crate::scheduler::Outputs;
use crate::serial::grammar::{self, Command, Switch};
use crate::serial::line::{LineBuffer, LineError};
use crate::serial::status::{StatusLine, StatusSink};

/// Synthetic events buffered between two ticks.
pub const PENDING_CAPACITY: usize = 4;

/// Most status lines a single command emits (`init`).
pub const MAX_COMMAND_LINES: usize = CHANNEL_COUNT + 1;

/// Why a received line had no effect. Never reported to the host.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CommandError {
    /// Line assembly failed.
    Line(LineError),
    /// Payload was not valid UTF-8.
    Encoding,
    /// Lexer or grammar rejected the line.
    Unrecognized,
    /// `timer` argument outside the accepted range.
    Config(ConfigError),
    /// Too many synthetic events queued for the next tick.
    PendingFull,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Line(err) => err.fmt(f),
            CommandError::Encoding => f.write_str("line is not valid utf-8"),
            CommandError::Unrecognized => f.write_str("unrecognized command"),
            CommandError::Config(err) => err.fmt(f),
            CommandError::PendingFull => f.write_str("synthetic event queue full"),
        }
    }
}

impl From<LineError> for CommandError {
    fn from(err: LineError) -> Self {
        CommandError::Line(err)
    }
}

impl From<ConfigError> for CommandError {
    fn from(err: ConfigError) -> Self {
        CommandError::Config(err)
    }
}

/// Serial command endpoint.
#[derive(Clone, Debug)]
pub struct ControlChannel {
    line: LineBuffer,
    config: Config,
    pins: PinMap,
    pending: Deque<PressEvent, PENDING_CAPACITY>,
}

impl ControlChannel {
    #[must_use]
    pub const fn new(config: Config, pins: PinMap) -> Self {
        Self {
            line: LineBuffer::new(),
            config,
            pins,
            pending: Deque::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn pins(&self) -> &PinMap {
        &self.pins
    }

    /// Feeds one received byte.
    ///
    /// Returns the command executed when `byte` completes a valid line.
    pub fn ingest<S>(
        &mut self,
        byte: u8,
        outputs: &Outputs,
        sink: &mut S,
    ) -> Result<Option<Command>, CommandError>
    where
        S: StatusSink,
    {
        let Some(line) = self.line.ingest(byte)? else {
            return Ok(None);
        };
        let text = line.as_str().map_err(|_| CommandError::Encoding)?;
        let command = grammar::parse(text).map_err(|_| CommandError::Unrecognized)?;
        self.execute(command, outputs, sink)?;
        Ok(Some(command))
    }

    /// Applies an already parsed command.
    pub fn execute<S>(
        &mut self,
        command: Command,
        outputs: &Outputs,
        sink: &mut S,
    ) -> Result<(), CommandError>
    where
        S: StatusSink,
    {
        match command {
            Command::Init => {
                for channel in ALL_CHANNELS {
                    sink.emit(StatusLine::Led {
                        channel,
                        level: outputs.control(channel),
                    });
                }
                sink.emit(StatusLine::Timer {
                    minutes: self.config.operation_minutes(),
                });
            }
            Command::Master(switch) => {
                let event = match switch {
                    Switch::On => PressEvent::Short(ChannelId::Master),
                    Switch::Off => PressEvent::Long(ChannelId::Master),
                };
                self.pending
                    .push_back(event)
                    .map_err(|_| CommandError::PendingFull)?;
            }
            Command::Timer(minutes) => self.config.set_operation_minutes(minutes)?,
        }
        Ok(())
    }

    /// Removes the oldest synthetic event awaiting delivery.
    pub fn take_pending(&mut self) -> Option<PressEvent> {
        self.pending.pop_front()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MILLIS_PER_MINUTE;
    use crate::platform::Level;
    use crate::serial::status::{NoopStatusSink, Outbox};

    fn send(
        channel: &mut ControlChannel,
        line: &[u8],
        sink: &mut impl StatusSink,
    ) -> Result<Option<Command>, CommandError> {
        let outputs = Outputs::new();
        let mut last = Ok(None);
        for byte in line {
            let result = channel.ingest(*byte, &outputs, sink);
            if !matches!(result, Ok(None)) {
                last = result;
            }
        }
        last
    }

    #[test]
    fn init_reports_leds_then_timer() {
        let mut channel = ControlChannel::new(Config::new(), PinMap::DEFAULT);
        let mut outbox = Outbox::new();
        assert_eq!(
            send(&mut channel, b"init\n", &mut outbox),
            Ok(Some(Command::Init))
        );

        assert_eq!(outbox.len(), 5);
        for expected in ALL_CHANNELS {
            assert_eq!(
                outbox.pop(),
                Some(StatusLine::Led {
                    channel: expected,
                    level: Level::Off
                })
            );
        }
        assert_eq!(outbox.pop(), Some(StatusLine::Timer { minutes: 30 }));
    }

    #[test]
    fn master_commands_become_pending_events() {
        let mut channel = ControlChannel::new(Config::new(), PinMap::DEFAULT);
        let mut sink = NoopStatusSink;
        send(&mut channel, b"master on\r\nmaster off\r\n", &mut sink).expect("accepted");

        assert_eq!(
            channel.take_pending(),
            Some(PressEvent::Short(ChannelId::Master))
        );
        assert_eq!(
            channel.take_pending(),
            Some(PressEvent::Long(ChannelId::Master))
        );
        assert_eq!(channel.take_pending(), None);
    }

    #[test]
    fn timer_updates_only_inside_range() {
        let mut channel = ControlChannel::new(Config::new(), PinMap::DEFAULT);
        let mut outbox = Outbox::new();
        let default_ms = channel.config().operation_duration_ms();

        assert!(matches!(
            send(&mut channel, b"timer 10\n", &mut outbox),
            Err(CommandError::Config(ConfigError::OutOfRange { minutes: 10 }))
        ));
        assert_eq!(channel.config().operation_duration_ms(), default_ms);

        send(&mut channel, b"timer 45\n", &mut outbox).expect("in range");
        assert_eq!(
            channel.config().operation_duration_ms(),
            45 * MILLIS_PER_MINUTE
        );

        assert!(send(&mut channel, b"timer 99\n", &mut outbox).is_err());
        assert_eq!(channel.config().operation_minutes(), 45);
        assert!(outbox.is_empty());
    }

    #[test]
    fn unknown_and_malformed_lines_are_silent() {
        let mut channel = ControlChannel::new(Config::new(), PinMap::DEFAULT);
        let mut outbox = Outbox::new();
        for line in [&b"status\n"[..], b"MASTER on\n", b"master  on\n", b"timer x\n"] {
            assert_eq!(
                send(&mut channel, line, &mut outbox),
                Err(CommandError::Unrecognized)
            );
        }
        assert!(outbox.is_empty());
        assert!(!channel.has_pending());
    }

    #[test]
    fn overlong_line_is_dropped_and_next_line_works() {
        let mut channel = ControlChannel::new(Config::new(), PinMap::DEFAULT);
        let mut sink = NoopStatusSink;
        let overlong = [b'm'; 40];
        assert!(matches!(
            send(&mut channel, &overlong, &mut sink),
            Err(CommandError::Line(LineError::Overflow))
        ));
        send(&mut channel, b"\nmaster on\n", &mut sink).expect("resynced");
        assert!(channel.has_pending());
    }

    #[test]
    fn pending_events_are_bounded() {
        let mut channel = ControlChannel::new(Config::new(), PinMap::DEFAULT);
        let mut sink = NoopStatusSink;
        for _ in 0..PENDING_CAPACITY {
            send(&mut channel, b"master on\n", &mut sink).expect("room");
        }
        assert_eq!(
            send(&mut channel, b"master on\n", &mut sink),
            Err(CommandError::PendingFull)
        );
    }
}
