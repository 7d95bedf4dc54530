//! Cooperative super-loop tying the press discriminator, the scheduler, and
//! the serial channel to a [`Platform`].
//!
//! One [`Controller::tick`] is one loop iteration. Synthetic events queued by
//! the serial channel on the previous tick are delivered first, then the
//! buttons are polled in channel order, the scheduler advances, changed
//! outputs are driven, received bytes are drained, and finally queued status
//! lines are transmitted. Bytes stay unread while a full `init` reply would
//! not fit in the outbox and the platform's transmit queue.

use heapless::Vec;

use crate::channel::ALL_CHANNELS;
use crate::config::{Config, PinMap};
use crate::input::{InputBank, PressEvent};
use crate::platform::{OutputLine, Platform};
use crate::scheduler::{Disposition, Outputs, Scheduler, Transition, Transitions};
use crate::serial::commands::{
    CommandError, ControlChannel, MAX_COMMAND_LINES, PENDING_CAPACITY,
};
use crate::serial::grammar::Command;
use crate::serial::status::{Outbox, StatusFormatter};
use crate::time::Millis;

/// Upper bound on press events handled in one tick.
pub const MAX_TICK_EVENTS: usize = PENDING_CAPACITY + crate::channel::CHANNEL_COUNT;

/// Serial outcomes recorded per tick; further ones are counted only.
pub const MAX_TICK_COMMANDS: usize = 4;

/// Press event together with what the scheduler did with it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HandledEvent {
    pub event: PressEvent,
    pub disposition: Disposition,
    /// `true` when the event came from the serial channel.
    pub synthetic: bool,
}

/// Summary of one loop iteration for platform-side logging.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TickReport {
    pub events: Vec<HandledEvent, MAX_TICK_EVENTS>,
    pub transitions: Transitions,
    pub commands: Vec<Command, MAX_TICK_COMMANDS>,
    pub rejected: Vec<CommandError, MAX_TICK_COMMANDS>,
    /// Serial outcomes that did not fit in `commands`/`rejected`.
    pub unrecorded: u32,
    /// Status lines transmitted this tick.
    pub transmitted: usize,
    /// Status lines lost to a full outbox this tick.
    pub dropped_status: u32,
}

impl TickReport {
    /// Returns `true` when the queue contents changed during the tick.
    #[must_use]
    pub fn queue_changed(&self) -> bool {
        self.events
            .iter()
            .any(|handled| handled.disposition.changed_queue())
            || self
                .transitions
                .iter()
                .any(|transition| matches!(transition, Transition::Completed(_)))
    }

    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.events.is_empty()
            && self.transitions.is_empty()
            && self.commands.is_empty()
            && self.rejected.is_empty()
            && self.unrecorded == 0
            && self.transmitted == 0
            && self.dropped_status == 0
    }
}

/// Owner of all controller state.
#[derive(Clone, Debug)]
pub struct Controller {
    inputs: InputBank,
    scheduler: Scheduler,
    serial: ControlChannel,
    outbox: Outbox,
    driven: Outputs,
}

impl Controller {
    #[must_use]
    pub const fn new(config: Config, pins: PinMap) -> Self {
        Self {
            inputs: InputBank::new(),
            scheduler: Scheduler::new(),
            serial: ControlChannel::new(config, pins),
            outbox: Outbox::new(),
            driven: Outputs::new(),
        }
    }

    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    #[must_use]
    pub const fn inputs(&self) -> &InputBank {
        &self.inputs
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        self.serial.config()
    }

    #[must_use]
    pub const fn pins(&self) -> &PinMap {
        self.serial.pins()
    }

    /// Forces every output low before the first tick.
    pub fn boot<P: Platform>(&mut self, platform: &mut P) {
        for channel in ALL_CHANNELS {
            let outputs = self.driven.channel(channel);
            platform.drive(channel, OutputLine::Operation, outputs.operation);
            platform.drive(channel, OutputLine::Control, outputs.control);
        }
    }

    /// Runs one super-loop iteration at time `now`.
    pub fn tick<P: Platform>(&mut self, now: Millis, platform: &mut P) -> TickReport {
        let mut report = TickReport::default();

        while let Some(event) = self.serial.take_pending() {
            self.dispatch(event, true, &mut report);
        }

        let polled = self.inputs.poll(now, |channel| platform.sample(channel));
        for event in polled {
            self.dispatch(event, false, &mut report);
        }

        report.transitions = self
            .scheduler
            .advance(now, self.serial.config(), &mut self.outbox);

        self.sync_outputs(platform);

        loop {
            if self.outbox.free() < MAX_COMMAND_LINES {
                report.transmitted += self.flush(platform);
            }
            if !platform.can_transmit(self.outbox.len() + MAX_COMMAND_LINES) {
                break;
            }
            let Some(byte) = platform.read_byte() else {
                break;
            };

            let result = self
                .serial
                .ingest(byte, self.scheduler.outputs(), &mut self.outbox);
            let recorded = match result {
                Ok(None) => continue,
                Ok(Some(command)) => report.commands.push(command).is_ok(),
                Err(err) => report.rejected.push(err).is_ok(),
            };
            if !recorded {
                report.unrecorded = report.unrecorded.saturating_add(1);
            }
        }

        report.transmitted += self.flush(platform);
        report.dropped_status = self.outbox.take_dropped();
        report
    }

    fn dispatch(&mut self, event: PressEvent, synthetic: bool, report: &mut TickReport) {
        let disposition = self.scheduler.handle(event, &mut self.outbox);
        // Bounded by pending capacity plus one event per channel.
        let _ = report.events.push(HandledEvent {
            event,
            disposition,
            synthetic,
        });
    }

    fn sync_outputs<P: Platform>(&mut self, platform: &mut P) {
        let target = *self.scheduler.outputs();
        for channel in ALL_CHANNELS {
            let wanted = target.channel(channel);
            let current = self.driven.channel(channel);
            if wanted.operation != current.operation {
                platform.drive(channel, OutputLine::Operation, wanted.operation);
            }
            if wanted.control != current.control {
                platform.drive(channel, OutputLine::Control, wanted.control);
            }
        }
        self.driven = target;
    }

    fn flush<P: Platform>(&mut self, platform: &mut P) -> usize {
        let formatter = StatusFormatter::new(self.serial.pins());
        let mut transmitted = 0;
        while let Some(line) = self.outbox.pop() {
            if let Ok(text) = formatter.render(&line) {
                platform.transmit(text.as_bytes());
                transmitted += 1;
            }
        }
        transmitted
    }
}
