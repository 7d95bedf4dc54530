//! Queue scheduler driving the per-channel outputs.
//!
//! Short presses enqueue channels; the front of the queue runs after a fixed
//! settle delay for the configured operation duration, then the next channel
//! settles and runs. Master jumps the queue and aborts whatever was active.
//! Long presses cancel a channel wherever it sits.

pub mod queue;

use crate::channel::{CHANNEL_COUNT, ChannelId};
use crate::config::{Config, SETTLE_DELAY_MS};
use crate::input::PressEvent;
use crate::platform::Level;
use crate::serial::status::{StatusLine, StatusSink};
use crate::time::Millis;

pub use queue::{ChannelQueue, EMPTY_SLOT, QUEUE_CAPACITY, QueueError};

/// Lifecycle of the channel at the front of the queue.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Nothing is being processed.
    Idle,
    /// Waiting out the quiet window before the operation starts.
    Settling { since: Millis },
    /// Operation output asserted.
    Running { since: Millis },
}

impl Phase {
    /// Returns `true` while a channel is settling or running.
    #[must_use]
    pub const fn is_processing(self) -> bool {
        !matches!(self, Phase::Idle)
    }
}

/// Output levels owned by one channel.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ChannelOutputs {
    pub control: Level,
    pub operation: Level,
}

/// Output levels for every channel.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Outputs {
    channels: [ChannelOutputs; CHANNEL_COUNT],
}

impl Outputs {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            channels: [ChannelOutputs {
                control: Level::Off,
                operation: Level::Off,
            }; CHANNEL_COUNT],
        }
    }

    #[must_use]
    pub const fn channel(&self, channel: ChannelId) -> ChannelOutputs {
        self.channels[channel.as_index()]
    }

    #[must_use]
    pub const fn control(&self, channel: ChannelId) -> Level {
        self.channel(channel).control
    }

    #[must_use]
    pub const fn operation(&self, channel: ChannelId) -> Level {
        self.channel(channel).operation
    }

    fn set_control(&mut self, channel: ChannelId, level: Level) {
        self.channels[channel.as_index()].control = level;
    }

    fn set_operation(&mut self, channel: ChannelId, level: Level) {
        self.channels[channel.as_index()].operation = level;
    }
}

/// What a handled press did to the queue.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Disposition {
    /// Channel appended at the back.
    Queued,
    /// Master inserted at the front; carries the aborted channel, if any.
    Preempted { aborted: Option<ChannelId> },
    /// Channel already queued; nothing changed.
    Duplicate,
    /// Queue full; press dropped.
    Full,
    /// Active channel stopped and removed.
    Stopped,
    /// Waiting channel removed.
    Removed,
    /// Cancel for a channel that was not queued.
    NotQueued,
}

impl Disposition {
    /// Returns `true` when the queue contents changed.
    #[must_use]
    pub const fn changed_queue(self) -> bool {
        matches!(
            self,
            Disposition::Queued
                | Disposition::Preempted { .. }
                | Disposition::Stopped
                | Disposition::Removed
        )
    }
}

/// Transition observed while advancing the scheduler.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Transition {
    /// Front channel began its settle window.
    Settling(ChannelId),
    /// Front channel's operation output turned on.
    Started(ChannelId),
    /// Front channel finished and left the queue.
    Completed(ChannelId),
}

/// Transitions produced by one `advance` call (completion plus next settle).
pub type Transitions = heapless::Vec<Transition, 3>;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
struct ChannelSlot {
    queued: bool,
}

/// FIFO scheduler owning the queue, the phase timers, and the outputs.
#[derive(Clone, Debug)]
pub struct Scheduler {
    queue: ChannelQueue,
    phase: Phase,
    current: ChannelId,
    channels: [ChannelSlot; CHANNEL_COUNT],
    outputs: Outputs,
}

impl Scheduler {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            queue: ChannelQueue::new(),
            phase: Phase::Idle,
            current: ChannelId::Master,
            channels: [ChannelSlot { queued: false }; CHANNEL_COUNT],
            outputs: Outputs::new(),
        }
    }

    #[must_use]
    pub const fn queue(&self) -> &ChannelQueue {
        &self.queue
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn is_processing(&self) -> bool {
        self.phase.is_processing()
    }

    /// Channel most recently dispatched from the front of the queue.
    #[must_use]
    pub const fn current(&self) -> ChannelId {
        self.current
    }

    #[must_use]
    pub const fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    /// Per-channel "queued or in progress" flag.
    ///
    /// A channel aborted by Master keeps its queue position but loses this
    /// flag while its control LED stays lit.
    #[must_use]
    pub const fn is_queued(&self, channel: ChannelId) -> bool {
        self.channels[channel.as_index()].queued
    }

    /// Applies one press event.
    pub fn handle<S>(&mut self, event: PressEvent, sink: &mut S) -> Disposition
    where
        S: StatusSink,
    {
        match event {
            PressEvent::Short(channel) => self.enqueue(channel, sink),
            PressEvent::Long(channel) => self.cancel(channel, sink),
        }
    }

    fn enqueue<S: StatusSink>(&mut self, channel: ChannelId, sink: &mut S) -> Disposition {
        if self.queue.contains(channel) {
            return Disposition::Duplicate;
        }

        let disposition = if channel.is_master() {
            if self.queue.push_front(channel).is_err() {
                return Disposition::Full;
            }
            let aborted = self.abort_active();
            Disposition::Preempted { aborted }
        } else {
            if self.queue.push_back(channel).is_err() {
                return Disposition::Full;
            }
            Disposition::Queued
        };

        self.channels[channel.as_index()].queued = true;
        self.set_control(channel, Level::On, sink);
        disposition
    }

    /// Stops the active operation without touching its control LED or queue slot.
    fn abort_active(&mut self) -> Option<ChannelId> {
        if !self.phase.is_processing() {
            return None;
        }

        let aborted = self.current;
        self.outputs.set_operation(aborted, Level::Off);
        self.channels[aborted.as_index()].queued = false;
        self.phase = Phase::Idle;
        Some(aborted)
    }

    fn cancel<S: StatusSink>(&mut self, channel: ChannelId, sink: &mut S) -> Disposition {
        let disposition = if self.queue.front() == Some(channel) {
            // A front entry is always being processed once dispatch has run;
            // the idle case only arises for an entry queued earlier this tick.
            if self.phase.is_processing() {
                self.outputs.set_operation(channel, Level::Off);
                self.phase = Phase::Idle;
            }
            self.queue.pop_front();
            Disposition::Stopped
        } else if self.queue.remove_after_front(channel) {
            Disposition::Removed
        } else {
            Disposition::NotQueued
        };

        self.set_control(channel, Level::Off, sink);
        self.channels[channel.as_index()].queued = false;
        disposition
    }

    /// Advances settle and operation timers and dispatches the next channel.
    pub fn advance<S>(&mut self, now: Millis, config: &Config, sink: &mut S) -> Transitions
    where
        S: StatusSink,
    {
        let mut transitions = Transitions::new();

        if let Phase::Settling { since } = self.phase {
            if now.elapsed_since(since) < SETTLE_DELAY_MS {
                return transitions;
            }

            self.phase = Phase::Running { since: now };
            self.outputs.set_operation(self.current, Level::On);
            let _ = transitions.push(Transition::Started(self.current));
        }

        if let Phase::Running { since } = self.phase
            && now.elapsed_since(since) >= config.operation_duration_ms()
        {
            let finished = self.current;
            self.outputs.set_operation(finished, Level::Off);
            self.set_control(finished, Level::Off, sink);
            self.channels[finished.as_index()].queued = false;
            self.queue.pop_front();
            self.phase = Phase::Idle;
            let _ = transitions.push(Transition::Completed(finished));
        }

        if !self.phase.is_processing()
            && let Some(front) = self.queue.front()
        {
            self.current = front;
            self.phase = Phase::Settling { since: now };
            let _ = transitions.push(Transition::Settling(front));
        }

        transitions
    }

    fn set_control<S: StatusSink>(&mut self, channel: ChannelId, level: Level, sink: &mut S) {
        self.outputs.set_control(channel, level);
        sink.emit(StatusLine::Led { channel, level });
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
