//! Press discriminator turning raw button samples into semantic events.
//!
//! Each button is sampled once per super-loop iteration. A release that
//! arrives after the debounce window and before the long-press threshold is a
//! short press; holding past the threshold emits a single long press and the
//! eventual release is swallowed. Releases inside the debounce window are
//! treated as contact bounce and ignored entirely.

use heapless::Vec;

use crate::channel::{ALL_CHANNELS, CHANNEL_COUNT, ChannelId};
use crate::config::{DEBOUNCE_MS, LONG_PRESS_MS};
use crate::time::Millis;

/// Debounced reading of one active-low button input.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PinLevel {
    Pressed,
    Released,
}

impl PinLevel {
    /// Converts a raw pin reading where a pulled-up idle line reads high.
    #[must_use]
    pub const fn from_active_low(raw_high: bool) -> Self {
        if raw_high {
            PinLevel::Released
        } else {
            PinLevel::Pressed
        }
    }

    #[must_use]
    pub const fn is_pressed(self) -> bool {
        matches!(self, PinLevel::Pressed)
    }
}

/// Semantic press classification consumed by the scheduler.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PressEvent {
    /// Enqueue request.
    Short(ChannelId),
    /// Cancel request.
    Long(ChannelId),
}

impl PressEvent {
    #[must_use]
    pub const fn channel(self) -> ChannelId {
        match self {
            PressEvent::Short(channel) | PressEvent::Long(channel) => channel,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum HoldState {
    Idle,
    Held { since: Millis, long_handled: bool },
}

/// Press bookkeeping for a single channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ButtonInput {
    channel: ChannelId,
    state: HoldState,
    last_press: Option<Millis>,
}

impl ButtonInput {
    #[must_use]
    pub const fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            state: HoldState::Idle,
            last_press: None,
        }
    }

    #[must_use]
    pub const fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Returns `true` while the button is considered held.
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        matches!(self.state, HoldState::Held { .. })
    }

    /// Timestamp at which the current hold started.
    #[must_use]
    pub const fn hold_start(&self) -> Option<Millis> {
        match self.state {
            HoldState::Held { since, .. } => Some(since),
            HoldState::Idle => None,
        }
    }

    /// Returns `true` once the current hold has produced its long press.
    #[must_use]
    pub const fn long_handled(&self) -> bool {
        matches!(
            self.state,
            HoldState::Held {
                long_handled: true,
                ..
            }
        )
    }

    /// Release timestamp of the last accepted short press.
    #[must_use]
    pub const fn last_press(&self) -> Option<Millis> {
        self.last_press
    }

    /// Feeds one sample and returns the event it completes, if any.
    pub fn sample(&mut self, level: PinLevel, now: Millis) -> Option<PressEvent> {
        match (self.state, level) {
            (HoldState::Idle, PinLevel::Pressed) => {
                self.state = HoldState::Held {
                    since: now,
                    long_handled: false,
                };
                None
            }
            (HoldState::Idle, PinLevel::Released) => None,
            (
                HoldState::Held {
                    since,
                    long_handled: false,
                },
                PinLevel::Pressed,
            ) if now.elapsed_since(since) > LONG_PRESS_MS => {
                self.state = HoldState::Held {
                    since,
                    long_handled: true,
                };
                Some(PressEvent::Long(self.channel))
            }
            (HoldState::Held { .. }, PinLevel::Pressed) => None,
            (
                HoldState::Held {
                    since,
                    long_handled,
                },
                PinLevel::Released,
            ) => {
                self.state = HoldState::Idle;
                if !long_handled && now.elapsed_since(since) > DEBOUNCE_MS {
                    self.last_press = Some(now);
                    Some(PressEvent::Short(self.channel))
                } else {
                    None
                }
            }
        }
    }
}

/// Events produced by one polling pass over every button.
pub type PollEvents = Vec<PressEvent, CHANNEL_COUNT>;

/// Discriminators for all four buttons.
#[derive(Clone, Debug)]
pub struct InputBank {
    buttons: [ButtonInput; CHANNEL_COUNT],
}

impl InputBank {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buttons: [
                ButtonInput::new(ChannelId::Master),
                ButtonInput::new(ChannelId::A),
                ButtonInput::new(ChannelId::B),
                ButtonInput::new(ChannelId::C),
            ],
        }
    }

    #[must_use]
    pub fn button(&self, channel: ChannelId) -> &ButtonInput {
        &self.buttons[channel.as_index()]
    }

    /// Samples every channel in index order using `read` for the pin level.
    pub fn poll<F>(&mut self, now: Millis, mut read: F) -> PollEvents
    where
        F: FnMut(ChannelId) -> PinLevel,
    {
        let mut events = PollEvents::new();
        for channel in ALL_CHANNELS {
            let level = read(channel);
            if let Some(event) = self.buttons[channel.as_index()].sample(level, now) {
                // One event per channel at most, so the buffer cannot overflow.
                let _ = events.push(event);
            }
        }
        events
    }
}

impl Default for InputBank {
    fn default() -> Self {
        Self::new()
    }
}
