//! Fixed-capacity FIFO of channel ids.
//!
//! Slots beyond `len` are always empty; removal shifts the tail left and
//! clears the freed slot so a dump never shows stale ids.

use core::fmt;

use crate::channel::{CHANNEL_COUNT, ChannelId};

/// Maximum number of queued channels.
pub const QUEUE_CAPACITY: usize = CHANNEL_COUNT;

/// Raw slot value used for empty positions in dumps.
pub const EMPTY_SLOT: i8 = -1;

/// Errors returned by queue mutations.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum QueueError {
    Full,
}

/// Array-backed queue of distinct channel ids.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChannelQueue {
    slots: [Option<ChannelId>; QUEUE_CAPACITY],
    len: usize,
}

impl ChannelQueue {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [None; QUEUE_CAPACITY],
            len: 0,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len == QUEUE_CAPACITY
    }

    #[must_use]
    pub const fn front(&self) -> Option<ChannelId> {
        self.slots[0]
    }

    #[must_use]
    pub fn contains(&self, channel: ChannelId) -> bool {
        self.iter().any(|queued| queued == channel)
    }

    /// Position of `channel` in the queue.
    #[must_use]
    pub fn position(&self, channel: ChannelId) -> Option<usize> {
        self.iter().position(|queued| queued == channel)
    }

    /// Iterates queued channels front to back.
    pub fn iter(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.slots[..self.len].iter().filter_map(|slot| *slot)
    }

    /// Appends `channel` at the back.
    pub fn push_back(&mut self, channel: ChannelId) -> Result<(), QueueError> {
        if self.is_full() {
            return Err(QueueError::Full);
        }

        self.slots[self.len] = Some(channel);
        self.len += 1;
        Ok(())
    }

    /// Inserts `channel` at the front, shifting every queued id back by one.
    pub fn push_front(&mut self, channel: ChannelId) -> Result<(), QueueError> {
        if self.is_full() {
            return Err(QueueError::Full);
        }

        for index in (1..=self.len).rev() {
            self.slots[index] = self.slots[index - 1];
        }
        self.slots[0] = Some(channel);
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the front id.
    pub fn pop_front(&mut self) -> Option<ChannelId> {
        let front = self.front()?;
        self.remove_at(0);
        Some(front)
    }

    /// Removes `channel` if it sits anywhere behind the front slot.
    ///
    /// Returns `true` when an element was removed.
    pub fn remove_after_front(&mut self, channel: ChannelId) -> bool {
        match self.position(channel) {
            Some(index) if index > 0 => {
                self.remove_at(index);
                true
            }
            _ => false,
        }
    }

    fn remove_at(&mut self, index: usize) {
        for slot in index..self.len - 1 {
            self.slots[slot] = self.slots[slot + 1];
        }
        self.len -= 1;
        self.slots[self.len] = None;
    }

    /// Raw slot dump with [`EMPTY_SLOT`] marking unused positions.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn slots(&self) -> [i8; QUEUE_CAPACITY] {
        self.slots
            .map(|slot| slot.map_or(EMPTY_SLOT, |channel| channel.as_index() as i8))
    }
}

impl Default for ChannelQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue:")?;
        for channel in self.iter() {
            write!(f, " {}", channel.as_index())?;
        }
        Ok(())
    }
}
