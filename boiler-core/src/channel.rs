//! Channel identifiers shared by every controller layer.

use core::fmt;

/// Number of controllable channels (Master plus A, B, C).
pub const CHANNEL_COUNT: usize = 4;

/// Logical channel. Index 0 is the privileged Master channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ChannelId {
    Master,
    A,
    B,
    C,
}

/// Every channel in index order.
pub const ALL_CHANNELS: [ChannelId; CHANNEL_COUNT] =
    [ChannelId::Master, ChannelId::A, ChannelId::B, ChannelId::C];

impl ChannelId {
    /// Deterministic index used for per-channel record arrays.
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            ChannelId::Master => 0,
            ChannelId::A => 1,
            ChannelId::B => 2,
            ChannelId::C => 3,
        }
    }

    /// Attempts to construct a [`ChannelId`] from a raw index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ChannelId::Master),
            1 => Some(ChannelId::A),
            2 => Some(ChannelId::B),
            3 => Some(ChannelId::C),
            _ => None,
        }
    }

    /// Returns `true` for the Master channel.
    #[must_use]
    pub const fn is_master(self) -> bool {
        matches!(self, ChannelId::Master)
    }

    /// Short lowercase label used by host tooling.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ChannelId::Master => "master",
            ChannelId::A => "a",
            ChannelId::B => "b",
            ChannelId::C => "c",
        }
    }

    /// Parses either a label (`master`, `a`, ...) or a numeric index.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        ALL_CHANNELS
            .iter()
            .copied()
            .find(|channel| channel.label().eq_ignore_ascii_case(label))
            .or_else(|| label.parse::<usize>().ok().and_then(Self::from_index))
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_for_every_channel() {
        for (index, channel) in ALL_CHANNELS.iter().enumerate() {
            assert_eq!(channel.as_index(), index);
            assert_eq!(ChannelId::from_index(index), Some(*channel));
        }
        assert_eq!(ChannelId::from_index(CHANNEL_COUNT), None);
    }

    #[test]
    fn labels_and_indices_parse() {
        assert_eq!(ChannelId::from_label("Master"), Some(ChannelId::Master));
        assert_eq!(ChannelId::from_label("b"), Some(ChannelId::B));
        assert_eq!(ChannelId::from_label("3"), Some(ChannelId::C));
        assert_eq!(ChannelId::from_label("4"), None);
        assert_eq!(ChannelId::from_label("d"), None);
    }
}
