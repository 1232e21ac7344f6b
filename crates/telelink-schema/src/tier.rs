use std::fmt;

use serde::{Deserialize, Serialize};

/// Message code header size on the wire (u16, little-endian).
pub const HEADER_SIZE: usize = 2;

/// Code bit where the conditional event mask starts.
pub const CONDITIONAL_SHIFT: u32 = 3;

/// Highest conditional event index that fits the 16-bit code.
pub const MAX_EVENT: u8 = 12;

/// Number of tiers.
pub const TIER_COUNT: usize = 4;

/// Update-rate class of a sensor field.
///
/// Declaration order is transmit priority: it is both the byte order of the
/// frame payload and the bit order of the message code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Fast,
    Medium,
    Slow,
    Conditional,
}

impl Tier {
    /// All tiers, highest priority first.
    pub const ALL: [Tier; TIER_COUNT] = [Tier::Fast, Tier::Medium, Tier::Slow, Tier::Conditional];

    /// The periodic tiers, each owning one code bit.
    pub const PERIODIC: [Tier; 3] = [Tier::Fast, Tier::Medium, Tier::Slow];

    /// Position in priority order.
    pub const fn index(self) -> usize {
        match self {
            Tier::Fast => 0,
            Tier::Medium => 1,
            Tier::Slow => 2,
            Tier::Conditional => 3,
        }
    }

    /// Code bit owned by a periodic tier.
    ///
    /// Conditional fields are flagged per event instead, so this returns `None`.
    pub const fn code_bit(self) -> Option<u16> {
        match self {
            Tier::Fast => Some(0b001),
            Tier::Medium => Some(0b010),
            Tier::Slow => Some(0b100),
            Tier::Conditional => None,
        }
    }

    /// Code bit for a conditional event index.
    pub const fn event_bit(event: u8) -> u16 {
        1u16 << (CONDITIONAL_SHIFT + event as u32)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Fast => "fast",
            Tier::Medium => "medium",
            Tier::Slow => "slow",
            Tier::Conditional => "conditional",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
