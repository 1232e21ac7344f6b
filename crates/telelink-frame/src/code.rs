use std::fmt;

use telelink_schema::{Tier, CONDITIONAL_SHIFT, MAX_EVENT};

/// Mask of the event bits once shifted out of the code.
const EVENT_MASK: u16 = (1 << (MAX_EVENT as u16 + 1)) - 1;

/// Frame header: which tiers and conditional events a frame carries.
///
/// Bits 0..=2 flag the Fast, Medium and Slow tiers; bits 3..=15 carry the
/// conditional event mask (event `e` at bit `3 + e`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MessageCode(u16);

impl MessageCode {
    /// Nothing to send.
    pub const EMPTY: MessageCode = MessageCode(0);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether a tier's data is present.
    ///
    /// For [`Tier::Conditional`] this is true when any event bit is set.
    pub fn has_tier(self, tier: Tier) -> bool {
        match tier.code_bit() {
            Some(bit) => self.0 & bit != 0,
            None => self.events() != 0,
        }
    }

    /// Whether conditional event `event` fired.
    pub fn has_event(self, event: u8) -> bool {
        event <= MAX_EVENT && self.0 & Tier::event_bit(event) != 0
    }

    /// The conditional event mask, shifted down to event 0 at bit 0.
    pub const fn events(self) -> u16 {
        (self.0 >> CONDITIONAL_SHIFT) & EVENT_MASK
    }

    /// Code with a periodic tier's bit set. Conditional is a no-op here; use
    /// [`MessageCode::with_event`].
    pub fn with_tier(self, tier: Tier) -> Self {
        match tier.code_bit() {
            Some(bit) => Self(self.0 | bit),
            None => self,
        }
    }

    pub fn with_event(self, event: u8) -> Self {
        if event > MAX_EVENT {
            return self;
        }
        Self(self.0 | Tier::event_bit(event))
    }

    pub const fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }

    pub const fn from_le_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_le_bytes(bytes))
    }
}

impl From<u16> for MessageCode {
    fn from(bits: u16) -> Self {
        Self(bits)
    }
}

impl From<MessageCode> for u16 {
    fn from(code: MessageCode) -> Self {
        code.0
    }
}

impl fmt::Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#07b}", self.0)
    }
}

/// Per-tier "new data since the last frame" state on the transmit side.
///
/// Tick handlers mark tiers dirty; only [`compute_message_code`] clears them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyFlags {
    fast: bool,
    medium: bool,
    slow: bool,
    conditional: u16,
}

impl DirtyFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a periodic tier dirty. Returns `false` for [`Tier::Conditional`],
    /// which is raised per event instead.
    pub fn mark(&mut self, tier: Tier) -> bool {
        match tier {
            Tier::Fast => self.fast = true,
            Tier::Medium => self.medium = true,
            Tier::Slow => self.slow = true,
            Tier::Conditional => return false,
        }
        true
    }

    /// Raise a conditional event. Returns `false` if the index is out of range.
    pub fn raise_event(&mut self, event: u8) -> bool {
        if event > MAX_EVENT {
            return false;
        }
        self.conditional |= 1 << event;
        true
    }

    pub fn is_dirty(&self, tier: Tier) -> bool {
        match tier {
            Tier::Fast => self.fast,
            Tier::Medium => self.medium,
            Tier::Slow => self.slow,
            Tier::Conditional => self.conditional != 0,
        }
    }

    /// Pending conditional events, event 0 at bit 0.
    pub fn events(&self) -> u16 {
        self.conditional
    }

    pub fn is_clean(&self) -> bool {
        !(self.fast || self.medium || self.slow || self.conditional != 0)
    }
}

/// Fold the dirty flags into a message code and clear them.
///
/// Draining is the point: a second call without new marks returns
/// [`MessageCode::EMPTY`].
pub fn compute_message_code(flags: &mut DirtyFlags) -> MessageCode {
    let mut code = MessageCode::EMPTY;

    for tier in Tier::PERIODIC {
        let flag = match tier {
            Tier::Fast => &mut flags.fast,
            Tier::Medium => &mut flags.medium,
            Tier::Slow => &mut flags.slow,
            Tier::Conditional => continue,
        };
        if *flag {
            code = code.with_tier(tier);
            *flag = false;
        }
    }

    if flags.conditional != 0 {
        code = MessageCode(code.0 | ((flags.conditional & EVENT_MASK) << CONDITIONAL_SHIFT));
        flags.conditional = 0;
    }

    code
}
