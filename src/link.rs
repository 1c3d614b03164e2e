//! Packed child links.
//!
//! Layout of a stored link (`u32`):
//! - Bits 2..31: slot index of the child
//! - Bits 0..1: balance tag of the child subtree (`0`/`3` even, `1` right-heavy, `2` left-heavy)
//! - Special: `0xFFFF_FFFF` (all 1s) = no child
//!
//! Slot indices stay below `MAX_CAPACITY` (2^30), so the highest packed value is
//! `(2^30 - 1) << 2 | 2`, which never collides with the sentinel because tag `3`
//! is never written.
//!
//! Free slots reuse the right-link column to hold the raw (unpacked) index of the
//! next free slot, terminated by [`FREE_END`].

/// Largest number of slots a tree may hold.
pub const MAX_CAPACITY: usize = 1 << 30;

/// Terminator of the free list.
pub(crate) const FREE_END: u32 = u32::MAX;

/// Which child of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub(crate) fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Balance tag of a subtree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub(crate) enum Balance {
    Even = 0,
    RightHeavy = 1,
    LeftHeavy = 2,
}

impl Balance {
    /// The tag of a subtree that is one level taller on `side`.
    #[inline]
    pub(crate) fn heavy(side: Side) -> Self {
        match side {
            Side::Left => Balance::LeftHeavy,
            Side::Right => Balance::RightHeavy,
        }
    }

    /// Swaps left-heavy and right-heavy; even stays even.
    #[inline]
    pub(crate) fn invert(self) -> Self {
        match self {
            Balance::Even => Balance::Even,
            Balance::RightHeavy => Balance::LeftHeavy,
            Balance::LeftHeavy => Balance::RightHeavy,
        }
    }

    #[inline]
    fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            1 => Balance::RightHeavy,
            2 => Balance::LeftHeavy,
            _ => Balance::Even,
        }
    }
}

/// A child link: a slot index plus the balance tag of the subtree rooted there.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct Link(u32);

impl Link {
    pub(crate) const ABSENT: Link = Link(u32::MAX);

    #[inline]
    pub(crate) fn pack(slot: u32, balance: Balance) -> Self {
        debug_assert!((slot as usize) < MAX_CAPACITY);
        Self((slot << 2) | balance as u32)
    }

    #[inline]
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub(crate) fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn is_absent(self) -> bool {
        self.0 == Self::ABSENT.0
    }

    #[inline]
    pub(crate) fn slot(self) -> Option<u32> {
        (!self.is_absent()).then_some(self.0 >> 2)
    }

    /// Balance of the linked subtree. Meaningless for an absent link.
    #[inline]
    pub(crate) fn balance(self) -> Balance {
        debug_assert!(!self.is_absent());
        Balance::from_bits(self.0)
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.slot() {
            Some(slot) => write!(f, "Link({slot}, {:?})", self.balance()),
            None => f.write_str("Link(absent)"),
        }
    }
}
