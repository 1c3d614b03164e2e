use crate::link::MAX_CAPACITY;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How far the backing arrays grow when an insertion finds no free slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GrowthPolicy {
    /// `needed + needed / 2`.
    #[default]
    HalfAgain,
    /// `max(needed, 2 * capacity)`.
    Double,
    /// Exactly `needed`.
    Exact,
}

impl GrowthPolicy {
    /// Capacity to rebuild into when `needed` slots are required and `capacity` exist.
    /// Never below `needed`, clamped to [`MAX_CAPACITY`] (callers reject `needed` above it).
    pub fn next_capacity(self, capacity: usize, needed: usize) -> usize {
        let target = match self {
            GrowthPolicy::HalfAgain => needed.saturating_add(needed / 2),
            GrowthPolicy::Double => needed.max(capacity.saturating_mul(2)),
            GrowthPolicy::Exact => needed,
        };
        target.min(MAX_CAPACITY).max(needed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreeConfig {
    /// Slots allocated up front.
    pub initial_capacity: usize,
    pub growth: GrowthPolicy,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            growth: GrowthPolicy::HalfAgain,
        }
    }
}

impl TreeConfig {
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            ..Self::default()
        }
    }

    pub fn growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }
}
