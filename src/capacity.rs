//! Resizing the backing arrays.
//!
//! A rebuild allocates a complete new [`NodeStore`] first and only then moves
//! entries across, so a failed allocation leaves the tree untouched. Live slots
//! are relocated in post-order into the band `0..len`, children before parents,
//! with indices handed out from `len - 1` down to `0`; the rest of the new
//! arrays becomes a descending free list.

use tracing::{debug, warn};

use crate::compare::Comparator;
use crate::error::{CapacityError, Result};
use crate::link::{Link, Side, MAX_CAPACITY};
use crate::store::{NodeStore, ValueColumn};
use crate::tree::RawTree;

#[derive(Clone, Copy)]
enum Phase {
    /// Schedule the children, then come back.
    Enter,
    /// Both children are relocated; relocate this slot.
    Place,
}

impl<K, S: ValueColumn, C: Comparator<K>> RawTree<K, S, C> {
    /// Grows so that at least `needed` slots exist, following the growth policy.
    pub(crate) fn grow_for(&mut self, needed: usize) -> Result<()> {
        if needed > MAX_CAPACITY {
            warn!(needed, max = MAX_CAPACITY, "tree capacity exhausted");
            return Err(CapacityError::TooLarge {
                requested: needed,
                max: MAX_CAPACITY,
            });
        }
        let target = self.growth.next_capacity(self.capacity(), needed);
        self.rebuild(target)
    }

    /// Makes room for `additional` more entries without further reallocation.
    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let needed = self
            .store
            .count
            .checked_add(additional)
            .ok_or(CapacityError::TooLarge {
                requested: usize::MAX,
                max: MAX_CAPACITY,
            })?;
        if needed <= self.capacity() {
            return Ok(());
        }
        self.grow_for(needed)
    }

    /// Rebuilds into exactly `capacity` slots, shrinking or growing.
    pub(crate) fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        if capacity < self.store.count {
            return Err(CapacityError::BelowLen {
                requested: capacity,
                len: self.store.count,
            });
        }
        if capacity == self.capacity() {
            return Ok(());
        }
        self.rebuild(capacity)
    }

    fn rebuild(&mut self, capacity: usize) -> Result<()> {
        let mut fresh = NodeStore::<K, S>::try_with_capacity(capacity).map_err(|err| {
            warn!(capacity, error = %err, "tree rebuild rejected");
            err
        })?;

        let old_capacity = self.capacity();
        let len = self.store.count;
        let height = self.height();
        let old = &mut self.store;

        let mut next = len as u32;
        let mut pending: Vec<(Link, Phase)> = Vec::with_capacity(2 * height + 1);
        let mut placed: Vec<Link> = Vec::with_capacity(height + 1);
        pending.push((old.links.root(), Phase::Enter));

        while let Some((link, phase)) = pending.pop() {
            match (phase, link.slot()) {
                (Phase::Enter, None) => placed.push(Link::ABSENT),
                (Phase::Enter, Some(slot)) => {
                    pending.push((link, Phase::Place));
                    pending.push((old.links.child(slot, Side::Right), Phase::Enter));
                    pending.push((old.links.child(slot, Side::Left), Phase::Enter));
                }
                (Phase::Place, Some(slot)) => {
                    let right = placed.pop().expect("right subtree placed");
                    let left = placed.pop().expect("left subtree placed");
                    next -= 1;
                    fresh.keys[next as usize] = old.keys[slot as usize].take();
                    if let Some(value) = old.values.take(slot) {
                        fresh.values.put(next, value);
                    }
                    fresh.links.set_child(next, Side::Left, left);
                    fresh.links.set_child(next, Side::Right, right);
                    placed.push(Link::pack(next, link.balance()));
                }
                (Phase::Place, None) => unreachable!("absent links are never placed"),
            }
        }
        debug_assert_eq!(next, 0, "every live slot relocated");

        let root = placed.pop().unwrap_or(Link::ABSENT);
        let root_field = fresh.links.root_field();
        fresh.links.write(root_field, root);
        fresh.count = len;
        fresh.reset_free_tail(len);

        self.store = fresh;
        debug!(old_capacity, capacity, len, "rebuilt node store");
        Ok(())
    }
}
