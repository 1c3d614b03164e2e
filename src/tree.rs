//! AVL search, insertion, removal and navigation over a [`NodeStore`].
//!
//! Balance tags live in the link that points at a slot, not in the slot itself,
//! so every rebalancing step reads and rewrites the parent's [`Field`]. Height
//! changes travel back up the recursion as a plain `bool` next to the slot index.
//!
//! Rotations are written once per shape and parameterized by the heavy side:
//! `rotate_single(s, Left)` is a right rotation, `rotate_single(s, Right)` a left
//! rotation, `rotate_double(s, Left)` the left-right and `rotate_double(s, Right)`
//! the right-left rotation.

use std::cmp::Ordering;

use crate::compare::Comparator;
use crate::config::{GrowthPolicy, TreeConfig};
use crate::error::Result;
use crate::link::{Balance, Link, Side};
use crate::store::{Field, NodeStore, ValueColumn};

/// Outcome of inserting below a field.
#[derive(Clone, Copy, Debug)]
struct Descent {
    /// Slot holding the key, new or existing.
    slot: u32,
    inserted: bool,
    /// The subtree below the field got taller.
    grew: bool,
}

/// Outcome of a rotation at a subtree root.
#[derive(Clone, Copy, Debug)]
struct Rotation {
    root: u32,
    balance: Balance,
    /// The rotated subtree is one level shorter than before the rotation.
    shrunk: bool,
}

/// What a removal is looking for.
pub(crate) enum Target<'a, K> {
    Key(&'a K),
    /// A live slot, located through its own key.
    Slot(u32),
}

// Manual impls: a derive would demand `K: Copy`.
impl<K> Clone for Target<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Target<'_, K> {}

#[derive(Clone)]
pub(crate) struct RawTree<K, S, C> {
    pub(crate) store: NodeStore<K, S>,
    pub(crate) cmp: C,
    pub(crate) growth: GrowthPolicy,
}

impl<K, S: ValueColumn, C: Comparator<K>> RawTree<K, S, C> {
    pub(crate) fn try_with_config(config: &TreeConfig, cmp: C) -> Result<Self> {
        Ok(Self {
            store: NodeStore::try_with_capacity(config.initial_capacity)?,
            cmp,
            growth: config.growth,
        })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.store.count
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.store.capacity()
    }

    #[inline]
    pub(crate) fn value(&self, slot: u32) -> &S::Value {
        self.store
            .values
            .get(slot)
            .expect("live slot must hold a value")
    }

    // =========================================================================
    // Search
    // =========================================================================

    pub(crate) fn find(&self, key: &K) -> Option<u32> {
        let links = &self.store.links;
        let mut link = links.root();
        while let Some(slot) = link.slot() {
            link = match self.cmp.compare(key, self.store.key(slot)) {
                Ordering::Equal => return Some(slot),
                Ordering::Less => links.child(slot, Side::Left),
                Ordering::Greater => links.child(slot, Side::Right),
            };
        }
        None
    }

    /// Height of the tree, following the taller child at each level.
    pub(crate) fn height(&self) -> usize {
        let links = &self.store.links;
        let mut height = 0;
        let mut link = links.root();
        while let Some(slot) = link.slot() {
            height += 1;
            let side = match link.balance() {
                Balance::RightHeavy => Side::Right,
                _ => Side::Left,
            };
            link = links.child(slot, side);
        }
        height
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Returns the slot holding `key` and whether it was newly inserted.
    ///
    /// Grows the store only when the key is absent and no slot is free.
    pub(crate) fn try_find_or_insert(&mut self, key: K) -> Result<(u32, bool)> {
        if self.store.is_full() {
            if let Some(slot) = self.find(&key) {
                return Ok((slot, false));
            }
            self.grow_for(self.store.count + 1)?;
        }
        let root = self.store.links.root_field();
        let descent = self.insert_at(root, key);
        Ok((descent.slot, descent.inserted))
    }

    fn insert_at(&mut self, field: Field, key: K) -> Descent {
        let Some(slot) = self.store.links.read(field).slot() else {
            let slot = self.store.alloc(key);
            self.store.links.write(field, Link::pack(slot, Balance::Even));
            return Descent {
                slot,
                inserted: true,
                grew: true,
            };
        };

        let side = match self.cmp.compare(&key, self.store.key(slot)) {
            Ordering::Equal => {
                return Descent {
                    slot,
                    inserted: false,
                    grew: false,
                }
            }
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
        };

        let mut descent = self.insert_at(Field::child(slot, side), key);
        if descent.grew {
            descent.grew = self.grew_on(field, slot, side);
        }
        descent
    }

    /// The subtree on `side` of `slot` (linked from `field`) got one level taller.
    /// Returns whether `slot`'s subtree got taller as well.
    fn grew_on(&mut self, field: Field, slot: u32, side: Side) -> bool {
        let balance = self.store.links.read(field).balance();
        if balance == Balance::heavy(side.opposite()) {
            self.store.links.write(field, Link::pack(slot, Balance::Even));
            false
        } else if balance == Balance::Even {
            self.store
                .links
                .write(field, Link::pack(slot, Balance::heavy(side)));
            true
        } else {
            let rotation = self.rebalance(slot, side);
            debug_assert!(rotation.shrunk, "insert rotation must absorb the growth");
            self.store
                .links
                .write(field, Link::pack(rotation.root, rotation.balance));
            false
        }
    }

    // =========================================================================
    // Rotations
    // =========================================================================

    /// Restores balance at `slot`, which is two levels taller on `heavy`.
    fn rebalance(&mut self, slot: u32, heavy: Side) -> Rotation {
        let child = self.store.links.child(slot, heavy);
        if child.balance() == Balance::heavy(heavy.opposite()) {
            self.rotate_double(slot, heavy)
        } else {
            self.rotate_single(slot, heavy)
        }
    }

    /// Lifts the `heavy` child of `slot` into its place.
    fn rotate_single(&mut self, slot: u32, heavy: Side) -> Rotation {
        let links = &mut self.store.links;
        let child_link = links.child(slot, heavy);
        let child = child_link.slot().expect("rotation pivot must exist");

        let inner = links.child(child, heavy.opposite());
        links.set_child(slot, heavy, inner);

        // An even pivot only happens during removal; the height is then unchanged.
        let (slot_balance, child_balance, shrunk) = if child_link.balance() == Balance::Even {
            (
                Balance::heavy(heavy),
                Balance::heavy(heavy.opposite()),
                false,
            )
        } else {
            (Balance::Even, Balance::Even, true)
        };
        links.set_child(child, heavy.opposite(), Link::pack(slot, slot_balance));

        Rotation {
            root: child,
            balance: child_balance,
            shrunk,
        }
    }

    /// Lifts the inner grandchild of `slot` (the `heavy.opposite()` child of its
    /// `heavy` child) into its place.
    fn rotate_double(&mut self, slot: u32, heavy: Side) -> Rotation {
        let links = &mut self.store.links;
        let child = links
            .child(slot, heavy)
            .slot()
            .expect("rotation child must exist");
        let pivot_link = links.child(child, heavy.opposite());
        let pivot = pivot_link.slot().expect("rotation pivot must exist");
        let flipped = pivot_link.balance().invert();

        let pivot_outer = links.child(pivot, heavy);
        let pivot_inner = links.child(pivot, heavy.opposite());
        links.set_child(child, heavy.opposite(), pivot_outer);
        links.set_child(slot, heavy, pivot_inner);

        let child_balance = if flipped == Balance::heavy(heavy) {
            flipped
        } else {
            Balance::Even
        };
        let slot_balance = if flipped == Balance::heavy(heavy.opposite()) {
            flipped
        } else {
            Balance::Even
        };
        links.set_child(pivot, heavy, Link::pack(child, child_balance));
        links.set_child(pivot, heavy.opposite(), Link::pack(slot, slot_balance));

        Rotation {
            root: pivot,
            balance: Balance::Even,
            shrunk: true,
        }
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Unlinks the matching entry and returns its contents.
    pub(crate) fn remove(&mut self, target: Target<'_, K>) -> Option<(K, Option<S::Value>)> {
        let root = self.store.links.root_field();
        let (slot, _) = self.remove_at(root, target)?;
        Some(self.store.release(slot))
    }

    /// Unlinks the first (`Side::Left`) or last entry.
    pub(crate) fn pop_extreme(&mut self, side: Side) -> Option<(K, Option<S::Value>)> {
        if self.store.links.root().is_absent() {
            return None;
        }
        let root = self.store.links.root_field();
        let (slot, _) = self.detach_extreme(root, side);
        Some(self.store.release(slot))
    }

    fn locate(&self, target: Target<'_, K>, slot: u32) -> Ordering {
        match target {
            Target::Key(key) => self.cmp.compare(key, self.store.key(slot)),
            Target::Slot(wanted) if wanted == slot => Ordering::Equal,
            Target::Slot(wanted) => self
                .cmp
                .compare(self.store.key(wanted), self.store.key(slot)),
        }
    }

    /// Returns the unlinked slot and whether the subtree at `field` got shorter.
    fn remove_at(&mut self, field: Field, target: Target<'_, K>) -> Option<(u32, bool)> {
        let link = self.store.links.read(field);
        let slot = link.slot()?;
        let side = match self.locate(target, slot) {
            Ordering::Equal => return Some((slot, self.unlink(field, slot, link.balance()))),
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
        };
        let (removed, shrunk) = self.remove_at(Field::child(slot, side), target)?;
        Some((removed, shrunk && self.shrunk_on(field, slot, side)))
    }

    /// Splices `slot` out from under `field`. Returns whether that subtree got shorter.
    fn unlink(&mut self, field: Field, slot: u32, balance: Balance) -> bool {
        let left = self.store.links.child(slot, Side::Left);
        let right = self.store.links.child(slot, Side::Right);
        if left.is_absent() {
            self.store.links.write(field, right);
            return true;
        }
        if right.is_absent() {
            self.store.links.write(field, left);
            return true;
        }

        // Two children: the in-order neighbour from the taller side takes the slot's place.
        let side = if balance == Balance::LeftHeavy {
            Side::Left
        } else {
            Side::Right
        };
        let (heir, shrunk) = self.detach_extreme(Field::child(slot, side), side.opposite());

        let links = &mut self.store.links;
        let left = links.child(slot, Side::Left);
        let right = links.child(slot, Side::Right);
        links.set_child(heir, Side::Left, left);
        links.set_child(heir, Side::Right, right);
        links.write(field, Link::pack(heir, balance));

        shrunk && self.shrunk_on(field, heir, side)
    }

    /// Unlinks the outermost slot on `toward` of the non-empty subtree at `field`.
    fn detach_extreme(&mut self, field: Field, toward: Side) -> (u32, bool) {
        let slot = self
            .store
            .links
            .read(field)
            .slot()
            .expect("subtree must not be empty");
        if self.store.links.child(slot, toward).is_absent() {
            let rest = self.store.links.child(slot, toward.opposite());
            self.store.links.write(field, rest);
            return (slot, true);
        }
        let (extreme, shrunk) = self.detach_extreme(Field::child(slot, toward), toward);
        (extreme, shrunk && self.shrunk_on(field, slot, toward))
    }

    /// The subtree on `side` of `slot` (linked from `field`) got one level shorter.
    /// Returns whether `slot`'s subtree got shorter as well.
    fn shrunk_on(&mut self, field: Field, slot: u32, side: Side) -> bool {
        let balance = self.store.links.read(field).balance();
        if balance == Balance::heavy(side) {
            self.store.links.write(field, Link::pack(slot, Balance::Even));
            true
        } else if balance == Balance::Even {
            self.store
                .links
                .write(field, Link::pack(slot, Balance::heavy(side.opposite())));
            false
        } else {
            let rotation = self.rebalance(slot, side.opposite());
            self.store
                .links
                .write(field, Link::pack(rotation.root, rotation.balance));
            rotation.shrunk
        }
    }

    pub(crate) fn clear(&mut self) {
        if self.store.count != 0 {
            tracing::debug!(len = self.store.count, "clearing tree");
        }
        self.store.clear();
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// The smallest (`Side::Left`) or largest live slot.
    pub(crate) fn extreme(&self, side: Side) -> Option<u32> {
        let links = &self.store.links;
        let mut slot = links.root().slot()?;
        while let Some(next) = links.child(slot, side).slot() {
            slot = next;
        }
        Some(slot)
    }

    /// The closest slot to `key` on `toward` (`Side::Left` = smaller keys).
    /// With `inclusive`, a slot holding `key` itself is returned.
    pub(crate) fn nearest(&self, key: &K, toward: Side, inclusive: bool) -> Option<u32> {
        let beyond = match toward {
            Side::Left => Ordering::Less,
            Side::Right => Ordering::Greater,
        };
        let links = &self.store.links;
        let mut best = None;
        let mut link = links.root();
        while let Some(slot) = link.slot() {
            let ord = self.cmp.compare(self.store.key(slot), key);
            if ord == Ordering::Equal && inclusive {
                return Some(slot);
            }
            link = if ord == beyond {
                best = Some(slot);
                links.child(slot, toward.opposite())
            } else {
                links.child(slot, toward)
            };
        }
        best
    }
}

#[cfg(test)]
impl<K, S: ValueColumn, C: Comparator<K>> RawTree<K, S, C> {
    /// Panics unless ordering, balance tags, count and free list are all consistent.
    pub(crate) fn assert_valid(&self) {
        use crate::link::FREE_END;

        let capacity = self.capacity();
        let mut live = vec![false; capacity];

        // Returns the subtree height.
        fn walk<K, S: ValueColumn, C: Comparator<K>>(
            tree: &RawTree<K, S, C>,
            link: Link,
            live: &mut [bool],
            prev: &mut Option<u32>,
        ) -> usize {
            let Some(slot) = link.slot() else {
                return 0;
            };
            assert!((slot as usize) < live.len(), "slot {slot} out of range");
            assert!(!live[slot as usize], "slot {slot} reachable twice");
            live[slot as usize] = true;
            assert!(tree.store.values.get(slot).is_some(), "live slot without value");

            let links = &tree.store.links;
            let left = walk(tree, links.child(slot, Side::Left), live, prev);
            if let Some(p) = *prev {
                assert_eq!(
                    tree.cmp.compare(tree.store.key(p), tree.store.key(slot)),
                    Ordering::Less,
                    "keys out of order"
                );
            }
            *prev = Some(slot);
            let right = walk(tree, links.child(slot, Side::Right), live, prev);

            let expected = match right as isize - left as isize {
                0 => Balance::Even,
                1 => Balance::RightHeavy,
                -1 => Balance::LeftHeavy,
                diff => panic!("slot {slot} out of balance by {diff}"),
            };
            assert_eq!(link.balance(), expected, "stale balance tag at slot {slot}");
            left.max(right) + 1
        }

        let mut prev = None;
        let height = walk(self, self.store.links.root(), &mut live, &mut prev);
        assert_eq!(height, self.height(), "tag-derived height disagrees");

        let reachable = live.iter().filter(|&&l| l).count();
        assert_eq!(reachable, self.store.count, "count must match reachable slots");

        let mut free = 0usize;
        let mut slot = self.store.entry;
        while slot != FREE_END {
            assert!(!live[slot as usize], "free slot {slot} is reachable");
            live[slot as usize] = true;
            assert!(self.store.keys[slot as usize].is_none(), "free slot holds a key");
            free += 1;
            slot = self.store.links.next_free(slot);
        }
        assert_eq!(free + self.store.count, capacity, "free list must cover the rest");

        let bound = 1.4405 * ((self.store.count + 2) as f64).log2() - 0.3277;
        assert!(
            (height as f64) < bound,
            "height {height} above AVL bound {bound}"
        );
    }
}
