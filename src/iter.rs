//! In-order traversal over slot indices.
//!
//! A [`Walk`] keeps the ancestors still to be visited on an explicit stack, so
//! each step is amortized O(1) and the stack never exceeds the tree height. A
//! [`Span`] pairs a forward and a backward walk and stops when they meet.
//! Neither holds a borrow of the tree: every step is handed the link columns.

use std::cmp::Ordering;
use std::ops::Bound;

use crate::compare::Comparator;
use crate::link::{Link, Side};
use crate::store::{Links, ValueColumn};
use crate::tree::RawTree;

/// One direction of an in-order walk. `toward` is the side that is visited
/// first: `Side::Left` walks ascending, `Side::Right` descending.
#[derive(Clone, Debug, Default)]
pub(crate) struct Walk {
    stack: Vec<u32>,
}

impl Walk {
    fn descend(&mut self, links: &Links, mut link: Link, toward: Side) {
        while let Some(slot) = link.slot() {
            self.stack.push(slot);
            link = links.child(slot, toward);
        }
    }

    /// Positions on the first slot of the whole tree.
    fn start(links: &Links, toward: Side) -> Self {
        let mut walk = Self::default();
        walk.descend(links, links.root(), toward);
        walk
    }

    /// Positions on the first slot at or past `bound`.
    fn seek<K, S: ValueColumn, C: Comparator<K>>(
        tree: &RawTree<K, S, C>,
        bound: Bound<&K>,
        toward: Side,
    ) -> Self {
        let (key, inclusive) = match bound {
            Bound::Unbounded => return Self::start(&tree.store.links, toward),
            Bound::Included(key) => (key, true),
            Bound::Excluded(key) => (key, false),
        };
        // Slots on the far side of the bound are in range.
        let inside = match toward {
            Side::Left => Ordering::Greater,
            Side::Right => Ordering::Less,
        };
        let links = &tree.store.links;
        let mut walk = Self::default();
        let mut link = links.root();
        while let Some(slot) = link.slot() {
            let ord = tree.cmp.compare(tree.store.key(slot), key);
            link = if ord == inside || (ord == Ordering::Equal && inclusive) {
                walk.stack.push(slot);
                links.child(slot, toward)
            } else {
                links.child(slot, toward.opposite())
            };
        }
        walk
    }

    #[inline]
    fn peek(&self) -> Option<u32> {
        self.stack.last().copied()
    }

    fn advance(&mut self, links: &Links, toward: Side) -> Option<u32> {
        let slot = self.stack.pop()?;
        self.descend(links, links.child(slot, toward.opposite()), toward);
        Some(slot)
    }

    fn clear(&mut self) {
        self.stack.clear();
    }
}

/// A double-ended in-order range of slots.
#[derive(Clone, Debug, Default)]
pub(crate) struct Span {
    front: Walk,
    back: Walk,
}

impl Span {
    pub(crate) fn full(links: &Links) -> Self {
        Self {
            front: Walk::start(links, Side::Left),
            back: Walk::start(links, Side::Right),
        }
    }

    pub(crate) fn range<K, S: ValueColumn, C: Comparator<K>>(
        tree: &RawTree<K, S, C>,
        lower: Bound<&K>,
        upper: Bound<&K>,
    ) -> Self {
        let mut span = Self {
            front: Walk::seek(tree, lower, Side::Left),
            back: Walk::seek(tree, upper, Side::Right),
        };
        if let (Some(first), Some(last)) = (span.front.peek(), span.back.peek()) {
            let ord = tree
                .cmp
                .compare(tree.store.key(first), tree.store.key(last));
            if ord == Ordering::Greater {
                span.front.clear();
                span.back.clear();
            }
        }
        span
    }

    pub(crate) fn next(&mut self, links: &Links) -> Option<u32> {
        let last = self.back.peek()?;
        let slot = self.front.advance(links, Side::Left)?;
        if slot == last {
            self.front.clear();
            self.back.clear();
        }
        Some(slot)
    }

    pub(crate) fn next_back(&mut self, links: &Links) -> Option<u32> {
        let first = self.front.peek()?;
        let slot = self.back.advance(links, Side::Right)?;
        if slot == first {
            self.front.clear();
            self.back.clear();
        }
        Some(slot)
    }
}
