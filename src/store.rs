//! Parallel-array node storage.
//!
//! A slot `i` is described by `keys[i]`, `lefts[i]`, `rights[i]` and, for maps,
//! the value column entry `i`. `rights` has one extra element at index `capacity`
//! that holds the root link. Unused slots form a singly linked free list through
//! `rights`, headed by `entry`.

use std::collections::TryReserveError;

use crate::error::{CapacityError, Result};
use crate::link::{Link, Side, FREE_END, MAX_CAPACITY};

/// Per-slot value storage. Maps keep one optional value per slot; sets keep none.
pub(crate) trait ValueColumn: Sized {
    type Value;

    fn try_with_len(len: usize) -> std::result::Result<Self, TryReserveError>;
    fn get(&self, slot: u32) -> Option<&Self::Value>;
    fn put(&mut self, slot: u32, value: Self::Value) -> Option<Self::Value>;
    fn take(&mut self, slot: u32) -> Option<Self::Value>;
    fn clear(&mut self);
    fn heap_bytes(&self) -> usize;
}

#[derive(Clone)]
pub(crate) struct ValueArray<V>(Vec<Option<V>>);

impl<V> ValueArray<V> {
    #[inline]
    pub(crate) fn get_mut(&mut self, slot: u32) -> Option<&mut V> {
        self.0[slot as usize].as_mut()
    }

    /// Base pointer for iterators that hand out disjoint `&mut V`.
    #[inline]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut Option<V> {
        self.0.as_mut_ptr()
    }
}

impl<V> ValueColumn for ValueArray<V> {
    type Value = V;

    fn try_with_len(len: usize) -> std::result::Result<Self, TryReserveError> {
        let mut values = Vec::new();
        values.try_reserve_exact(len)?;
        values.resize_with(len, || None);
        Ok(Self(values))
    }

    #[inline]
    fn get(&self, slot: u32) -> Option<&V> {
        self.0[slot as usize].as_ref()
    }

    #[inline]
    fn put(&mut self, slot: u32, value: V) -> Option<V> {
        self.0[slot as usize].replace(value)
    }

    #[inline]
    fn take(&mut self, slot: u32) -> Option<V> {
        self.0[slot as usize].take()
    }

    fn clear(&mut self) {
        self.0.iter_mut().for_each(|v| *v = None);
    }

    fn heap_bytes(&self) -> usize {
        self.0.capacity() * std::mem::size_of::<Option<V>>()
    }
}

/// Value column of a key-only tree: no storage at all.
#[derive(Clone, Copy, Default)]
pub(crate) struct NoValues;

impl ValueColumn for NoValues {
    type Value = ();

    fn try_with_len(_len: usize) -> std::result::Result<Self, TryReserveError> {
        Ok(NoValues)
    }

    #[inline]
    fn get(&self, _slot: u32) -> Option<&()> {
        Some(&())
    }

    #[inline]
    fn put(&mut self, _slot: u32, _value: ()) -> Option<()> {
        None
    }

    #[inline]
    fn take(&mut self, _slot: u32) -> Option<()> {
        Some(())
    }

    fn clear(&mut self) {}

    fn heap_bytes(&self) -> usize {
        0
    }
}

/// A place that holds a link: child `side` of `slot`. The root lives at
/// `Field { slot: capacity, side: Right }`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Field {
    pub(crate) slot: u32,
    pub(crate) side: Side,
}

impl Field {
    #[inline]
    pub(crate) fn child(slot: u32, side: Side) -> Self {
        Self { slot, side }
    }
}

/// The two link columns.
#[derive(Clone)]
pub(crate) struct Links {
    lefts: Vec<u32>,
    /// One longer than `lefts`; the last element is the root link.
    rights: Vec<u32>,
}

impl Links {
    fn try_with_capacity(capacity: usize) -> std::result::Result<Self, TryReserveError> {
        let mut lefts = Vec::new();
        lefts.try_reserve_exact(capacity)?;
        lefts.resize(capacity, Link::ABSENT.raw());
        let mut rights = Vec::new();
        rights.try_reserve_exact(capacity + 1)?;
        rights.resize(capacity + 1, Link::ABSENT.raw());
        Ok(Self { lefts, rights })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.lefts.len()
    }

    #[inline]
    pub(crate) fn root_field(&self) -> Field {
        Field::child(self.lefts.len() as u32, Side::Right)
    }

    #[inline]
    pub(crate) fn root(&self) -> Link {
        Link::from_raw(self.rights[self.lefts.len()])
    }

    #[inline]
    pub(crate) fn child(&self, slot: u32, side: Side) -> Link {
        self.read(Field::child(slot, side))
    }

    #[inline]
    pub(crate) fn read(&self, field: Field) -> Link {
        Link::from_raw(match field.side {
            Side::Left => self.lefts[field.slot as usize],
            Side::Right => self.rights[field.slot as usize],
        })
    }

    #[inline]
    pub(crate) fn write(&mut self, field: Field, link: Link) {
        match field.side {
            Side::Left => self.lefts[field.slot as usize] = link.raw(),
            Side::Right => self.rights[field.slot as usize] = link.raw(),
        }
    }

    #[inline]
    pub(crate) fn set_child(&mut self, slot: u32, side: Side, link: Link) {
        self.write(Field::child(slot, side), link);
    }

    /// Raw next-free index stored in a free slot.
    #[inline]
    pub(crate) fn next_free(&self, slot: u32) -> u32 {
        self.rights[slot as usize]
    }

    #[inline]
    fn set_next_free(&mut self, slot: u32, next: u32) {
        self.rights[slot as usize] = next;
    }

    /// Threads slots `lo..hi` into a descending chain and returns its head.
    fn link_free_range(&mut self, lo: usize, hi: usize) -> u32 {
        for slot in lo..hi {
            self.lefts[slot] = Link::ABSENT.raw();
            self.rights[slot] = if slot == lo {
                FREE_END
            } else {
                (slot - 1) as u32
            };
        }
        if hi > lo {
            (hi - 1) as u32
        } else {
            FREE_END
        }
    }
}

/// Owning arena of slots.
#[derive(Clone)]
pub(crate) struct NodeStore<K, S> {
    pub(crate) keys: Vec<Option<K>>,
    pub(crate) links: Links,
    pub(crate) values: S,
    /// Head of the free list, or `FREE_END`.
    pub(crate) entry: u32,
    pub(crate) count: usize,
}

impl<K, S: ValueColumn> NodeStore<K, S> {
    /// An empty tree with every slot on the free list.
    pub(crate) fn try_with_capacity(capacity: usize) -> Result<Self> {
        if capacity > MAX_CAPACITY {
            return Err(CapacityError::TooLarge {
                requested: capacity,
                max: MAX_CAPACITY,
            });
        }
        let failed = |_: TryReserveError| CapacityError::AllocFailed {
            requested: capacity,
        };
        let mut keys = Vec::new();
        keys.try_reserve_exact(capacity).map_err(failed)?;
        keys.resize_with(capacity, || None);
        let mut links = Links::try_with_capacity(capacity).map_err(failed)?;
        let values = S::try_with_len(capacity).map_err(failed)?;
        let entry = links.link_free_range(0, capacity);
        Ok(Self {
            keys,
            links,
            values,
            entry,
            count: 0,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.links.capacity()
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.entry == FREE_END
    }

    /// Key of a live slot.
    #[inline]
    pub(crate) fn key(&self, slot: u32) -> &K {
        self.keys[slot as usize]
            .as_ref()
            .expect("live slot must hold a key")
    }

    /// Takes the free-list head and stores `key` there as a leaf.
    pub(crate) fn alloc(&mut self, key: K) -> u32 {
        let slot = self.entry;
        debug_assert_ne!(slot, FREE_END, "alloc on a full store");
        self.entry = self.links.next_free(slot);
        self.keys[slot as usize] = Some(key);
        self.links.set_child(slot, Side::Left, Link::ABSENT);
        self.links.set_child(slot, Side::Right, Link::ABSENT);
        self.count += 1;
        slot
    }

    /// Returns a slot that is no longer reachable to the free list.
    pub(crate) fn release(&mut self, slot: u32) -> (K, Option<S::Value>) {
        let key = self.keys[slot as usize]
            .take()
            .expect("released slot must hold a key");
        let value = self.values.take(slot);
        self.links.set_child(slot, Side::Left, Link::ABSENT);
        self.links.set_next_free(slot, self.entry);
        self.entry = slot;
        self.count -= 1;
        (key, value)
    }

    /// Frees every slot in one pass.
    pub(crate) fn clear(&mut self) {
        if self.count == 0 {
            return;
        }
        self.keys.iter_mut().for_each(|k| *k = None);
        self.values.clear();
        let capacity = self.capacity();
        self.entry = self.links.link_free_range(0, capacity);
        let root = self.links.root_field();
        self.links.write(root, Link::ABSENT);
        self.count = 0;
    }

    /// Re-threads the free list over `lo..capacity`.
    pub(crate) fn reset_free_tail(&mut self, lo: usize) {
        let capacity = self.capacity();
        self.entry = self.links.link_free_range(lo, capacity);
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.keys.capacity() * std::mem::size_of::<Option<K>>()
            + (self.links.lefts.capacity() + self.links.rights.capacity())
                * std::mem::size_of::<u32>()
            + self.values.heap_bytes()
    }
}
