//! Ordered set: the same tree with no value column.

use std::fmt;
use std::iter::FusedIterator;
use std::ops::RangeBounds;

use crate::compare::{Comparator, Natural};
use crate::config::TreeConfig;
use crate::error::Result;
use crate::iter::Span;
use crate::link::Side;
use crate::store::{NoValues, NodeStore};
use crate::tree::{RawTree, Target};

/// An ordered set of keys stored in parallel arrays.
///
/// ```rust
/// use packed_avl::TreeSet;
///
/// let mut set: TreeSet<&str> = ["pear", "apple", "fig"].into_iter().collect();
/// assert!(set.insert("kiwi"));
/// assert!(!set.insert("fig"));
/// assert_eq!(set.ceiling(&"b"), Some(&"fig"));
/// assert_eq!(set.iter().copied().collect::<Vec<_>>(), ["apple", "fig", "kiwi", "pear"]);
/// ```
pub struct TreeSet<K, C = Natural> {
    raw: RawTree<K, NoValues, C>,
}

fn or_panic<T>(result: Result<T>) -> T {
    result.unwrap_or_else(|err| panic!("{err}"))
}

impl<K: Ord> TreeSet<K> {
    pub fn new() -> Self {
        Self::with_comparator(Natural)
    }

    /// # Panics
    /// If `capacity` exceeds [`MAX_CAPACITY`](crate::MAX_CAPACITY) or cannot be allocated.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(TreeConfig::with_capacity(capacity))
    }

    /// # Panics
    /// If the initial capacity exceeds [`MAX_CAPACITY`](crate::MAX_CAPACITY) or cannot be allocated.
    pub fn with_config(config: TreeConfig) -> Self {
        or_panic(Self::try_with_config(config))
    }

    pub fn try_with_config(config: TreeConfig) -> Result<Self> {
        Self::try_with_config_and_comparator(config, Natural)
    }
}

impl<K, C: Comparator<K>> TreeSet<K, C> {
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_config_and_comparator(TreeConfig::default(), cmp)
    }

    pub fn with_config_and_comparator(config: TreeConfig, cmp: C) -> Self {
        or_panic(Self::try_with_config_and_comparator(config, cmp))
    }

    pub fn try_with_config_and_comparator(config: TreeConfig, cmp: C) -> Result<Self> {
        Ok(Self {
            raw: RawTree::try_with_config(&config, cmp)?,
        })
    }

    pub fn comparator(&self) -> &C {
        &self.raw.cmp
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    pub fn height(&self) -> usize {
        self.raw.height()
    }

    pub fn memory_usage(&self) -> usize {
        self.raw.store.memory_usage()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.raw.find(key).is_some()
    }

    /// The stored key equal to `key`.
    pub fn get(&self, key: &K) -> Option<&K> {
        self.raw.find(key).map(|slot| self.raw.store.key(slot))
    }

    /// Adds `key`; returns `false` if an equal key was already present, which
    /// is then left in place.
    ///
    /// # Panics
    /// If the set already holds [`MAX_CAPACITY`](crate::MAX_CAPACITY) keys.
    pub fn insert(&mut self, key: K) -> bool {
        or_panic(self.try_insert(key))
    }

    pub fn try_insert(&mut self, key: K) -> Result<bool> {
        let (_, inserted) = self.raw.try_find_or_insert(key)?;
        Ok(inserted)
    }

    /// Adds `key`, replacing and returning an equal key if present.
    pub fn replace(&mut self, key: K) -> Option<K> {
        if let Some(slot) = self.raw.find(&key) {
            return self.raw.store.keys[slot as usize].replace(key);
        }
        self.insert(key);
        None
    }

    pub fn remove(&mut self, key: &K) -> bool {
        self.take(key).is_some()
    }

    /// Removes and returns the stored key equal to `key`.
    pub fn take(&mut self, key: &K) -> Option<K> {
        self.raw.remove(Target::Key(key)).map(|(k, _)| k)
    }

    pub fn pop_first(&mut self) -> Option<K> {
        self.raw.pop_extreme(Side::Left).map(|(k, _)| k)
    }

    pub fn pop_last(&mut self) -> Option<K> {
        self.raw.pop_extreme(Side::Right).map(|(k, _)| k)
    }

    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K) -> bool,
    {
        let store = &self.raw.store;
        let mut span = Span::full(&store.links);
        let mut doomed = Vec::new();
        while let Some(slot) = span.next(&store.links) {
            if !f(store.key(slot)) {
                doomed.push(slot);
            }
        }
        for slot in doomed {
            self.raw.remove(Target::Slot(slot));
        }
    }

    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// # Panics
    /// If the new capacity exceeds [`MAX_CAPACITY`](crate::MAX_CAPACITY) or cannot be allocated.
    pub fn reserve(&mut self, additional: usize) {
        or_panic(self.try_reserve(additional))
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.raw.try_reserve(additional)
    }

    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        self.raw.set_capacity(capacity)
    }

    pub fn shrink_to_fit(&mut self) {
        let len = self.len();
        if self.raw.set_capacity(len).is_ok() {
            tracing::debug!(len, "shrunk tree to fit");
        }
    }

    pub fn first(&self) -> Option<&K> {
        self.key_at(self.raw.extreme(Side::Left))
    }

    pub fn last(&self) -> Option<&K> {
        self.key_at(self.raw.extreme(Side::Right))
    }

    /// Greatest key strictly below `key`.
    pub fn lower(&self, key: &K) -> Option<&K> {
        self.key_at(self.raw.nearest(key, Side::Left, false))
    }

    /// Greatest key at or below `key`.
    pub fn floor(&self, key: &K) -> Option<&K> {
        self.key_at(self.raw.nearest(key, Side::Left, true))
    }

    /// Least key at or above `key`.
    pub fn ceiling(&self, key: &K) -> Option<&K> {
        self.key_at(self.raw.nearest(key, Side::Right, true))
    }

    /// Least key strictly above `key`.
    pub fn higher(&self, key: &K) -> Option<&K> {
        self.key_at(self.raw.nearest(key, Side::Right, false))
    }

    #[inline]
    fn key_at(&self, slot: Option<u32>) -> Option<&K> {
        slot.map(|slot| self.raw.store.key(slot))
    }

    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            range: Range {
                store: &self.raw.store,
                span: Span::full(&self.raw.store.links),
            },
            remaining: self.len(),
        }
    }

    /// Keys within `bounds`, ascending. An inverted range is empty.
    pub fn range<R: RangeBounds<K>>(&self, bounds: R) -> Range<'_, K> {
        Range {
            store: &self.raw.store,
            span: Span::range(&self.raw, bounds.start_bound(), bounds.end_bound()),
        }
    }
}

#[cfg(test)]
impl<K, C: Comparator<K>> TreeSet<K, C> {
    pub(crate) fn assert_valid(&self) {
        self.raw.assert_valid();
    }
}

impl<K: Ord> Default for TreeSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, C: Clone> Clone for TreeSet<K, C> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
        }
    }
}

impl<K: fmt::Debug, C: Comparator<K>> fmt::Debug for TreeSet<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, C: Comparator<K>> PartialEq for TreeSet<K, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, C: Comparator<K>> Eq for TreeSet<K, C> {}

impl<K, C: Comparator<K>> Extend<K> for TreeSet<K, C> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord> FromIterator<K> for TreeSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut set = Self::with_capacity(iter.size_hint().0);
        set.extend(iter);
        set
    }
}

impl<K: Ord, const N: usize> From<[K; N]> for TreeSet<K> {
    fn from(keys: [K; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl<'a, K, C: Comparator<K>> IntoIterator for &'a TreeSet<K, C> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, C: Comparator<K>> IntoIterator for TreeSet<K, C> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> Self::IntoIter {
        let remaining = self.len();
        let store = self.raw.store;
        IntoIter {
            span: Span::full(&store.links),
            store,
            remaining,
        }
    }
}

/// Keys within a range. See [`TreeSet::range`].
pub struct Range<'a, K> {
    store: &'a NodeStore<K, NoValues>,
    span: Span,
}

impl<'a, K> Iterator for Range<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        let store: &'a NodeStore<K, NoValues> = self.store;
        self.span.next(&store.links).map(|slot| store.key(slot))
    }
}

impl<'a, K> DoubleEndedIterator for Range<'a, K> {
    fn next_back(&mut self) -> Option<&'a K> {
        let store: &'a NodeStore<K, NoValues> = self.store;
        self.span.next_back(&store.links).map(|slot| store.key(slot))
    }
}

impl<K> FusedIterator for Range<'_, K> {}

impl<K> Clone for Range<'_, K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            span: self.span.clone(),
        }
    }
}

/// All keys in order. See [`TreeSet::iter`].
pub struct Iter<'a, K> {
    range: Range<'a, K>,
    remaining: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        let key = self.range.next()?;
        self.remaining -= 1;
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> DoubleEndedIterator for Iter<'_, K> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let key = self.range.next_back()?;
        self.remaining -= 1;
        Some(key)
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}
impl<K> FusedIterator for Iter<'_, K> {}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Self {
            range: self.range.clone(),
            remaining: self.remaining,
        }
    }
}

/// Owning iterator in key order.
pub struct IntoIter<K> {
    store: NodeStore<K, NoValues>,
    span: Span,
    remaining: usize,
}

impl<K> IntoIter<K> {
    fn take(&mut self, slot: u32) -> K {
        self.remaining -= 1;
        self.store.keys[slot as usize]
            .take()
            .expect("live slot must hold a key")
    }
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        let slot = self.span.next(&self.store.links)?;
        Some(self.take(slot))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> DoubleEndedIterator for IntoIter<K> {
    fn next_back(&mut self) -> Option<K> {
        let slot = self.span.next_back(&self.store.links)?;
        Some(self.take(slot))
    }
}

impl<K> ExactSizeIterator for IntoIter<K> {}
impl<K> FusedIterator for IntoIter<K> {}
