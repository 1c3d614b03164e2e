//! Ordered map over an array-resident AVL tree.

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ops::{Index, RangeBounds};

use crate::compare::{Comparator, Natural};
use crate::config::TreeConfig;
use crate::error::Result;
use crate::iter::Span;
use crate::link::Side;
use crate::store::{Links, NodeStore, ValueArray, ValueColumn};
use crate::tree::{RawTree, Target};

/// An ordered map whose nodes live in parallel arrays.
///
/// Keys are ordered by the comparator `C` ([`Natural`] by default). Each entry
/// costs one key, one value and two `u32` links; there is no per-node
/// allocation.
///
/// ```rust
/// use packed_avl::TreeMap;
///
/// let mut map = TreeMap::new();
/// map.insert(3, "c");
/// map.insert(1, "a");
/// map.insert(2, "b");
///
/// assert_eq!(map.get(&2), Some(&"b"));
/// assert_eq!(map.floor_key(&5), Some(&3));
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
/// ```
pub struct TreeMap<K, V, C = Natural> {
    raw: RawTree<K, ValueArray<V>, C>,
}

fn or_panic<T>(result: Result<T>) -> T {
    result.unwrap_or_else(|err| panic!("{err}"))
}

impl<K: Ord, V> TreeMap<K, V> {
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

impl<K, V, C: Comparator<K>> TreeMap<K, V, C> {
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

    /// Number of slots, live or free.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Height of the underlying tree; `0` when empty.
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Bytes held by the backing arrays.
    pub fn memory_usage(&self) -> usize {
        self.raw.store.memory_usage()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn get(&self, key: &K) -> Option<&V> {
        self.raw.find(key).map(|slot| self.raw.value(slot))
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let slot = self.raw.find(key)?;
        self.raw.store.values.get_mut(slot)
    }

    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.raw.find(key).map(|slot| self.entry(slot))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.raw.find(key).is_some()
    }

    /// Linear scan.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }

    /// Whether `key` is present and mapped to `value`.
    pub fn contains_entry(&self, key: &K, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.get(key) == Some(value)
    }

    #[inline]
    fn entry(&self, slot: u32) -> (&K, &V) {
        (self.raw.store.key(slot), self.raw.value(slot))
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Inserts or replaces, returning the previous value.
    ///
    /// # Panics
    /// If the map already holds [`MAX_CAPACITY`](crate::MAX_CAPACITY) entries.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        or_panic(self.try_insert(key, value))
    }

    /// Like [`insert`](Self::insert), but reports a failed growth instead of
    /// panicking. The map is unchanged on error.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let (slot, _) = self.raw.try_find_or_insert(key)?;
        Ok(self.raw.store.values.put(slot, value))
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        self.raw.remove(Target::Key(key)).map(expect_value)
    }

    /// Removes `key` only if it is mapped to `value`.
    pub fn remove_entry_if(&mut self, key: &K, value: &V) -> Option<(K, V)>
    where
        V: PartialEq,
    {
        if !self.contains_entry(key, value) {
            return None;
        }
        self.remove_entry(key)
    }

    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.raw.pop_extreme(Side::Left).map(expect_value)
    }

    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.raw.pop_extreme(Side::Right).map(expect_value)
    }

    /// Keeps only the entries for which `f` returns `true`.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let store = &mut self.raw.store;
        let mut span = Span::full(&store.links);
        let mut doomed = Vec::new();
        while let Some(slot) = span.next(&store.links) {
            let key = store.keys[slot as usize]
                .as_ref()
                .expect("live slot must hold a key");
            let value = store
                .values
                .get_mut(slot)
                .expect("live slot must hold a value");
            if !f(key, value) {
                doomed.push(slot);
            }
        }
        for slot in doomed {
            self.raw.remove(Target::Slot(slot));
        }
    }

    /// Removes every entry, keeping the capacity.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    // =========================================================================
    // Capacity
    // =========================================================================

    /// # Panics
    /// If the new capacity exceeds [`MAX_CAPACITY`](crate::MAX_CAPACITY) or cannot be allocated.
    pub fn reserve(&mut self, additional: usize) {
        or_panic(self.try_reserve(additional))
    }

    /// Ensures `additional` more entries fit without reallocating. Slot
    /// positions change when the arrays are rebuilt.
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.raw.try_reserve(additional)
    }

    /// Rebuilds into exactly `capacity` slots; fails if fewer than `len()`.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        self.raw.set_capacity(capacity)
    }

    pub fn shrink_to_fit(&mut self) {
        let len = self.len();
        if self.raw.set_capacity(len).is_ok() {
            tracing::debug!(len, "shrunk tree to fit");
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.raw.extreme(Side::Left).map(|slot| self.entry(slot))
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.raw.extreme(Side::Right).map(|slot| self.entry(slot))
    }

    /// Greatest entry strictly below `key`.
    pub fn lower_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.raw
            .nearest(key, Side::Left, false)
            .map(|slot| self.entry(slot))
    }

    /// Greatest entry at or below `key`.
    pub fn floor_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.raw
            .nearest(key, Side::Left, true)
            .map(|slot| self.entry(slot))
    }

    /// Least entry at or above `key`.
    pub fn ceiling_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.raw
            .nearest(key, Side::Right, true)
            .map(|slot| self.entry(slot))
    }

    /// Least entry strictly above `key`.
    pub fn higher_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.raw
            .nearest(key, Side::Right, false)
            .map(|slot| self.entry(slot))
    }

    pub fn first_key(&self) -> Option<&K> {
        self.first_key_value().map(|(k, _)| k)
    }

    pub fn last_key(&self) -> Option<&K> {
        self.last_key_value().map(|(k, _)| k)
    }

    pub fn lower_key(&self, key: &K) -> Option<&K> {
        self.lower_key_value(key).map(|(k, _)| k)
    }

    pub fn floor_key(&self, key: &K) -> Option<&K> {
        self.floor_key_value(key).map(|(k, _)| k)
    }

    pub fn ceiling_key(&self, key: &K) -> Option<&K> {
        self.ceiling_key_value(key).map(|(k, _)| k)
    }

    pub fn higher_key(&self, key: &K) -> Option<&K> {
        self.higher_key_value(key).map(|(k, _)| k)
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            range: Range {
                store: &self.raw.store,
                span: Span::full(&self.raw.store.links),
            },
            remaining: self.len(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let remaining = self.len();
        let store = &mut self.raw.store;
        IterMut {
            span: Span::full(&store.links),
            links: &store.links,
            keys: &store.keys,
            values: store.values.as_mut_ptr(),
            remaining,
            _marker: PhantomData,
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Entries whose keys fall within `bounds`, in ascending order. An
    /// inverted range is empty.
    pub fn range<R: RangeBounds<K>>(&self, bounds: R) -> Range<'_, K, V> {
        Range {
            store: &self.raw.store,
            span: Span::range(&self.raw, bounds.start_bound(), bounds.end_bound()),
        }
    }

    pub fn into_keys(self) -> IntoKeys<K, V> {
        IntoKeys {
            inner: self.into_iter(),
        }
    }

    pub fn into_values(self) -> IntoValues<K, V> {
        IntoValues {
            inner: self.into_iter(),
        }
    }
}

#[cfg(test)]
impl<K, V, C: Comparator<K>> TreeMap<K, V, C> {
    pub(crate) fn assert_valid(&self) {
        self.raw.assert_valid();
    }
}

fn expect_value<K, V>((key, value): (K, Option<V>)) -> (K, V) {
    (key, value.expect("live slot must hold a value"))
}

impl<K: Ord, V> Default for TreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone, C: Clone> Clone for TreeMap<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C: Comparator<K>> fmt::Debug for TreeMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq, C: Comparator<K>> PartialEq for TreeMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C: Comparator<K>> Eq for TreeMap<K, V, C> {}

impl<K, V, C: Comparator<K>> Index<&K> for TreeMap<K, V, C> {
    type Output = V;

    /// # Panics
    /// If `key` is not present.
    fn index(&self, key: &K) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, C: Comparator<K>> Extend<(K, V)> for TreeMap<K, V, C> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for TreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity(iter.size_hint().0);
        map.extend(iter);
        map
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for TreeMap<K, V> {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<'a, K, V, C: Comparator<K>> IntoIterator for &'a TreeMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, C: Comparator<K>> IntoIterator for &'a mut TreeMap<K, V, C> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, C: Comparator<K>> IntoIterator for TreeMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

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

// =============================================================================
// Iterators
// =============================================================================

/// Entries within a key range. See [`TreeMap::range`].
pub struct Range<'a, K, V> {
    store: &'a NodeStore<K, ValueArray<V>>,
    span: Span,
}

impl<'a, K, V> Range<'a, K, V> {
    #[inline]
    fn entry(&self, slot: u32) -> (&'a K, &'a V) {
        let store: &'a NodeStore<K, ValueArray<V>> = self.store;
        (
            store.key(slot),
            store.values.get(slot).expect("live slot must hold a value"),
        )
    }
}

impl<'a, K, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.span.next(&self.store.links)?;
        Some(self.entry(slot))
    }
}

impl<K, V> DoubleEndedIterator for Range<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let slot = self.span.next_back(&self.store.links)?;
        Some(self.entry(slot))
    }
}

impl<K, V> FusedIterator for Range<'_, K, V> {}

impl<K, V> Clone for Range<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            span: self.span.clone(),
        }
    }
}

/// All entries in key order. See [`TreeMap::iter`].
pub struct Iter<'a, K, V> {
    range: Range<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.range.next()?;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let item = self.range.next_back()?;
        self.remaining -= 1;
        Some(item)
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            range: self.range.clone(),
            remaining: self.remaining,
        }
    }
}

/// All entries in key order with mutable values. See [`TreeMap::iter_mut`].
pub struct IterMut<'a, K, V> {
    span: Span,
    links: &'a Links,
    keys: &'a [Option<K>],
    /// Base of the value column, exclusively borrowed for `'a`.
    values: *mut Option<V>,
    remaining: usize,
    _marker: PhantomData<&'a mut V>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    fn entry(&mut self, slot: u32) -> (&'a K, &'a mut V) {
        self.remaining -= 1;
        let keys: &'a [Option<K>] = self.keys;
        let key = keys[slot as usize]
            .as_ref()
            .expect("live slot must hold a key");
        // SAFETY: `values` points at a column of `links.capacity()` elements that is
        // mutably borrowed for `'a`, and a span yields each live slot at most once,
        // so no two returned references alias.
        let value = unsafe { (*self.values.add(slot as usize)).as_mut() };
        (key, value.expect("live slot must hold a value"))
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.span.next(self.links)?;
        Some(self.entry(slot))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let slot = self.span.next_back(self.links)?;
        Some(self.entry(slot))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// See [`TreeMap::keys`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// See [`TreeMap::values`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// See [`TreeMap::values_mut`].
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// Owning iterator in key order.
pub struct IntoIter<K, V> {
    store: NodeStore<K, ValueArray<V>>,
    span: Span,
    remaining: usize,
}

impl<K, V> IntoIter<K, V> {
    /// Moves the entry out; the links stay intact so the walk can continue.
    fn take(&mut self, slot: u32) -> (K, V) {
        self.remaining -= 1;
        let key = self.store.keys[slot as usize]
            .take()
            .expect("live slot must hold a key");
        let value = self
            .store
            .values
            .take(slot)
            .expect("live slot must hold a value");
        (key, value)
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let slot = self.span.next(&self.store.links)?;
        Some(self.take(slot))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<(K, V)> {
        let slot = self.span.next_back(&self.store.links)?;
        Some(self.take(slot))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

/// See [`TreeMap::into_keys`].
pub struct IntoKeys<K, V> {
    inner: IntoIter<K, V>,
}

impl<K, V> Iterator for IntoKeys<K, V> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoKeys<K, V> {
    fn next_back(&mut self) -> Option<K> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for IntoKeys<K, V> {}

/// See [`TreeMap::into_values`].
pub struct IntoValues<K, V> {
    inner: IntoIter<K, V>,
}

impl<K, V> Iterator for IntoValues<K, V> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoValues<K, V> {
    fn next_back(&mut self) -> Option<V> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for IntoValues<K, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GrowthPolicy;
    use crate::error::CapacityError;
    use crate::link::MAX_CAPACITY;
    use std::ops::Bound;

    fn map_of(keys: &[i32]) -> TreeMap<i32, String> {
        keys.iter().map(|&k| (k, format!("v{k}"))).collect()
    }

    #[test]
    fn basic() {
        let mut m: TreeMap<i32, u64> = TreeMap::new();
        assert_eq!(m.insert(5, 50), None);
        assert_eq!(m.insert(3, 30), None);
        assert_eq!(m.insert(5, 55), Some(50));
        assert_eq!(m.get(&5), Some(&55));
        assert_eq!(m.get(&4), None);
        assert_eq!(m.len(), 2);
        assert!(m.contains_key(&3));
        assert!(!m.contains_key(&4));
        assert_eq!(m[&3], 30);
    }

    #[test]
    fn insert_with_forced_growth() {
        let mut m = TreeMap::with_capacity(4);
        for k in [5, 3, 8, 1, 4, 7, 9] {
            m.insert(k, k * 10);
        }
        assert_eq!(m.keys().copied().collect::<Vec<_>>(), vec![1, 3, 4, 5, 7, 8, 9]);
        assert!(m.height() <= 3);
        assert!(m.capacity() >= 7);
        m.raw.assert_valid();
    }

    #[test]
    fn remove_then_lookup() {
        let mut m = map_of(&[10, 20, 30]);
        assert_eq!(m.remove(&20), Some("v20".to_string()));
        assert_eq!(m.get(&20), None);
        assert!(m.get(&10).is_some());
        assert!(m.get(&30).is_some());
        assert_eq!(m.keys().copied().collect::<Vec<_>>(), vec![10, 30]);
        assert_eq!(m.remove(&20), None);
        m.raw.assert_valid();
    }

    #[test]
    fn sequential_inserts_stay_balanced() {
        let m: TreeMap<i32, i32> = (1..=100).map(|k| (k, k)).collect();
        assert!(m.height() <= 8, "height {}", m.height());
        m.raw.assert_valid();
    }

    #[test]
    fn navigation() {
        let m = map_of(&[1, 3, 5, 7, 9]);
        assert_eq!(m.floor_key(&6), Some(&5));
        assert_eq!(m.ceiling_key(&6), Some(&7));
        assert_eq!(m.floor_key(&5), Some(&5));
        assert_eq!(m.lower_key(&5), Some(&3));
        assert_eq!(m.higher_key(&5), Some(&7));
        assert_eq!(m.lower_key(&1), None);
        assert_eq!(m.higher_key(&9), None);
        assert_eq!(m.ceiling_key_value(&8), Some((&9, &"v9".to_string())));
        assert_eq!(m.first_key(), Some(&1));
        assert_eq!(m.last_key(), Some(&9));

        let empty: TreeMap<i32, i32> = TreeMap::new();
        assert_eq!(empty.first_key_value(), None);
        assert_eq!(empty.floor_key(&3), None);
    }

    #[test]
    fn iteration_both_ways() {
        let m = map_of(&[4, 2, 6, 1, 3, 5, 7]);
        let fwd: Vec<i32> = m.iter().map(|(k, _)| *k).collect();
        let back: Vec<i32> = m.iter().rev().map(|(k, _)| *k).collect();
        assert_eq!(fwd, (1..=7).collect::<Vec<_>>());
        assert_eq!(back, (1..=7).rev().collect::<Vec<_>>());
        assert_eq!(m.iter().len(), 7);

        let mut it = m.keys();
        assert_eq!(it.next(), Some(&1));
        assert_eq!(it.next_back(), Some(&7));
        assert_eq!(it.len(), 5);
        assert_eq!(it.collect::<Vec<_>>(), vec![&2, &3, &4, &5, &6]);

        // Restartable.
        assert_eq!(m.iter().count(), m.iter().count());
    }

    #[test]
    fn ranges() {
        let m = map_of(&[1, 3, 5, 7, 9]);
        let keys = |r: Range<'_, i32, String>| r.map(|(k, _)| *k).collect::<Vec<_>>();
        assert_eq!(keys(m.range(3..7)), vec![3, 5]);
        assert_eq!(keys(m.range(3..=7)), vec![3, 5, 7]);
        assert_eq!(keys(m.range(..)), vec![1, 3, 5, 7, 9]);
        assert_eq!(keys(m.range(4..)), vec![5, 7, 9]);
        assert_eq!(keys(m.range(..=1)), vec![1]);
        assert_eq!(keys(m.range((Bound::Excluded(1), Bound::Excluded(9)))), vec![3, 5, 7]);
        assert_eq!(keys(m.range(6..6)), Vec::<i32>::new());
        assert_eq!(
            m.range(2..9).rev().map(|(k, _)| *k).collect::<Vec<_>>(),
            vec![7, 5, 3]
        );
    }

    #[test]
    fn mutable_views() {
        let mut m = map_of(&[1, 2, 3]);
        for (k, v) in m.iter_mut() {
            v.push_str(&k.to_string());
        }
        assert_eq!(m[&2], "v22");
        for v in m.values_mut().rev() {
            v.clear();
        }
        assert!(m.values().all(String::is_empty));
        if let Some(v) = m.get_mut(&3) {
            *v = "three".into();
        }
        assert_eq!(m.get(&3).map(String::as_str), Some("three"));
        for (_, v) in &mut m {
            v.push('!');
        }
        assert_eq!(m[&3], "three!");
    }

    #[test]
    fn value_and_entry_queries() {
        let mut m = map_of(&[1, 2, 3]);
        assert!(m.contains_value(&"v2".to_string()));
        assert!(!m.contains_value(&"v9".to_string()));
        assert!(m.contains_entry(&1, &"v1".to_string()));
        assert!(!m.contains_entry(&1, &"v2".to_string()));
        assert_eq!(m.remove_entry_if(&1, &"nope".to_string()), None);
        assert_eq!(m.remove_entry_if(&1, &"v1".to_string()), Some((1, "v1".to_string())));
        assert_eq!(m.get_key_value(&2), Some((&2, &"v2".to_string())));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn pop_and_retain() {
        let mut m: TreeMap<i32, i32> = (0..20).map(|k| (k, k * k)).collect();
        assert_eq!(m.pop_first(), Some((0, 0)));
        assert_eq!(m.pop_last(), Some((19, 361)));
        m.retain(|k, v| {
            *v += 1;
            k % 3 == 0
        });
        assert_eq!(
            m.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
            vec![(3, 10), (6, 37), (9, 82), (12, 145), (15, 226), (18, 325)]
        );
        m.raw.assert_valid();
    }

    #[test]
    fn clear_twice() {
        let mut m = map_of(&[1, 2, 3]);
        let capacity = m.capacity();
        m.clear();
        m.raw.assert_valid();
        m.clear();
        m.raw.assert_valid();
        assert!(m.is_empty());
        assert_eq!(m.capacity(), capacity);
        assert_eq!(m.iter().next(), None);
        m.insert(9, "v9".into());
        assert_eq!(m.keys().collect::<Vec<_>>(), vec![&9]);
    }

    #[test]
    fn capacity_operations() {
        let mut m = map_of(&[1, 2, 3]);
        m.reserve(100);
        assert!(m.capacity() >= 103);
        let before: Vec<_> = m.iter().map(|(k, v)| (*k, v.clone())).collect();
        m.shrink_to_fit();
        assert_eq!(m.capacity(), 3);
        assert!(m.set_capacity(2).is_err());
        assert_eq!(m.iter().map(|(k, v)| (*k, v.clone())).collect::<Vec<_>>(), before);
        assert!(m.memory_usage() > 0);
        m.raw.assert_valid();
    }

    #[test]
    fn custom_comparator() {
        let mut m = TreeMap::with_comparator(|a: &i32, b: &i32| b.cmp(a));
        for k in [1, 5, 3] {
            m.insert(k, ());
        }
        assert_eq!(m.keys().copied().collect::<Vec<_>>(), vec![5, 3, 1]);
        assert_eq!(m.floor_key(&4), Some(&5));
        assert_eq!(m.ceiling_key(&4), Some(&3));
    }

    #[test]
    fn config_constructors() {
        let config = TreeConfig::with_capacity(4).growth(GrowthPolicy::Double);
        let mut m = TreeMap::with_config(config.clone());
        for k in 0..5 {
            m.insert(k, k);
        }
        assert_eq!(m.capacity(), 8);

        let rev = TreeMap::<i32, i32, _>::with_config_and_comparator(config, |a: &i32, b: &i32| {
            b.cmp(a)
        });
        assert_eq!(rev.capacity(), 4);

        let too_big = TreeConfig::with_capacity(MAX_CAPACITY + 1);
        assert!(matches!(
            TreeMap::<u8, u8>::try_with_config(too_big),
            Err(CapacityError::TooLarge { .. })
        ));
    }

    #[test]
    fn owning_iterators() {
        let m = map_of(&[2, 1, 3]);
        assert_eq!(m.clone().into_keys().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(
            m.clone().into_values().rev().collect::<Vec<_>>(),
            vec!["v3", "v2", "v1"]
        );
        let mut it = m.into_iter();
        assert_eq!(it.next(), Some((1, "v1".to_string())));
        assert_eq!(it.len(), 2);
        // Remaining entries are dropped with the iterator.
    }

    #[test]
    fn equality_debug_and_from() {
        let a = TreeMap::from([(1, 'a'), (2, 'b')]);
        let mut b = TreeMap::new();
        b.insert(2, 'b');
        b.insert(1, 'a');
        assert_eq!(a, b);
        b.insert(3, 'c');
        assert_ne!(a, b);
        assert_eq!(format!("{a:?}"), "{1: 'a', 2: 'b'}");
    }
}
