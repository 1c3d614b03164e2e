use super::*;

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u32),
    Remove(u16),
    Get(u16),
    Floor(u16),
    Ceiling(u16),
    Lower(u16),
    Higher(u16),
    Range(u16, u16),
    PopFirst,
    PopLast,
    Reserve(u8),
    Shrink,
    Clear,
}

fn key_strategy() -> impl Strategy<Value = u16> + Clone {
    // A narrow key space so removals and lookups hit live keys often.
    0u16..512
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        40 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        20 => key.clone().prop_map(Op::Remove),
        10 => key.clone().prop_map(Op::Get),
        5 => key.clone().prop_map(Op::Floor),
        5 => key.clone().prop_map(Op::Ceiling),
        3 => key.clone().prop_map(Op::Lower),
        3 => key.clone().prop_map(Op::Higher),
        5 => (key.clone(), key.clone()).prop_map(|(lo, hi)| Op::Range(lo, hi)),
        2 => Just(Op::PopFirst),
        2 => Just(Op::PopLast),
        2 => any::<u8>().prop_map(Op::Reserve),
        2 => Just(Op::Shrink),
        1 => Just(Op::Clear),
    ];
    prop::collection::vec(op, 0..=1500)
}

fn model_range<V>(m: &BTreeMap<u16, V>, lo: u16, hi: u16) -> Vec<u16> {
    if lo > hi {
        return Vec::new();
    }
    m.range(lo..hi).map(|(k, _)| *k).collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_map_equivalence(ops in ops_strategy()) {
        let mut t: TreeMap<u16, u32> = TreeMap::new();
        let mut m: BTreeMap<u16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    prop_assert_eq!(t.insert(key, value), m.insert(key, value));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(t.remove(&key), m.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(&key));
                }
                Op::Floor(key) => {
                    prop_assert_eq!(t.floor_key_value(&key), m.range(..=key).next_back());
                }
                Op::Ceiling(key) => {
                    prop_assert_eq!(t.ceiling_key_value(&key), m.range(key..).next());
                }
                Op::Lower(key) => {
                    prop_assert_eq!(t.lower_key(&key), m.range(..key).next_back().map(|(k, _)| k));
                }
                Op::Higher(key) => {
                    let expected = m
                        .range((Bound::Excluded(key), Bound::Unbounded))
                        .next()
                        .map(|(k, _)| k);
                    prop_assert_eq!(t.higher_key(&key), expected);
                }
                Op::Range(lo, hi) => {
                    let got: Vec<u16> = t.range(lo..hi).map(|(k, _)| *k).collect();
                    prop_assert_eq!(got, model_range(&m, lo, hi));
                    let back: Vec<u16> = t.range(lo..hi).rev().map(|(k, _)| *k).collect();
                    let mut expected = model_range(&m, lo, hi);
                    expected.reverse();
                    prop_assert_eq!(back, expected);
                }
                Op::PopFirst => {
                    prop_assert_eq!(t.pop_first(), m.pop_first());
                }
                Op::PopLast => {
                    prop_assert_eq!(t.pop_last(), m.pop_last());
                }
                Op::Reserve(additional) => {
                    t.reserve(additional as usize);
                    prop_assert!(t.capacity() >= t.len() + additional as usize);
                }
                Op::Shrink => {
                    t.shrink_to_fit();
                    prop_assert_eq!(t.capacity(), t.len());
                }
                Op::Clear => {
                    t.clear();
                    m.clear();
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        t.assert_valid();
        let got: Vec<(u16, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u16, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, expected);
        prop_assert_eq!(t.iter().len(), m.len());
    }

    #[test]
    fn prop_set_equivalence(ops in ops_strategy()) {
        let mut t: TreeSet<u16> = TreeSet::new();
        let mut m: BTreeSet<u16> = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(key, _) => {
                    prop_assert_eq!(t.insert(key), m.insert(key));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(t.remove(&key), m.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.contains(&key), m.contains(&key));
                }
                Op::Floor(key) => {
                    prop_assert_eq!(t.floor(&key), m.range(..=key).next_back());
                }
                Op::Ceiling(key) => {
                    prop_assert_eq!(t.ceiling(&key), m.range(key..).next());
                }
                Op::Lower(key) => {
                    prop_assert_eq!(t.lower(&key), m.range(..key).next_back());
                }
                Op::Higher(key) => {
                    let expected = m.range((Bound::Excluded(key), Bound::Unbounded)).next();
                    prop_assert_eq!(t.higher(&key), expected);
                }
                Op::Range(lo, hi) => {
                    let got: Vec<u16> = t.range(lo..hi).copied().collect();
                    let expected: Vec<u16> = if lo > hi {
                        Vec::new()
                    } else {
                        m.range(lo..hi).copied().collect()
                    };
                    prop_assert_eq!(got, expected);
                }
                Op::PopFirst => {
                    prop_assert_eq!(t.pop_first(), m.pop_first());
                }
                Op::PopLast => {
                    prop_assert_eq!(t.pop_last(), m.pop_last());
                }
                Op::Reserve(additional) => {
                    t.reserve(additional as usize);
                }
                Op::Shrink => {
                    t.shrink_to_fit();
                }
                Op::Clear => {
                    t.clear();
                    m.clear();
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        t.assert_valid();
        let got: Vec<u16> = t.iter().copied().collect();
        let expected: Vec<u16> = m.iter().copied().collect();
        prop_assert_eq!(got, expected);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<u32> = (0..7).collect();

    for_each_permutation(&keys, |perm| {
        // Capacity 1 forces several rebuilds along the way.
        let mut t: TreeMap<u32, u64> = TreeMap::with_capacity(1);
        let mut m: BTreeMap<u32, u64> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            let v = i as u64;
            assert_eq!(t.insert(k, v), m.insert(k, v));
            t.assert_valid();
        }

        assert!(t.height() <= 4);
        let got: Vec<(u32, u64)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u32, u64)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys: Vec<u32> = (0..7).collect();

    // Insert in a fixed order, then remove in all permutations.
    let mut base_tree: TreeMap<u32, u64> = TreeMap::new();
    let mut base_map: BTreeMap<u32, u64> = BTreeMap::new();
    for (i, k) in keys.iter().enumerate() {
        let v = i as u64;
        assert_eq!(base_tree.insert(*k, v), base_map.insert(*k, v));
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base_tree.clone();
        let mut m = base_map.clone();

        for k in perm {
            assert_eq!(t.remove(&k), m.remove(&k));
            assert_eq!(t.len(), m.len());
            t.assert_valid();
        }
        assert!(t.is_empty());
        assert_eq!(t.height(), 0);
    });
}

#[test]
fn exhaustive_remove_after_shrink() {
    let keys: Vec<u32> = (0..6).collect();

    let mut base: TreeSet<u32> = TreeSet::with_capacity(32);
    for k in [3, 1, 5, 0, 2, 4] {
        base.insert(k);
    }
    base.shrink_to_fit();

    for_each_permutation(&keys, |perm| {
        let mut t = base.clone();
        for (i, k) in perm.iter().enumerate() {
            assert!(t.remove(k));
            t.assert_valid();
            let mut rest = perm[i + 1..].to_vec();
            rest.sort_unstable();
            assert_eq!(t.iter().copied().collect::<Vec<_>>(), rest);
        }
        // Every slot is free again and reusable without growth.
        for k in perm {
            assert!(t.insert(k));
        }
        assert_eq!(t.capacity(), 6);
        t.assert_valid();
    });
}

#[test]
fn randomized_churn_with_resizing() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut t: TreeMap<u32, u32> = TreeMap::new();
    let mut m: BTreeMap<u32, u32> = BTreeMap::new();

    for round in 0..50_000u32 {
        let key = rng.gen_range(0..2_000u32);
        match rng.gen_range(0..100) {
            0..=54 => assert_eq!(t.insert(key, round), m.insert(key, round)),
            55..=94 => assert_eq!(t.remove(&key), m.remove(&key)),
            95..=97 => {
                let lo = rng.gen_range(0..2_000u32);
                let hi = lo + rng.gen_range(0..200u32);
                assert!(t.range(lo..hi).map(|(k, v)| (*k, *v)).eq(m.range(lo..hi).map(|(k, v)| (*k, *v))));
            }
            98 => t.shrink_to_fit(),
            _ => t.reserve(rng.gen_range(0..500)),
        }
        if round % 5_000 == 0 {
            t.assert_valid();
        }
    }

    t.assert_valid();
    assert!(t.iter().map(|(k, v)| (*k, *v)).eq(m.iter().map(|(k, v)| (*k, *v))));
}

#[test]
fn clear_then_reuse_matches_fresh_tree() {
    let mut t: TreeMap<u32, u32> = (0..100).map(|k| (k, k)).collect();
    let capacity = t.capacity();
    t.clear();
    t.assert_valid();
    t.clear();
    t.assert_valid();
    assert_eq!(t.capacity(), capacity);

    for k in (0..100).rev() {
        t.insert(k, k + 1);
    }
    assert_eq!(t.capacity(), capacity);
    t.assert_valid();
    assert!(t.values().copied().eq(1..=100));
}
