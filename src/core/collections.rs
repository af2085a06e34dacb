//! Collection helpers: keyed maps, distribution, chunking, merging

use crate::error::{OfficeError, OfficeResult};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::hash::Hash;

/// View a possibly missing vector as a slice
pub fn null_safe<T>(items: Option<&Vec<T>>) -> &[T] {
    items.map(Vec::as_slice).unwrap_or(&[])
}

/// Push `size` clones of `value`
pub fn fill<T: Clone>(items: &mut Vec<T>, value: T, size: usize) {
    items.extend(std::iter::repeat(value).take(size));
}

pub fn filled<T: Clone>(value: T, size: usize) -> Vec<T> {
    vec![value; size]
}

/// One item per key, the last item wins. Items whose key is `None` are skipped.
pub fn id_map<K, V, F>(items: &[V], key: F) -> HashMap<K, &V>
where
    K: Hash + Eq,
    F: Fn(&V) -> Option<K>,
{
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        if let Some(k) = key(item) {
            map.insert(k, item);
        }
    }
    map
}

/// Group items by key, keeping first-seen key order and item order
pub fn multi_map<K, V, F>(items: &[V], key: F) -> IndexMap<K, Vec<&V>>
where
    K: Hash + Eq,
    F: Fn(&V) -> Option<K>,
{
    let mut map: IndexMap<K, Vec<&V>> = IndexMap::new();
    for item in items {
        if let Some(k) = key(item) {
            map.entry(k).or_default().push(item);
        }
    }
    map
}

pub fn count_by<K, V, F>(items: &[V], key: F) -> IndexMap<K, usize>
where
    K: Hash + Eq,
    F: Fn(&V) -> K,
{
    let mut counts: IndexMap<K, usize> = IndexMap::new();
    for item in items {
        *counts.entry(key(item)).or_insert(0) += 1;
    }
    counts
}

/// For every target whose key is in `map`, hand it the mapped value
pub fn distribute<K, V, A, FK, FS>(map: &HashMap<K, V>, targets: &mut [A], key: FK, mut set: FS)
where
    K: Hash + Eq,
    FK: Fn(&A) -> K,
    FS: FnMut(&mut A, &V),
{
    for target in targets.iter_mut() {
        if let Some(value) = map.get(&key(target)) {
            set(target, value);
        }
    }
}

/// Group `sources` by `source_key`, then hand each matching target its group
pub fn multi_distribute<K, V, A, FG, FK, FS>(
    sources: &[V],
    source_key: FG,
    targets: &mut [A],
    key: FK,
    mut set: FS,
) where
    K: Hash + Eq,
    FG: Fn(&V) -> Option<K>,
    FK: Fn(&A) -> K,
    FS: FnMut(&mut A, &[&V]),
{
    let groups = multi_map(sources, source_key);
    for target in targets.iter_mut() {
        if let Some(group) = groups.get(&key(target)) {
            set(target, group);
        }
    }
}

/// Index `sources` by `source_key`, then hand each matching target its source
pub fn single_distribute<K, V, A, FG, FK, FS>(
    sources: &[V],
    source_key: FG,
    targets: &mut [A],
    key: FK,
    mut set: FS,
) where
    K: Hash + Eq,
    FG: Fn(&V) -> Option<K>,
    FK: Fn(&A) -> K,
    FS: FnMut(&mut A, &V),
{
    let index = id_map(sources, source_key);
    for target in targets.iter_mut() {
        if let Some(source) = index.get(&key(target)) {
            set(target, source);
        }
    }
}

/// Chunk into groups of `each_len`; the last group holds the remainder.
/// A zero length yields the whole slice as one group.
pub fn split_list<T>(items: &[T], each_len: usize) -> Vec<&[T]> {
    if items.is_empty() {
        return Vec::new();
    }
    if each_len == 0 {
        return vec![items];
    }
    items.chunks(each_len).collect()
}

/// Run `process` once per chunk, e.g. for batched lookups
pub fn split_process<T, F>(items: &[T], each_len: usize, mut process: F)
where
    F: FnMut(&[T]),
{
    for chunk in split_list(items, each_len) {
        process(chunk);
    }
}

pub fn merge<T: Clone>(collections: &[&[T]]) -> Vec<T> {
    collections.iter().flat_map(|c| c.iter().cloned()).collect()
}

/// Merge keeping the first occurrence of each element
pub fn merge_as_set<T: Clone + Hash + Eq>(collections: &[&[T]]) -> IndexSet<T> {
    collections.iter().flat_map(|c| c.iter().cloned()).collect()
}

pub fn max<T: Ord + Copy>(items: &[T]) -> OfficeResult<T> {
    items
        .iter()
        .copied()
        .max()
        .ok_or_else(|| OfficeError::Conversion("max of an empty collection".to_string()))
}

/// Mean of the non-zero values, `None` when there are none
pub fn average(items: &[f64]) -> Option<f64> {
    let (sum, count) = items
        .iter()
        .filter(|v| **v != 0.0 && !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// True when the collection is non-empty and every element equals the first
pub fn has_unique<T: PartialEq>(items: &[T]) -> bool {
    match items.split_first() {
        None => false,
        Some((first, rest)) => rest.iter().all(|item| item == first),
    }
}

pub fn contains_any<T: PartialEq>(source: &[T], candidates: &[T]) -> bool {
    candidates.iter().any(|c| source.contains(c))
}

/// Elements of `previous` missing from `current`, then elements of `current` missing from `previous`
pub fn difference<T: Clone + Hash + Eq>(previous: &[T], current: &[T]) -> Vec<T> {
    let prev: IndexSet<&T> = previous.iter().collect();
    let cur: IndexSet<&T> = current.iter().collect();
    previous
        .iter()
        .filter(|item| !cur.contains(item))
        .chain(current.iter().filter(|item| !prev.contains(item)))
        .cloned()
        .collect()
}
