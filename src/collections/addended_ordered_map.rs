/* SPDX-FileCopyrightText: © 2024-2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::btree_map::{self, BTreeMap};
use core::ops::RangeBounds;

/// Controls how lookups on an [`AddendedOrderedMap`] behave when the exact
/// key is missing.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FindSettings {
    allow_addend: bool,
    check_upper_limit: bool,
}

impl FindSettings {
    #[must_use]
    pub const fn new(allow_addend: bool) -> Self {
        Self {
            allow_addend,
            check_upper_limit: true,
        }
    }

    #[must_use]
    pub const fn with_allow_addend(self, allow_addend: bool) -> Self {
        Self {
            allow_addend,
            ..self
        }
    }

    #[must_use]
    pub const fn with_check_upper_limit(self, check_upper_limit: bool) -> Self {
        Self {
            check_upper_limit,
            ..self
        }
    }

    #[must_use]
    pub const fn allow_addend(&self) -> bool {
        self.allow_addend
    }

    #[must_use]
    pub const fn check_upper_limit(&self) -> bool {
        self.check_upper_limit
    }
}

impl Default for FindSettings {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Values stored in an [`AddendedOrderedMap`] must know how far past their
/// own key an addended lookup may still land inside them.
pub trait AddendedValue<K> {
    /// One-past-the-end key of this value's body.
    fn addended_limit(&self, key: K) -> K;
}

/// An ordered map which can resolve a key that lands *inside* a stored
/// value's body, yielding that value instead of a miss.
#[derive(Debug, Clone, PartialEq)]
pub struct AddendedOrderedMap<K, V> {
    map: BTreeMap<K, V>,
}

impl<K: Ord + Copy, V: AddendedValue<K>> AddendedOrderedMap<K, V> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    fn find_key(&self, key: K, settings: FindSettings) -> Option<K> {
        if self.map.contains_key(&key) {
            return Some(key);
        }
        if !settings.allow_addend {
            return None;
        }

        let (k, v) = self.map.range(..=key).next_back()?;
        if !settings.check_upper_limit || key < v.addended_limit(*k) {
            Some(*k)
        } else {
            None
        }
    }

    #[must_use]
    pub fn find(&self, key: K, settings: FindSettings) -> Option<&V> {
        let k = self.find_key(key, settings)?;
        self.map.get(&k)
    }

    #[must_use]
    pub fn find_mut(&mut self, key: K, settings: FindSettings) -> Option<&mut V> {
        let k = self.find_key(key, settings)?;
        self.map.get_mut(&k)
    }

    /// Finds the value owning `key`, inserting a fresh one if no value claims
    /// it. The `bool` is `true` when the value was newly created.
    pub fn find_mut_or_insert_with(
        &mut self,
        key: K,
        settings: FindSettings,
        default: impl FnOnce() -> (K, V),
    ) -> (&mut V, bool) {
        match self.find_key(key, settings) {
            Some(k) => {
                let v = self
                    .map
                    .get_mut(&k)
                    .expect("Key was just resolved from this map");
                (v, false)
            }
            None => {
                let (k, v) = default();
                (self.map.entry(k).or_insert(v), true)
            }
        }
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    #[must_use]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.map.get_mut(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn range<R: RangeBounds<K>>(&self, range: R) -> btree_map::Range<'_, K, V> {
        self.map.range(range)
    }

    pub fn range_mut<R: RangeBounds<K>>(&mut self, range: R) -> btree_map::RangeMut<'_, K, V> {
        self.map.range_mut(range)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, K, V> {
        self.map.iter()
    }

    pub fn values(&self) -> btree_map::Values<'_, K, V> {
        self.map.values()
    }

    pub fn values_mut(&mut self) -> btree_map::ValuesMut<'_, K, V> {
        self.map.values_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Ord + Copy, V: AddendedValue<K>> Default for AddendedOrderedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, K: Ord + Copy, V> IntoIterator for &'a AddendedOrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = btree_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}
