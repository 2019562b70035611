//! Generic ordered container used by the Run Queue and the Event Tree.
//!
//! The source this simulator is modelled on keeps a hand-rolled red-black
//! tree of opaque element pointers, parameterised by a caller-supplied
//! comparator. Rust already has that container: a `BTreeSet` keyed by the
//! element's own `Ord` impl gives the same O(log n) insert/delete/search/min
//! contract without opaque pointers, which is exactly the re-architecting
//! the comparator-parameterised containers call for — the teacher's own
//! `CfsRunQueue` makes the identical substitution (`BTreeMap` in place of a
//! conceptual red-black tree).
//!
//! `OrderedSet` does not support duplicate keys under `T::Ord`, matching the
//! "no duplicate keys under their comparators" invariant.

use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct OrderedSet<T: Ord> {
    inner: BTreeSet<T>,
}

impl<T: Ord> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> OrderedSet<T> {
    pub fn new() -> Self {
        Self { inner: BTreeSet::new() }
    }

    /// Insert `x`. Returns `false` if an equal element was already present
    /// (in which case the old element is left in place — see `spec.md` §9's
    /// open question on this; the engine never inserts duplicate keys in
    /// practice, so this case is an invariant-checking signal, not a
    /// supported path).
    pub fn insert(&mut self, x: T) -> bool {
        self.inner.insert(x)
    }

    /// Remove any one element equal to `x`. Returns it if present.
    pub fn delete(&mut self, x: &T) -> Option<T> {
        self.inner.take(x)
    }

    /// The stored element equal to `k`, if any.
    pub fn search(&self, k: &T) -> Option<&T> {
        self.inner.get(k)
    }

    /// The least element, without removing it.
    pub fn min(&self) -> Option<&T> {
        self.inner.iter().next()
    }

    /// Remove and return the least element.
    pub fn pop_min(&mut self) -> Option<T> {
        self.inner.pop_first()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// In-order iteration, ascending.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.inner.iter()
    }
}
