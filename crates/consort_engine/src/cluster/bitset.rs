//! Sets of catalog indices backed by a roaring bitmap.

use std::fmt;

use roaring::RoaringTreemap;

/// A set of catalog indices.
///
/// Sets over the same catalog carry the same capacity; equality looks only
/// at the members.
#[derive(Clone)]
pub struct BitSet {
    bits: RoaringTreemap,
    capacity: usize,
}

impl BitSet {
    /// Creates an empty set meant for indices below `capacity`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            bits: RoaringTreemap::new(),
            capacity,
        }
    }

    /// Creates a set from indices.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if an index is not below `capacity`.
    #[must_use]
    pub fn from_indices(capacity: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut set = Self::new(capacity);
        for i in indices {
            set.insert(i);
        }
        set
    }

    /// Capacity the set was created with.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Adds an index.
    pub fn insert(&mut self, i: usize) {
        debug_assert!(i < self.capacity, "index {i} out of range {}", self.capacity);
        self.bits.insert(i as u64);
    }

    /// Removes an index.
    pub fn remove(&mut self, i: usize) {
        self.bits.remove(i as u64);
    }

    /// Returns true if the index is present.
    #[must_use]
    pub fn contains(&self, i: usize) -> bool {
        self.bits.contains(i as u64)
    }

    /// Number of indices present.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn len(&self) -> usize {
        self.bits.len() as usize
    }

    /// Returns true if no index is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Indices in ascending order.
    #[must_use]
    pub fn iter(&self) -> Ones<'_> {
        Ones {
            inner: self.bits.iter(),
        }
    }

    /// Returns `self ∩ other`.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            bits: &self.bits & &other.bits,
            capacity: self.capacity,
        }
    }

    /// Keeps only indices also in `other`.
    pub fn intersect_with(&mut self, other: &Self) {
        self.bits &= &other.bits;
    }

    /// Adds every index of `other`.
    pub fn union_with(&mut self, other: &Self) {
        self.bits |= &other.bits;
    }

    /// Removes every index of `other`.
    pub fn difference_with(&mut self, other: &Self) {
        self.bits -= &other.bits;
    }

    /// `|self ∩ other|` without allocating.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn intersection_len(&self, other: &Self) -> usize {
        self.bits.intersection_len(&other.bits) as usize
    }

    /// Returns true if every index of `self` is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.bits.is_subset(&other.bits)
    }

    /// Removes every index `<= i`.
    pub fn retain_above(&mut self, i: usize) {
        self.bits.remove_range(..=i as u64);
    }
}

impl PartialEq for BitSet {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl Eq for BitSet {}

impl fmt::Debug for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Ascending iterator over the indices of a [`BitSet`].
pub struct Ones<'a> {
    inner: roaring::treemap::Iter<'a>,
}

impl fmt::Debug for Ones<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ones").finish_non_exhaustive()
    }
}

impl Iterator for Ones<'_> {
    type Item = usize;

    #[allow(clippy::cast_possible_truncation)]
    fn next(&mut self) -> Option<usize> {
        // Members were inserted from usize, so they fit back.
        self.inner.next().map(|i| i as usize)
    }
}

impl<'a> IntoIterator for &'a BitSet {
    type Item = usize;
    type IntoIter = Ones<'a>;

    fn into_iter(self) -> Ones<'a> {
        self.iter()
    }
}
