//! Symbol frequency accounting.
//!
//! [`FreqTable`] counts occurrences per symbol and remembers the set of
//! symbols it has seen, in first-seen order. Counting starts in a sparse
//! hash map; once a tenth of the declared alphabet is populated the table
//! switches to a dense vector. The switch is invisible to callers.

use std::collections::HashMap;

use ahash::RandomState;

use crate::stream::Symbol;

/// Fraction of the alphabet (1/DENSE_DENOM) that must be populated before
/// the sparse map is replaced with a dense vector.
const DENSE_DENOM: u128 = 10;

#[derive(Clone)]
enum Repr {
    Sparse(HashMap<Symbol, u128, RandomState>),
    Dense(Vec<u128>),
}

/// A symbol -> count table over a declared alphabet size.
///
/// Counts and the occurrence total are tracked separately so that callers
/// can credit a key with an amount while advancing the effective data size
/// by a different number (the adaptive coder's per-symbol bit accounting
/// relies on this).
#[derive(Clone)]
pub struct FreqTable {
    repr: Repr,
    nonzero: Vec<Symbol>,
    nelem: u128,
    occurrences: u128,
}

impl FreqTable {
    /// Create a table for an alphabet of `nelem` symbols.
    pub fn new(nelem: u128) -> Self {
        Self::with_capacity(nelem, 1024)
    }

    /// Create a table with a pre-sizing hint for the sparse map.
    pub fn with_capacity(nelem: u128, capacity: usize) -> Self {
        Self {
            repr: Repr::Sparse(HashMap::with_capacity_and_hasher(
                capacity,
                RandomState::new(),
            )),
            nonzero: Vec::new(),
            nelem,
            occurrences: 0,
        }
    }

    /// Credit `key` with one occurrence.
    pub fn count(&mut self, key: Symbol) {
        self.count_by(key, 1);
    }

    /// Credit `key` with `amount`, advancing the occurrence total by the
    /// same amount.
    pub fn count_by(&mut self, key: Symbol, amount: u128) {
        *self.slot(key) += amount;
        self.occurrences += amount;
    }

    /// Credit `key` with `amount` while advancing the occurrence total by
    /// `occ` instead.
    pub fn count_weighted(&mut self, key: Symbol, amount: u128, occ: u128) {
        *self.slot(key) += amount;
        self.occurrences += occ;
    }

    /// The count recorded for `key`. Never registers `key` as nonzero.
    pub fn get(&self, key: Symbol) -> u128 {
        match &self.repr {
            Repr::Sparse(map) => map.get(&key).copied().unwrap_or(0),
            Repr::Dense(vec) => vec[key as usize],
        }
    }

    /// The empirical probability of `key`: count over occurrences.
    pub fn freq(&self, key: Symbol) -> f64 {
        self.get(key) as f64 / self.occurrences as f64
    }

    /// Symbols that have been counted at least once, in first-seen order.
    pub fn nonzero_keys(&self) -> &[Symbol] {
        &self.nonzero
    }

    /// Number of distinct symbols counted so far.
    pub fn count_nonzeros(&self) -> usize {
        self.nonzero.len()
    }

    /// Total occurrences credited so far.
    pub fn occurrences(&self) -> u128 {
        self.occurrences
    }

    /// The declared alphabet size.
    pub fn alphabet_size(&self) -> u128 {
        self.nelem
    }

    /// Fold another table's counts into this one. Occurrence totals add
    /// exactly; key order follows this table's first-seen order.
    pub fn merge(&mut self, other: &FreqTable) {
        for &key in other.nonzero_keys() {
            self.count_weighted(key, other.get(key), 0);
        }
        self.occurrences += other.occurrences();
    }

    /// Reset all counts, keys, and the occurrence total.
    pub fn clear(&mut self) {
        match &mut self.repr {
            Repr::Sparse(map) => map.clear(),
            Repr::Dense(vec) => vec.iter_mut().for_each(|c| *c = 0),
        }
        self.nonzero.clear();
        self.occurrences = 0;
    }

    fn slot(&mut self, key: Symbol) -> &mut u128 {
        if let Repr::Sparse(map) = &self.repr {
            if self.nelem <= usize::MAX as u128 && map.len() as u128 >= self.nelem / DENSE_DENOM {
                self.densify();
            }
        }

        match &mut self.repr {
            Repr::Sparse(map) => {
                if !map.contains_key(&key) {
                    self.nonzero.push(key);
                }
                map.entry(key).or_insert(0)
            }
            Repr::Dense(vec) => {
                let idx = key as usize;
                if vec[idx] == 0 {
                    self.nonzero.push(key);
                }
                &mut vec[idx]
            }
        }
    }

    fn densify(&mut self) {
        let mut vec = vec![0u128; self.nelem as usize];

        if let Repr::Sparse(map) = &self.repr {
            for (&key, &count) in map {
                vec[key as usize] = count;
            }
        }

        self.repr = Repr::Dense(vec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_sum_to_occurrences() {
        let mut table = FreqTable::new(1 << 8);
        for key in [3u128, 7, 3, 3, 9, 7] {
            table.count(key);
        }

        assert_eq!(table.occurrences(), 6);
        assert_eq!(table.get(3), 3);
        assert_eq!(table.get(7), 2);
        assert_eq!(table.get(9), 1);
        let sum: u128 = table.nonzero_keys().iter().map(|&k| table.get(k)).sum();
        assert_eq!(sum, table.occurrences());
    }

    #[test]
    fn nonzero_keys_keep_insertion_order() {
        let mut table = FreqTable::new(1 << 8);
        for key in [9u128, 2, 9, 5] {
            table.count(key);
        }
        assert_eq!(table.nonzero_keys(), &[9, 2, 5]);
        assert_eq!(table.count_nonzeros(), 3);
    }

    #[test]
    fn get_does_not_register_keys() {
        let mut table = FreqTable::new(1 << 8);
        assert_eq!(table.get(42), 0);
        assert!(table.nonzero_keys().is_empty());
        table.count(42);
        assert_eq!(table.nonzero_keys(), &[42]);
    }

    #[test]
    fn dense_upgrade_preserves_counts() {
        // Alphabet of 64: the upgrade triggers once seven keys are live.
        let mut table = FreqTable::new(64);
        for key in 0..20u128 {
            table.count_by(key, key + 1);
        }

        assert!(matches!(table.repr, Repr::Dense(_)));
        for key in 0..20u128 {
            assert_eq!(table.get(key), key + 1);
        }
        assert_eq!(table.count_nonzeros(), 20);
    }

    #[test]
    fn tiny_alphabet_goes_dense_immediately() {
        let mut table = FreqTable::new(4);
        table.count(1);
        assert!(matches!(table.repr, Repr::Dense(_)));
    }

    #[test]
    fn weighted_counting_decouples_occurrences() {
        let mut table = FreqTable::new(1 << 8);
        table.count_weighted(5, 12, 1);
        table.count_weighted(5, 6, 1);
        assert_eq!(table.get(5), 18);
        assert_eq!(table.occurrences(), 2);
    }

    #[test]
    fn merge_adds_counts_and_occurrences() {
        let mut a = FreqTable::new(1 << 8);
        let mut b = FreqTable::new(1 << 8);
        a.count(1);
        a.count(2);
        b.count(2);
        b.count(3);

        a.merge(&b);
        assert_eq!(a.get(1), 1);
        assert_eq!(a.get(2), 2);
        assert_eq!(a.get(3), 1);
        assert_eq!(a.occurrences(), 4);
        assert_eq!(a.nonzero_keys(), &[1, 2, 3]);
    }
}
