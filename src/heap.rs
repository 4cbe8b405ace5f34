/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Indexed max-heap over arbitrary `usize` indices.
//!
//! Used by the deterministic splitter to track, for every live Q′-run head,
//! its current weight, and to repeatedly pull the heaviest run: a
//! `Vec`-backed swim/sink binary heap plus a `HashMap` side table from index
//! to heap position, so `promote`/`demote` can reach an arbitrary entry
//! without a linear scan.

use std::collections::HashMap;
use std::io::{Read, Write};

use crate::error::{Result, RlflError};
use crate::serialize::{read_len, read_u64, write_len, write_u64};

#[derive(Clone)]
struct Entry {
    /// Position in the heap (`pq`) array.
    heap_pos: usize,
    weight: u64,
}

/// A binary max-heap keyed by caller-supplied `usize` indices, supporting
/// `promote`/`demote` in `O(log n)` without a linear scan.
#[derive(Clone)]
pub struct IndexedMaxHeap {
    /// The heap array itself: `pq[p]` is the index stored at heap position `p`.
    pq: Vec<usize>,
    /// index -> (heap position, weight).
    entries: HashMap<usize, Entry>,
    limit: usize,
}

impl IndexedMaxHeap {
    /// Creates an empty heap that can hold up to `limit` entries.
    pub fn with_capacity(limit: usize) -> Self {
        Self {
            pq: Vec::with_capacity(limit),
            entries: HashMap::with_capacity(limit),
            limit,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pq.is_empty()
    }

    pub fn size(&self) -> usize {
        self.pq.len()
    }

    pub fn contains(&self, i: usize) -> bool {
        self.entries.contains_key(&i)
    }

    /// Inserts `i` with weight `k`. `i` must not already be present, and the
    /// heap must not be at capacity.
    pub fn push(&mut self, i: usize, k: u64) -> Result<()> {
        if self.entries.contains_key(&i) {
            return Err(RlflError::InvariantViolation(format!(
                "index {i} already in heap"
            )));
        }
        if self.pq.len() >= self.limit {
            return Err(RlflError::InvariantViolation(
                "heap already at capacity".to_string(),
            ));
        }
        let pos = self.pq.len();
        self.pq.push(i);
        self.entries.insert(i, Entry { heap_pos: pos, weight: k });
        self.swim(pos);
        Ok(())
    }

    /// Returns `(weight, index)` of the maximum-weight entry.
    pub fn get_max(&self) -> Result<(u64, usize)> {
        let root = *self
            .pq
            .first()
            .ok_or_else(|| RlflError::InvariantViolation("heap is empty".to_string()))?;
        Ok((self.entries[&root].weight, root))
    }

    /// Current weight of index `i`.
    pub fn get_weight(&self, i: usize) -> Result<u64> {
        self.entries
            .get(&i)
            .map(|e| e.weight)
            .ok_or_else(|| RlflError::InvariantViolation(format!("index {i} not in heap")))
    }

    /// Increases `i`'s weight to `k` (`k` must be strictly greater than the
    /// current weight) and restores heap order by sifting up.
    pub fn promote(&mut self, i: usize, k: u64) -> Result<()> {
        let pos = {
            let entry = self
                .entries
                .get_mut(&i)
                .ok_or_else(|| RlflError::InvariantViolation(format!("index {i} not in heap")))?;
            if k <= entry.weight {
                return Err(RlflError::InvariantViolation(format!(
                    "promote({i}, {k}) is not greater than current weight {}",
                    entry.weight
                )));
            }
            entry.weight = k;
            entry.heap_pos
        };
        self.swim(pos);
        Ok(())
    }

    /// Decreases `i`'s weight to `k` (`k` must be strictly less than the
    /// current weight) and restores heap order by sifting down.
    pub fn demote(&mut self, i: usize, k: u64) -> Result<()> {
        let pos = {
            let entry = self
                .entries
                .get_mut(&i)
                .ok_or_else(|| RlflError::InvariantViolation(format!("index {i} not in heap")))?;
            if k >= entry.weight {
                return Err(RlflError::InvariantViolation(format!(
                    "demote({i}, {k}) is not less than current weight {}",
                    entry.weight
                )));
            }
            entry.weight = k;
            entry.heap_pos
        };
        self.sink(pos);
        Ok(())
    }

    /// Persists `limit`, the live entry count, and the heap array itself (as
    /// `(index, weight)` pairs in heap order) — reloading in the same order
    /// reconstructs identical heap positions, so tie-breaking among
    /// equal-weight entries survives a round trip.
    pub fn serialize<W: Write>(&self, out: &mut W) -> Result<()> {
        write_len(out, self.limit)?;
        write_len(out, self.pq.len())?;
        for &idx in &self.pq {
            write_len(out, idx)?;
            write_u64(out, self.entries[&idx].weight)?;
        }
        Ok(())
    }

    pub fn load<R: Read>(input: &mut R) -> Result<Self> {
        let limit = read_len(input)?;
        let count = read_len(input)?;
        let mut pq = Vec::with_capacity(count);
        let mut entries = HashMap::with_capacity(count);
        for pos in 0..count {
            let idx = read_len(input)?;
            let weight = read_u64(input)?;
            pq.push(idx);
            entries.insert(idx, Entry { heap_pos: pos, weight });
        }
        Ok(Self { pq, entries, limit })
    }

    fn weight_at(&self, pos: usize) -> u64 {
        self.entries[&self.pq[pos]].weight
    }

    fn less(&self, i: usize, j: usize) -> bool {
        self.weight_at(i) < self.weight_at(j)
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.pq.swap(i, j);
        self.entries.get_mut(&self.pq[i]).unwrap().heap_pos = i;
        self.entries.get_mut(&self.pq[j]).unwrap().heap_pos = j;
    }

    fn swim(&mut self, mut k: usize) {
        while k > 0 && self.less((k - 1) / 2, k) {
            self.swap(k, (k - 1) / 2);
            k = (k - 1) / 2;
        }
    }

    fn sink(&mut self, mut k: usize) {
        let n = self.pq.len();
        while 2 * k + 1 < n {
            let mut j = 2 * k + 1;
            if j + 1 < n && self.less(j, j + 1) {
                j += 1;
            }
            if !self.less(k, j) {
                break;
            }
            self.swap(k, j);
            k = j;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_ordering() {
        let mut heap = IndexedMaxHeap::with_capacity(8);
        heap.push(10, 3).unwrap();
        heap.push(20, 7).unwrap();
        heap.push(30, 1).unwrap();
        assert_eq!(heap.get_max().unwrap(), (7, 20));

        heap.demote(20, 0).unwrap();
        assert_eq!(heap.get_max().unwrap(), (3, 10));

        heap.promote(30, 100).unwrap();
        assert_eq!(heap.get_max().unwrap(), (100, 30));
        assert_eq!(heap.size(), 3);
    }

    #[test]
    fn rejects_duplicate_push() {
        let mut heap = IndexedMaxHeap::with_capacity(4);
        heap.push(1, 1).unwrap();
        assert!(heap.push(1, 2).is_err());
    }

    #[test]
    fn rejects_non_monotone_promote_demote() {
        let mut heap = IndexedMaxHeap::with_capacity(4);
        heap.push(1, 5).unwrap();
        assert!(heap.promote(1, 5).is_err());
        assert!(heap.promote(1, 4).is_err());
        assert!(heap.demote(1, 5).is_err());
        assert!(heap.demote(1, 6).is_err());
    }

    #[test]
    fn serialize_roundtrip() {
        let mut heap = IndexedMaxHeap::with_capacity(8);
        heap.push(1, 5).unwrap();
        heap.push(2, 9).unwrap();
        heap.push(3, 2).unwrap();
        let mut buf = Vec::new();
        heap.serialize(&mut buf).unwrap();
        let mut loaded = IndexedMaxHeap::load(&mut std::io::Cursor::new(buf)).unwrap();
        assert_eq!(loaded.size(), heap.size());
        assert_eq!(loaded.get_max().unwrap(), heap.get_max().unwrap());
        assert_eq!(loaded.get_weight(3).unwrap(), 2);
        loaded.promote(3, 20).unwrap();
        assert_eq!(loaded.get_max().unwrap(), (20, 3));
    }

    #[test]
    fn drain_in_descending_order() {
        let mut heap = IndexedMaxHeap::with_capacity(5);
        let weights = [(0, 4u64), (1, 9), (2, 1), (3, 6), (4, 2)];
        for (i, w) in weights {
            heap.push(i, w).unwrap();
        }
        // The heap has no remove operation, so each entry is retired by
        // demoting it to 0 instead; over `weights.len()` rounds this must
        // visit every original weight in non-increasing order.
        let mut last = u64::MAX;
        for _ in 0..weights.len() {
            let (w, idx) = heap.get_max().unwrap();
            assert!(w <= last);
            last = w;
            heap.demote(idx, 0).unwrap();
        }
    }
}
