/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The immutable rank/select bitvector backing the P and Q run-head masks.
//!
//! Built once from the run heads/lengths and never mutated afterwards; the
//! splitters copy its bits into a [`crate::dynbv::DynamicBitVec`] rather than
//! mutating it in place, which is why this type only needs `rank`/`select`
//! and not `set`.

use std::io::{Read, Write};

use sux::bits::BitVec;
use sux::rank_sel::SelectAdaptConst;
use sux::traits::{Rank, Select};

use crate::error::Result;
use crate::serialize::{read_positions, write_positions};

/// `rank`/`select` support parameters: 12 words per inventory entry and a
/// quantum of 4, the same balance `webgraph`'s `BvGraph` inverted-index
/// columns strike between query speed and the size of the select structure
/// for sparse, run-head-style bitvectors.
type RankSelectBits = SelectAdaptConst<BitVec, Vec<usize>, 12, 4>;

/// An immutable run-head bitvector over `L` or `F` with O(1) rank and O(1)
/// (amortized) select.
#[derive(Clone)]
pub struct StaticColumn {
    rs: RankSelectBits,
    len: usize,
}

impl StaticColumn {
    /// Builds a column of the given length with the given positions set.
    /// `set_positions` must be in non-decreasing order (run heads are
    /// discovered in scan order by the constructor).
    pub fn from_set_positions(len: usize, set_positions: impl IntoIterator<Item = usize>) -> Self {
        let mut bits = BitVec::new(len);
        for p in set_positions {
            bits.set(p, true);
        }
        Self {
            rs: RankSelectBits::new(bits),
            len,
        }
    }

    /// Total bitvector length (== `n`, the BWT length).
    pub fn size(&self) -> usize {
        self.len
    }

    /// Number of set bits (== `r`, the run count).
    pub fn bits_set(&self) -> usize {
        self.rank1(self.len)
    }

    /// Bit value at position `i`.
    pub fn get(&self, i: usize) -> bool {
        self.rank1(i + 1) - self.rank1(i) == 1
    }

    /// Number of set bits in `[0, i)`.
    fn rank1(&self, i: usize) -> usize {
        self.rs.rank(i)
    }

    /// Position of the `k`-th set bit, 1-indexed (`select1(1)` is the first
    /// set bit). `sux`'s underlying `Select` trait is 0-indexed, so this
    /// shifts by one to match the 1-indexed run convention used throughout
    /// this module (`get_idx(k, d) = select1(k + 1) + d`).
    fn select1(&self, k: usize) -> usize {
        self.rs.select(k - 1)
    }

    /// Absolute position of the `d`-th character inside the `k`-th
    /// (0-indexed) run.
    pub fn get_idx(&self, k: usize, d: usize) -> usize {
        self.select1(k + 1) + d
    }

    /// The index and absolute position of the last set bit at or before `i`.
    /// Requires at least one set bit in `[0, i]`.
    pub fn predecessor(&self, i: usize) -> (usize, usize) {
        let rank = self.rank1(i + 1);
        debug_assert!(rank > 0, "no set bit at or before position {i}");
        let rank_pred = rank - 1;
        (rank_pred, self.select1(rank_pred + 1))
    }

    /// Iterates over the absolute positions of every set bit, in order.
    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        (1..=self.bits_set()).map(move |k| self.select1(k))
    }

    /// Persists the column as its length and the sorted list of set
    /// positions; rank/select support is rebuilt from scratch on [`Self::load`].
    pub fn serialize<W: Write>(&self, out: &mut W) -> Result<()> {
        let positions: Vec<usize> = self.iter_set().collect();
        write_positions(out, self.len, &positions)
    }

    pub fn load<R: Read>(input: &mut R) -> Result<Self> {
        let (len, positions) = read_positions(input)?;
        Ok(Self::from_set_positions(len, positions))
    }
}
