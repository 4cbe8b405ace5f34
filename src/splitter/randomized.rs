/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Randomized split-point selection: a fractional-cascading-style
//! construction that copies each P-run head into Q (and the matching F-run
//! head back into P) independently with probability `1/ratio`, cascading
//! until no new insertions occur.

use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::column::StaticColumn;
use crate::constructor::Constructor;
use crate::dynbv::DynamicBitVec;
use crate::error::{Result, RlflError};

/// Kept as the default seed so that `build(ratio)` is bit-for-bit
/// reproducible unless a caller opts into a different seed.
pub const DEFAULT_SEED: u64 = 23;

pub struct RandomizedSplitter {
    constructor: Constructor,
}

impl RandomizedSplitter {
    pub fn new(constructor: Constructor) -> Self {
        Self { constructor }
    }

    pub fn constructor(&self) -> &Constructor {
        &self.constructor
    }

    /// Builds `P′` by copying a `1/ratio` random subset of `P`'s run heads
    /// into `Q′` (and the corresponding run head back into `P′`), then
    /// repeating the draw over newly-inserted positions until the cascade
    /// runs dry. `ratio` must be at least 1.
    pub fn build(&self, ratio: u32, seed: u64) -> Result<StaticColumn> {
        if ratio == 0 {
            return Err(RlflError::InvariantViolation(
                "randomized splitter requires ratio >= 1".to_string(),
            ));
        }
        let p = self.constructor.p();
        let q = self.constructor.q();
        let n = p.size();
        let draw_probability = 1.0 / ratio as f64;

        let mut p_prime = DynamicBitVec::from_bits((0..n).map(|i| p.get(i)));
        let mut q_prime = DynamicBitVec::from_bits((0..n).map(|i| q.get(i)));
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut count: u64 = 0;
        let mut inserted_positions: Vec<usize> = Vec::new();

        for i in 0..n {
            if p.get(i) && rng.gen_bool(draw_probability) {
                insert(
                    &self.constructor,
                    i,
                    &mut p_prime,
                    &mut q_prime,
                    &mut inserted_positions,
                    &mut count,
                )?;
            }
        }

        while !inserted_positions.is_empty() {
            let last_inserted = std::mem::take(&mut inserted_positions);
            for q_pos in last_inserted {
                if rng.gen_bool(draw_probability) {
                    insert(
                        &self.constructor,
                        q_pos,
                        &mut p_prime,
                        &mut q_prime,
                        &mut inserted_positions,
                        &mut count,
                    )?;
                }
            }
        }

        info!("Added rows: {count}");
        info!(
            "Runs after splitting: {}",
            self.constructor.table().runs() as u64 + count
        );

        let positions: Vec<usize> = (1..=p_prime.count_ones()).map(|k| p_prime.select1(k)).collect();
        Ok(StaticColumn::from_set_positions(n, positions))
    }
}

/// Finds the L-position matching Q-position `q_pos` via the base
/// constructor's `find`, records it, and — if `q_pos` is not already set in
/// `Q′` — sets both `Q′[q_pos]` and `P′[p_pos]`. The insertion into
/// `inserted_positions` happens unconditionally (it feeds the next cascade
/// round) even when the bit was already set: the insert is idempotent only
/// with respect to `P′`/`Q′` themselves, which must stay unchanged on a
/// repeat insert, not with respect to the cascade bookkeeping.
fn insert(
    constructor: &Constructor,
    q_pos: usize,
    p_prime: &mut DynamicBitVec,
    q_prime: &mut DynamicBitVec,
    inserted_positions: &mut Vec<usize>,
    count: &mut u64,
) -> Result<()> {
    let p_pos = constructor.find(q_pos);
    inserted_positions.push(p_pos);

    if !q_prime.get(q_pos) {
        q_prime.set(q_pos, true)?;
        p_prime.set(p_pos, true)?;
    }
    *count += 1;
    Ok(())
}
