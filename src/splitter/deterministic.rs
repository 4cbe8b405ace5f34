/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Deterministic split-point selection (Nishimoto–Tabei, ICALP'21 style).
//!
//! Repeatedly splits the heaviest Q-run until every Q′-run has fewer than
//! `2d` P-bits under it, using a dynamic bitvector for `P′`/`Q′` and an
//! indexed max-heap to find the heaviest run in `O(log r)`.

use std::io::{Read, Write};

use dsi_progress_logger::prelude::*;
use log::info;

use crate::column::StaticColumn;
use crate::constructor::Constructor;
use crate::dynbv::DynamicBitVec;
use crate::error::{Result, RlflError};
use crate::heap::IndexedMaxHeap;

/// Holds the base constructor plus the initial `P′`/`Q′`/heap snapshot, so
/// `build(d)` can be invoked repeatedly with different `d` from the same
/// starting state without re-scanning the BWT.
pub struct DeterministicSplitter {
    constructor: Constructor,
    init_p_prime: DynamicBitVec,
    init_q_prime: DynamicBitVec,
    init_weights: IndexedMaxHeap,
}

impl DeterministicSplitter {
    /// Builds the initial snapshot once from the constructor's `P`/`Q`.
    pub fn new(constructor: Constructor) -> Self {
        let (init_p_prime, init_q_prime, init_weights) = Self::initialize(&constructor);
        Self {
            constructor,
            init_p_prime,
            init_q_prime,
            init_weights,
        }
    }

    fn initialize(constructor: &Constructor) -> (DynamicBitVec, DynamicBitVec, IndexedMaxHeap) {
        let p = constructor.p();
        let q = constructor.q();
        let n = p.size();
        let r = p.bits_set();
        let limit = ((r as f64) * 1.5).ceil() as usize + 1;

        let mut p_prime = DynamicBitVec::new();
        let mut q_prime = DynamicBitVec::new();
        let mut weights = IndexedMaxHeap::with_capacity(limit);

        if n == 0 {
            // Reachable only via a `Constructor` assembled by hand (normal
            // construction rejects an empty head stream before it gets
            // here). Nothing to seed: P′/Q′ stay empty and the heap stays
            // empty, so `build(d)` below has nothing to split.
            return (p_prime, q_prime, weights);
        }

        p_prime.push_back(p.get(0));
        q_prime.push_back(q.get(0));

        let mut total_weight: u64 = 0;
        let mut run_weight: u64 = 1;
        let mut last_run_head: usize = 0;

        let mut pl = ProgressLogger::default();
        pl.display_memory(true).item_name("position");
        pl.start("seeding the split-weight heap from P/Q");
        for i in 1..n {
            p_prime.push_back(p.get(i));
            q_prime.push_back(q.get(i));

            if q.get(i) {
                weights
                    .push(last_run_head, run_weight)
                    .expect("heap sized for at least r runs");
                total_weight += run_weight;
                run_weight = 0;
                last_run_head = i;
            }
            if p.get(i) {
                run_weight += 1;
            }
            pl.light_update();
        }
        pl.done();
        weights
            .push(last_run_head, run_weight)
            .expect("heap sized for at least r runs");
        total_weight += run_weight;
        debug_assert_eq!(total_weight, r as u64);

        (p_prime, q_prime, weights)
    }

    /// Splits the heaviest Q-runs until every Q′-run has weight strictly
    /// less than `2d`, and returns `P′` as a finished static column. `d`
    /// must be at least 2.
    pub fn build(&self, d: u64) -> Result<StaticColumn> {
        if d < 2 {
            return Err(RlflError::InvariantViolation(format!(
                "deterministic splitter requires d >= 2, got {d}"
            )));
        }

        if self.init_p_prime.is_empty() {
            return Ok(StaticColumn::from_set_positions(0, []));
        }

        let mut p_prime = self.init_p_prime.clone();
        let mut q_prime = self.init_q_prime.clone();
        let mut weights = self.init_weights.clone();

        let mut count: u64 = 0;
        let (mut max_weight, mut max_index) = weights.get_max()?;

        while max_weight >= 2 * d {
            count += 1;

            // Index of the first P′-run at or after this Q-run's head.
            let first_p_run = p_prime.rank1(max_index);
            // Absolute position of the P′-run d runs beyond that one.
            let q_split = p_prime.select1(first_p_run + d as usize + 1);

            let q_already_set = q_prime.get(q_split);
            if !q_already_set {
                q_prime.set(q_split, true)?;
            }

            // find() always reasons over the original, immutable P/Q/FL.
            let p_split = self.constructor.find(q_split);
            let p_newly_set = p_prime.set(p_split, true)?;

            if !q_already_set {
                weights.demote(max_index, d)?;
                weights.push(q_split, max_weight - d)?;
            }

            if p_newly_set {
                let q_owner_run = q_prime.rank1(p_split + 1) - 1;
                let q_owner_pos = q_prime.select1(q_owner_run + 1);
                let w = weights.get_weight(q_owner_pos)?;
                weights.promote(q_owner_pos, w + 1)?;
            }

            let (w, idx) = weights.get_max()?;
            max_weight = w;
            max_index = idx;
        }

        info!("Added rows: {count}");
        info!(
            "Runs after splitting: {}",
            self.constructor.table().runs() as u64 + count
        );
        info!("Max scan after: {max_weight}");

        let positions: Vec<usize> = (1..=p_prime.count_ones()).map(|k| p_prime.select1(k)).collect();
        Ok(StaticColumn::from_set_positions(p_prime.len(), positions))
    }

    pub fn constructor(&self) -> &Constructor {
        &self.constructor
    }

    /// Logs the pre-split state alongside the base constructor's own stats.
    pub fn stats(&self) {
        self.constructor.stats();
        info!("Runs before splitting: {}", self.constructor.table().runs());
        match self.init_weights.get_max() {
            Ok((max_weight, _)) => info!("Max scan before: {max_weight}"),
            Err(_) => info!("Max scan before: n/a (empty input)"),
        }
    }

    /// Persists the base constructor plus the initial `P′`/`Q′`/heap
    /// snapshot, so `build(d)` can be re-run with a different `d` without
    /// re-reading the BWT.
    pub fn serialize<W: Write>(&self, out: &mut W) -> Result<()> {
        self.constructor.serialize(out)?;
        self.init_p_prime.serialize(out)?;
        self.init_q_prime.serialize(out)?;
        self.init_weights.serialize(out)?;
        Ok(())
    }

    pub fn load<R: Read>(input: &mut R) -> Result<Self> {
        let constructor = Constructor::load(input)?;
        let init_p_prime = DynamicBitVec::load(input)?;
        let init_q_prime = DynamicBitVec::load(input)?;
        let init_weights = IndexedMaxHeap::load(input)?;
        Ok(Self {
            constructor,
            init_p_prime,
            init_q_prime,
            init_weights,
        })
    }
}
