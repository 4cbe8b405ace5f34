/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The base constructor: builds the FL table plus the two immutable
//! run-head columns `P` (over `L`) and `Q` (over `F`), and bridges between
//! them through [`Constructor::find`].

use std::io::{Read, Write};

use dsi_progress_logger::prelude::*;
use log::info;

use crate::column::StaticColumn;
use crate::error::Result;
use crate::fl_table::{FlTable, TERMINATOR};

const ALPHABET_SIZE: usize = 256;

/// Base construction state shared by both splitters: the FL table and the
/// two run-head masks `P`/`Q`, from which [`Constructor::find`] answers
/// "where does this F-run-head land in L" queries.
#[derive(Clone)]
pub struct Constructor {
    table: FlTable,
    p: StaticColumn,
    q: StaticColumn,
}

impl Constructor {
    /// Reads the head/length streams once to build the FL table, then a
    /// second pass (the streams are re-wound by the caller if needed; here
    /// the same in-memory bytes are walked twice) to place run heads in `P`
    /// in arrival order and rebuild `Q` grouped by ascending character.
    pub fn build<H: Read + std::io::Seek, L: Read + std::io::Seek>(
        heads: &mut H,
        lengths: &mut L,
    ) -> Result<Self> {
        let table = FlTable::build(heads, lengths)?;

        heads.rewind()?;
        lengths.rewind()?;

        let mut head_bytes = Vec::new();
        heads.read_to_end(&mut head_bytes)?;

        let n = table.size() as usize;
        let mut p_positions = Vec::with_capacity(table.runs());
        let mut char_runs: Vec<Vec<u64>> = vec![Vec::new(); ALPHABET_SIZE];

        let mut pos: u64 = 0;
        let mut len_buf = [0u8; 5];
        let mut pl = ProgressLogger::default();
        pl.item_name("run").display_memory(true);
        pl.start("scanning runs to place P run-heads");
        for &raw_c in &head_bytes {
            p_positions.push(pos as usize);
            lengths.read_exact(&mut len_buf)?;
            let length = le5_to_u64(&len_buf);
            let c = if raw_c <= TERMINATOR { TERMINATOR } else { raw_c };
            char_runs[c as usize].push(length);
            pos += length;
            pl.light_update();
        }
        pl.done();

        let mut q_positions = Vec::with_capacity(table.runs());
        pos = 0;
        for runs in &char_runs {
            for &length in runs {
                q_positions.push(pos as usize);
                pos += length;
            }
        }

        let p = StaticColumn::from_set_positions(n, p_positions);
        let q = StaticColumn::from_set_positions(n, q_positions);

        Ok(Self { table, p, q })
    }

    /// Wraps an already-built table and columns (used when a splitter is
    /// constructed directly from a loaded base state).
    pub fn from_parts(table: FlTable, p: StaticColumn, q: StaticColumn) -> Self {
        Self { table, p, q }
    }

    pub fn table(&self) -> &FlTable {
        &self.table
    }

    pub fn p(&self) -> &StaticColumn {
        &self.p
    }

    pub fn q(&self) -> &StaticColumn {
        &self.q
    }

    /// Given an F-position `q`, finds the L-position that FL maps the head
    /// of `q`'s Q-run to, shifted by `q`'s own within-run offset. Always
    /// reasons over the original, immutable `P`/`Q`/FL table, never over a
    /// splitter's augmented `P′`/`Q′` — see module-level note in
    /// `splitter::mod` for why that separation is required.
    pub fn find(&self, pos: usize) -> usize {
        let (k, k_pos) = self.q.predecessor(pos);
        let d = (pos - k_pos) as u64;
        let (k_prime, d_prime) = self.table.fl(k, d);
        self.p.get_idx(k_prime, d_prime as usize)
    }

    /// Logs size and memory-footprint statistics at `info` level.
    pub fn stats(&self) {
        self.table.stats();
        let mut table_bytes = Vec::new();
        let mut p_bytes = Vec::new();
        let mut q_bytes = Vec::new();
        let _ = self.table.serialize(&mut table_bytes);
        let _ = self.p.serialize(&mut p_bytes);
        let _ = self.q.serialize(&mut q_bytes);
        info!("Memory consumption (bytes, serialized form).");
        info!("              FL table: {}", table_bytes.len());
        info!("              P:        {}", p_bytes.len());
        info!("              Q:        {}", q_bytes.len());
    }

    pub fn serialize<W: Write>(&self, out: &mut W) -> Result<()> {
        self.table.serialize(out)?;
        self.p.serialize(out)?;
        self.q.serialize(out)?;
        Ok(())
    }

    pub fn load<R: Read>(input: &mut R) -> Result<Self> {
        let table = FlTable::load(input)?;
        let p = StaticColumn::load(input)?;
        let q = StaticColumn::load(input)?;
        Ok(Self { table, p, q })
    }
}

fn le5_to_u64(buf: &[u8; 5]) -> u64 {
    let mut v: u64 = 0;
    for (i, &b) in buf.iter().enumerate() {
        v |= (b as u64) << (8 * i);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(heads: &[u8], lens: &[u64]) -> (Cursor<Vec<u8>>, Cursor<Vec<u8>>) {
        let mut len_bytes = Vec::new();
        for &l in lens {
            let full = l.to_le_bytes();
            len_bytes.extend_from_slice(&full[..5]);
        }
        (Cursor::new(heads.to_vec()), Cursor::new(len_bytes))
    }

    #[test]
    fn scenario_s2_p_and_q_bits() {
        let (mut heads, mut lengths) = encode(b"ba", &[2, 3]);
        let c = Constructor::build(&mut heads, &mut lengths).unwrap();
        assert_eq!(c.p().size(), 5);
        assert_eq!(c.q().size(), 5);
        assert!(c.p().get(0) && c.p().get(2));
        assert!(c.q().get(0) && c.q().get(3));
    }

    #[test]
    fn find_matches_fl_composition() {
        let (mut heads, mut lengths) = encode(b"ba", &[2, 3]);
        let c = Constructor::build(&mut heads, &mut lengths).unwrap();
        // q=3 is the second Q-run head ('b', F-order index 1).
        let p_pos = c.find(3);
        assert!(p_pos < c.p().size());
        assert!(c.p().get(p_pos));
    }

    #[test]
    fn serialize_roundtrip() {
        let (mut heads, mut lengths) = encode(b"abab", &[1, 1, 1, 1]);
        let c = Constructor::build(&mut heads, &mut lengths).unwrap();
        let mut buf = Vec::new();
        c.serialize(&mut buf).unwrap();
        let loaded = Constructor::load(&mut Cursor::new(buf)).unwrap();
        assert_eq!(loaded.p().bits_set(), c.p().bits_set());
        assert_eq!(loaded.q().bits_set(), c.q().bits_set());
        for i in 0..c.p().size() {
            assert_eq!(loaded.find(i.min(c.q().size() - 1)), c.find(i.min(c.q().size() - 1)));
        }
    }
}
