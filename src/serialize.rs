/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Shared little-endian read/write primitives for the stable on-disk format.
//!
//! Every structure in this crate that persists itself (the FL table, the
//! static columns, the indexed heap, the splitter snapshots) is built out of
//! these two primitives plus a length prefix, rather than reaching for a
//! generic serialization crate — the on-disk format is small and fixed
//! enough that hand-written little-endian words are the more direct choice,
//! read and written in the same fixed order they were declared in.

use std::io::{Read, Write};

use crate::error::Result;

pub fn write_u64<W: Write>(out: &mut W, v: u64) -> Result<()> {
    out.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub fn read_u64<R: Read>(input: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    input.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub fn write_u8<W: Write>(out: &mut W, v: u8) -> Result<()> {
    out.write_all(&[v])?;
    Ok(())
}

pub fn read_u8<R: Read>(input: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    input.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Writes a `usize` as a 64-bit little-endian word (the on-disk format is
/// always 64-bit regardless of the host's native width).
pub fn write_len<W: Write>(out: &mut W, v: usize) -> Result<()> {
    write_u64(out, v as u64)
}

pub fn read_len<R: Read>(input: &mut R) -> Result<usize> {
    Ok(read_u64(input)? as usize)
}

/// Writes `v` as the fixed 5-byte little-endian word the `.bwt.len` and
/// `.lcs` file formats both use.
pub fn write_le5<W: Write>(out: &mut W, v: u64) -> Result<()> {
    out.write_all(&v.to_le_bytes()[..5])?;
    Ok(())
}

pub fn read_le5<R: Read>(input: &mut R) -> Result<u64> {
    let mut buf = [0u8; 5];
    input.read_exact(&mut buf)?;
    let mut full = [0u8; 8];
    full[..5].copy_from_slice(&buf);
    Ok(u64::from_le_bytes(full))
}

/// Writes a list of absolute bit positions: a length prefix followed by each
/// position as a 64-bit word. This is how [`crate::column::StaticColumn`] and
/// [`crate::dynbv::DynamicBitVec`] persist their bit patterns — as the sorted
/// list of set positions rather than raw words, since it round-trips through
/// any rank/select backing without assuming a particular word layout.
pub fn write_positions<W: Write>(out: &mut W, total_len: usize, positions: &[usize]) -> Result<()> {
    write_len(out, total_len)?;
    write_len(out, positions.len())?;
    for &p in positions {
        write_u64(out, p as u64)?;
    }
    Ok(())
}

/// Reads back what [`write_positions`] wrote: `(total_len, positions)`.
pub fn read_positions<R: Read>(input: &mut R) -> Result<(usize, Vec<usize>)> {
    let total_len = read_len(input)?;
    let count = read_len(input)?;
    let mut positions = Vec::with_capacity(count);
    for _ in 0..count {
        positions.push(read_u64(input)? as usize);
    }
    Ok((total_len, positions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn le5_roundtrip() {
        let mut buf = Vec::new();
        write_le5(&mut buf, 1_099_511_627_775).unwrap();
        assert_eq!(buf.len(), 5);
        let got = read_le5(&mut Cursor::new(buf)).unwrap();
        assert_eq!(got, 1_099_511_627_775);
    }

    #[test]
    fn positions_roundtrip() {
        let mut buf = Vec::new();
        write_positions(&mut buf, 100, &[0, 3, 7, 99]).unwrap();
        let mut cursor = Cursor::new(buf);
        let (len, positions) = read_positions(&mut cursor).unwrap();
        assert_eq!(len, 100);
        assert_eq!(positions, vec![0, 3, 7, 99]);
    }
}
