/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! An auxiliary split-point index over a run-length-encoded Burrows–Wheeler
//! Transform, accelerating the inverse LF-mapping (FL) by bounding how many
//! runs a single FL step can touch.
//!
//! The pipeline is: build an [`fl_table::FlTable`] and a [`constructor::Constructor`]
//! from a pair of head/length streams, then hand the constructor to either
//! [`splitter::deterministic::DeterministicSplitter`] or
//! [`splitter::randomized::RandomizedSplitter`] to produce the augmented
//! column.

#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unconditional_recursion)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod column;
pub mod constructor;
pub mod dynbv;
pub mod error;
pub mod fl_table;
pub mod heap;
pub mod serialize;
pub mod splitter;

pub mod prelude {
    pub use crate::column::StaticColumn;
    pub use crate::constructor::Constructor;
    pub use crate::dynbv::DynamicBitVec;
    pub use crate::error::{Result, RlflError};
    pub use crate::fl_table::{FlRow, FlTable, TERMINATOR};
    pub use crate::heap::IndexedMaxHeap;
    pub use crate::splitter::deterministic::DeterministicSplitter;
    pub use crate::splitter::randomized::{RandomizedSplitter, DEFAULT_SEED};
}
