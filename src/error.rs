/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Error taxonomy for the FL-index builder.
//!
//! I/O failures on the input streams, invariant violations in the core data
//! structures (programmer bugs, never expected to be caught and handled),
//! empty input, and degenerate-but-valid small-run shapes (a single-run BWT)
//! which are not errors at all and are handled as ordinary code paths
//! wherever they arise.

use thiserror::Error;

/// Errors produced by the FL-index construction and splitting pipeline.
#[derive(Debug, Error)]
pub enum RlflError {
    /// Propagated from the underlying head/length streams.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A length record was shorter than the fixed 5-byte encoding, or a head
    /// byte had no matching length record.
    #[error("truncated run record in `{stream}` after {runs_read} run(s)")]
    TruncatedRecord {
        /// Which stream was being read (`"heads"` or `"lengths"`).
        stream: &'static str,
        /// How many complete runs had already been read.
        runs_read: usize,
    },

    /// A core data-structure contract was violated: duplicate heap push, a
    /// missing index, a non-monotone promote/demote, or an out-of-range
    /// offset/interval. Signals a bug in the caller or in this crate, not a
    /// malformed input.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The head stream contained no runs at all. A BWT of a non-empty text
    /// always has at least one run (the terminator's own), so a head/length
    /// stream pair with zero runs describes no text rather than a very
    /// short one; callers should reject it up front instead of threading a
    /// zero-row FL table through the rest of the pipeline.
    #[error("empty input: head stream contains no runs")]
    EmptyInput,
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, RlflError>;
