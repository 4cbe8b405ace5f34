/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Split-point selection strategies over a [`crate::constructor::Constructor`]'s
//! base `P`/`Q` columns.
//!
//! Both strategies share one rule, worth stating once instead of per-module:
//! [`crate::constructor::Constructor::find`] is always evaluated against the
//! *original*, immutable `P`/`Q`/FL table, never against a splitter's
//! augmented `P′`/`Q′`. Feeding an augmented bit back into `find` would
//! create a self-referential loop — the FL permutation the splitters rely on
//! is only well-defined over the original runs.

pub mod deterministic;
pub mod randomized;
