/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Drives the `build`/`run` subcommands end to end against real files in a
//! temporary directory, covering the stem-to-path suffixing the unit tests
//! can't reach (they never go through `cli::main`).

#![cfg(feature = "cli")]

use std::fs;

use rlfl_index::cli::{BuildArgs, GlobalArgs, RunArgs, SubCommands};
use rlfl_index::prelude::*;

fn encode_len(v: u64) -> [u8; 5] {
    let full = v.to_le_bytes();
    [full[0], full[1], full[2], full[3], full[4]]
}

fn write_inputs(dir: &std::path::Path, stem: &str, heads: &[u8], lens: &[u64]) -> std::path::PathBuf {
    let stem_path = dir.join(stem);
    fs::write(format!("{}.bwt.heads", stem_path.display()), heads).unwrap();
    let mut len_bytes = Vec::new();
    for &l in lens {
        len_bytes.extend_from_slice(&encode_len(l));
    }
    fs::write(format!("{}.bwt.len", stem_path.display()), len_bytes).unwrap();
    stem_path
}

#[test]
fn build_then_run_round_trips_through_real_files() {
    let dir = tempfile::tempdir().unwrap();
    // The stem itself carries a dot, which is exactly what `with_extension`
    // would mangle: it would turn `sample.2.bwt.heads` into `sample.bwt.heads`.
    let stem = write_inputs(dir.path(), "sample.2", b"ba", &[2, 3]);

    rlfl_index::cli::main(
        GlobalArgs { log_interval: None },
        SubCommands::Build(BuildArgs {
            stem: stem.clone(),
            ratio: 2,
            seed: DEFAULT_SEED,
            no_randomized: false,
        }),
    )
    .unwrap();

    let lcs_path = format!("{}.lcs", stem.display());
    let d_construct_path = format!("{}.d_construct", stem.display());
    let r_col_path = format!("{}.r_col", stem.display());
    assert!(std::path::Path::new(&lcs_path).exists(), "missing {lcs_path}");
    assert!(std::path::Path::new(&d_construct_path).exists(), "missing {d_construct_path}");
    assert!(std::path::Path::new(&r_col_path).exists(), "missing {r_col_path}");

    let r_col_bytes = fs::read(&r_col_path).unwrap();
    let r_col = StaticColumn::load(&mut std::io::Cursor::new(r_col_bytes)).unwrap();
    assert_eq!(r_col.size(), 5);

    rlfl_index::cli::main(
        GlobalArgs { log_interval: None },
        SubCommands::Run(RunArgs { stem: stem.clone(), d: 2 }),
    )
    .unwrap();

    let d_col_path = format!("{}.d_col", stem.display());
    let d_col_bytes = fs::read(&d_col_path).unwrap();
    let d_col = StaticColumn::load(&mut std::io::Cursor::new(d_col_bytes)).unwrap();
    assert_eq!(d_col.size(), 5);
    assert!(d_col.bits_set() >= 2);
}

#[test]
fn stem_with_dot_does_not_collide_with_a_different_stem() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), "sample", b"a", &[4]);
    let dotted_stem = write_inputs(dir.path(), "sample.2", b"ba", &[2, 3]);

    rlfl_index::cli::main(
        GlobalArgs { log_interval: None },
        SubCommands::Build(BuildArgs {
            stem: dotted_stem.clone(),
            ratio: 2,
            seed: DEFAULT_SEED,
            no_randomized: true,
        }),
    )
    .unwrap();

    // If path-building had replaced the stem's own ".2" extension, this
    // would have read/written `sample.bwt.heads`/`sample.d_construct`
    // instead, silently operating on the wrong input.
    let d_construct_path = format!("{}.d_construct", dotted_stem.display());
    assert!(std::path::Path::new(&d_construct_path).exists());
    let plain_d_construct = dir.path().join("sample.d_construct");
    assert!(!plain_d_construct.exists(), "build wrote into the wrong stem's output file");
}
