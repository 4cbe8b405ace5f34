/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! `build`/`run` subcommands: `build` reads a head/length stream pair and
//! writes the base constructor, LCS, and split-point column files; `run`
//! loads a previously built deterministic snapshot and re-splits it at a
//! chosen `d`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use dsi_progress_logger::prelude::*;
use log::info;

use crate::prelude::*;
use crate::serialize::write_le5;

const HEADS_EXT: &str = "bwt.heads";
const LEN_EXT: &str = "bwt.len";
const D_CONSTRUCT_EXT: &str = "d_construct";
const D_COL_EXT: &str = "d_col";
const R_COL_EXT: &str = "r_col";
const LCS_EXT: &str = "lcs";

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// How often to log progress. Default is 10s. Suffixes: "s", "m", "h",
    /// "d"; no suffix is assumed to be milliseconds.
    #[arg(long, global = true, value_parser = parse_duration)]
    pub log_interval: Option<Duration>,
}

#[derive(Subcommand, Debug)]
pub enum SubCommands {
    Build(BuildArgs),
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Basename shared by `<stem>.bwt.heads` and `<stem>.bwt.len`.
    pub stem: PathBuf,

    /// Copy-propagation ratio for the randomized column (1/ratio draw
    /// probability).
    #[arg(long, default_value_t = 2)]
    pub ratio: u32,

    /// PRNG seed for the randomized column.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Skip building the randomized column.
    #[arg(long)]
    pub no_randomized: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Basename whose `<stem>.d_construct` was produced by `build`.
    pub stem: PathBuf,

    /// Maximum number of runs any single FL step may touch.
    #[arg(short = 'd', long, value_parser = parse_d)]
    pub d: u64,
}

#[derive(Parser, Debug)]
#[command(name = "rlfl-index", about = "Auxiliary split-point index over a run-length-encoded BWT.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: SubCommands,
    #[clap(flatten)]
    pub args: GlobalArgs,
}

fn parse_d(value: &str) -> std::result::Result<u64, String> {
    let d: u64 = value.parse().map_err(|_| format!("`{value}` is not a valid integer"))?;
    if d < 2 {
        return Err("d must be >= 2".to_string());
    }
    Ok(d)
}

fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    if value.is_empty() {
        bail!("empty duration string");
    }
    let mut duration = Duration::from_secs(0);
    let mut acc = String::new();
    for c in value.chars() {
        if c.is_ascii_digit() {
            acc.push(c);
        } else if c.is_whitespace() {
            continue;
        } else {
            let dur: u64 = acc.parse()?;
            match c {
                's' => duration += Duration::from_secs(dur),
                'm' => duration += Duration::from_secs(dur * 60),
                'h' => duration += Duration::from_secs(dur * 60 * 60),
                'd' => duration += Duration::from_secs(dur * 60 * 60 * 24),
                other => bail!("invalid duration suffix: {other}"),
            }
            acc.clear();
        }
    }
    if !acc.is_empty() {
        duration += Duration::from_millis(acc.parse()?);
    }
    Ok(duration)
}

pub fn init_env_logger() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    Ok(())
}

fn with_log_interval(mut pl: ProgressLogger, global_args: &GlobalArgs) -> ProgressLogger {
    if let Some(duration) = global_args.log_interval {
        pl.log_interval(duration);
    }
    pl
}

pub fn main(global_args: GlobalArgs, command: SubCommands) -> Result<()> {
    match command {
        SubCommands::Build(args) => build(global_args, args),
        SubCommands::Run(args) => run(global_args, args),
    }
}

/// Appends `.ext` to `stem` by string concatenation rather than
/// `PathBuf::with_extension`, which replaces anything after the last `.` in
/// the stem instead of suffixing it — the wrong behavior for a stem that
/// itself contains a dot.
fn suffixed(stem: &std::path::Path, ext: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", stem.display(), ext))
}

fn build(global_args: GlobalArgs, args: BuildArgs) -> Result<()> {
    let heads_path = suffixed(&args.stem, HEADS_EXT);
    let lengths_path = suffixed(&args.stem, LEN_EXT);

    let mut heads = File::open(&heads_path)
        .with_context(|| format!("could not open heads stream at {}", heads_path.display()))?;
    let mut lengths = File::open(&lengths_path)
        .with_context(|| format!("could not open length stream at {}", lengths_path.display()))?;

    let mut pl = ProgressLogger::default();
    pl.display_memory(true).item_name("run");
    pl = with_log_interval(pl, &global_args);
    pl.start("building FL table and base P/Q columns");
    let constructor = Constructor::build(&mut heads, &mut lengths)
        .with_context(|| format!("could not build constructor for stem {}", args.stem.display()))?;
    pl.done();

    let randomized_constructor = constructor.clone();
    let deterministic = DeterministicSplitter::new(constructor);
    deterministic.stats();

    let lcs_path = suffixed(&args.stem, LCS_EXT);
    let mut lcs_out = BufWriter::new(
        File::create(&lcs_path).with_context(|| format!("could not create {}", lcs_path.display()))?,
    );
    for v in deterministic.constructor().table().get_run_lcs() {
        write_le5(&mut lcs_out, v)
            .with_context(|| format!("could not write {}", lcs_path.display()))?;
    }
    info!("Wrote per-run LCS values to {}", lcs_path.display());

    let d_construct_path = suffixed(&args.stem, D_CONSTRUCT_EXT);
    let mut out = BufWriter::new(
        File::create(&d_construct_path)
            .with_context(|| format!("could not create {}", d_construct_path.display()))?,
    );
    deterministic
        .serialize(&mut out)
        .with_context(|| format!("could not serialize deterministic state to {}", d_construct_path.display()))?;
    info!("Wrote deterministic construction state to {}", d_construct_path.display());

    if !args.no_randomized {
        let randomized = RandomizedSplitter::new(randomized_constructor);
        let r_col = randomized
            .build(args.ratio, args.seed)
            .with_context(|| "could not build randomized column")?;
        let r_col_path = suffixed(&args.stem, R_COL_EXT);
        let mut r_out = BufWriter::new(
            File::create(&r_col_path)
                .with_context(|| format!("could not create {}", r_col_path.display()))?,
        );
        r_col
            .serialize(&mut r_out)
            .with_context(|| format!("could not write {}", r_col_path.display()))?;
        info!("Wrote randomized column to {}", r_col_path.display());
    }

    Ok(())
}

fn run(global_args: GlobalArgs, args: RunArgs) -> Result<()> {
    let d_construct_path = suffixed(&args.stem, D_CONSTRUCT_EXT);
    let mut input = BufReader::new(
        File::open(&d_construct_path)
            .with_context(|| format!("could not open {}", d_construct_path.display()))?,
    );
    let deterministic = DeterministicSplitter::load(&mut input)
        .with_context(|| format!("could not load deterministic state from {}", d_construct_path.display()))?;

    let mut pl = ProgressLogger::default();
    pl.item_name("split").display_memory(true);
    pl = with_log_interval(pl, &global_args);
    pl.start("splitting runs");
    let d_col = deterministic
        .build(args.d)
        .with_context(|| format!("build(d={}) failed", args.d))?;
    pl.done();

    let d_col_path = suffixed(&args.stem, D_COL_EXT);
    let mut out = BufWriter::new(
        File::create(&d_col_path).with_context(|| format!("could not create {}", d_col_path.display()))?,
    );
    d_col
        .serialize(&mut out)
        .with_context(|| format!("could not write {}", d_col_path.display()))?;
    info!("Wrote augmented column to {}", d_col_path.display());

    Ok(())
}
