/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::Parser;

use rlfl_index::cli::{Cli, init_env_logger, main as run};

fn main() -> Result<()> {
    init_env_logger()?;
    let cli = Cli::parse();
    run(cli.args, cli.command)
}
