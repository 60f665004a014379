/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::{Context, Result};
use clap::Parser;
use dropchess::{Cli, Engine};
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli).and_then(|_| run(&cli)) {
        eprintln!("{} encountered an error: {e:#}", env!("CARGO_PKG_NAME"));
        std::process::exit(1);
    }
}

/// Sends log output to stderr, so that it never interleaves with the board on stdout.
fn init_logging(cli: &Cli) -> Result<()> {
    let mut config = ConfigBuilder::new();
    if cli.debug {
        config.set_time_level(LevelFilter::Error);
        config.set_thread_level(LevelFilter::Error);
        config.set_target_level(LevelFilter::Error);
        config.set_location_level(LevelFilter::Error);
    } else {
        config.set_time_level(LevelFilter::Off);
        config.set_thread_level(LevelFilter::Off);
        config.set_target_level(LevelFilter::Off);
        config.set_location_level(LevelFilter::Off);
    }

    TermLogger::init(
        cli.log_level(),
        config.build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logging")
}

fn run(cli: &Cli) -> Result<()> {
    log::debug!("Parsed arguments: {cli:?}");

    let mut engine = Engine::from_cli(cli)?;
    engine.run()
}
