// Copyright 2026 Oxide Computer Company

//! marlin-configure entrypoint.

use clap::Parser;
use marlin_configure::{
    cli::Cli,
    logging,
    run::{RunConfig, run},
};
use marlin_patch_vcs::{FetchError, Vcs};
use std::process::ExitCode;
use tracing::debug;

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing::subscriber::with_default(logging::subscriber(cli.log_level()), || {
        debug!("options: {cli:?}");
        let config = RunConfig::from_cli(&cli, ".");

        match run(&config, || Vcs::git().map_err(FetchError::from)) {
            Ok(_) => ExitCode::SUCCESS,
            Err(err) => {
                logging::report_error(&err);
                ExitCode::from(err.exit_code())
            }
        }
    })
}
