// Copyright 2026 Oxide Computer Company

//! Diagnostic output.
//!
//! The log level is chosen once from the command line and baked into a
//! subscriber. Callers install it for the duration of a run with
//! [`tracing::subscriber::with_default`] instead of setting a process-wide
//! default.

use std::{
    error::Error,
    io::{self, IsTerminal},
};
use tracing::{Subscriber, error, level_filters::LevelFilter};
use tracing_subscriber::fmt::MakeWriter;

/// Builds the subscriber for a run.
///
/// Events at `level` or more severe are written to stderr as
/// `LEVEL message`, without timestamps or module paths. Errors are always
/// shown, whatever `level` is. Colors are only used when stderr is a
/// terminal.
pub fn subscriber(level: LevelFilter) -> impl Subscriber + Send + Sync {
    build(level, io::stderr, io::stderr().is_terminal())
}

fn build<W>(
    level: LevelFilter,
    writer: W,
    ansi: bool,
) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let level = level.max(LevelFilter::ERROR);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(writer)
        .with_ansi(ansi)
        .without_time()
        .with_target(false)
        .finish()
}

/// Logs `err` and each error in its source chain.
pub fn report_error(err: &(dyn Error + 'static)) {
    error!("{err}");
    let mut source = err.source();
    while let Some(cause) = source {
        error!("  caused by: {cause}");
        source = cause.source();
    }
}
