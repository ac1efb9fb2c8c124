// Copyright 2026 Oxide Computer Company

//! The end-to-end flow: load, fetch, substitute, package.

use crate::cli::Cli;
use camino::{Utf8Path, Utf8PathBuf};
use marlin_patch::{ConfigDocument, LoadError, SubstituteError, Substituter};
use marlin_patch_vcs::{
    FetchError, FetchTarget, Fetcher, OutputName, PackageError, PackageLayout,
    Packager, check_destination,
};
use thiserror::Error;
use tracing::{debug, info};

/// The directory, relative to the working directory, that upstream is
/// cloned into.
pub const FETCH_DIR: &str = "Marlin";

/// Exit code when the config file is missing.
pub const EXIT_MISSING_CONFIG: u8 = 255;

/// Exit code when cloning fails.
pub const EXIT_FETCH_FAILED: u8 = 254;

/// Exit code for every other failure.
pub const EXIT_FAILURE: u8 = 1;

/// Everything a run needs, resolved from the command line.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// The substitution config, if one was given.
    pub config: Option<Utf8PathBuf>,
    /// The name of the packaged firmware directory.
    pub name: OutputName,
    /// What to clone.
    pub target: FetchTarget,
    /// Whether a rule that matches nothing is an error.
    pub strict: bool,
    /// The directory that holds the clone and the output.
    pub work_dir: Utf8PathBuf,
}

impl RunConfig {
    /// Builds a run config from parsed arguments, working in `work_dir`.
    pub fn from_cli(cli: &Cli, work_dir: impl Into<Utf8PathBuf>) -> Self {
        RunConfig {
            config: cli.config.clone(),
            name: cli.name.clone(),
            target: cli.fetch_target(),
            strict: cli.strict,
            work_dir: work_dir.into(),
        }
    }
}

/// A failed run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    /// No config was given, or the given path does not exist.
    #[error("missing config{}. Aborting.", display_path(.path))]
    MissingConfig {
        /// The path that was given, if any.
        path: Option<Utf8PathBuf>,
    },

    /// The config could not be read or parsed.
    #[error("could not load config")]
    Load(#[from] LoadError),

    /// Cloning failed, or could not be attempted.
    #[error("failed to clone Marlin (see above for details)")]
    Fetch(#[source] FetchError),

    /// Rewriting a file failed.
    #[error("failed to apply substitutions")]
    Substitute(#[from] SubstituteError),

    /// Packaging the rewritten tree failed.
    #[error("failed to package firmware")]
    Package(#[from] PackageError),
}

impl RunError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::MissingConfig { .. } => EXIT_MISSING_CONFIG,
            RunError::Fetch(_) => EXIT_FETCH_FAILED,
            RunError::Load(_)
            | RunError::Substitute(_)
            | RunError::Package(_) => EXIT_FAILURE,
        }
    }
}

fn display_path(path: &Option<Utf8PathBuf>) -> String {
    match path {
        Some(path) => format!(" {path}"),
        None => String::new(),
    }
}

/// Runs the whole flow and returns the packaged firmware directory.
///
/// The config is checked and parsed before anything else happens,
/// including `make_fetcher`, so a missing config always wins. Nothing on
/// disk changes until the fetch succeeds. After that, a failure leaves the
/// working directory as it was at the point of failure.
pub fn run<F: Fetcher>(
    config: &RunConfig,
    make_fetcher: impl FnOnce() -> Result<F, FetchError>,
) -> Result<Utf8PathBuf, RunError> {
    let config_path = existing_config(config.config.as_deref())?;
    let doc = ConfigDocument::load(config_path)?;
    debug!("config: {} file(s) from {config_path}", doc.len());
    for (path, rules) in doc.files() {
        for rule in rules {
            debug!("  {path}: {rule}");
        }
    }

    let fetcher = make_fetcher().map_err(RunError::Fetch)?;
    let fetched = config.work_dir.join(FETCH_DIR);
    info!("Cloning Marlin");
    debug!("Marlin repo: '{}'", config.target.repository());
    debug!("Marlin tag:  '{}'", config.target.revision());
    check_destination(&fetched).map_err(RunError::Fetch)?;
    fetcher.fetch(&config.target, &fetched).map_err(RunError::Fetch)?;

    let report =
        Substituter::new(&fetched).strict(config.strict).apply(&doc)?;
    for file in report.files() {
        debug!(
            "edited {}: {} line(s) changed",
            fetched.join(&file.path),
            file.lines_changed
        );
        for index in file.unmatched_rules() {
            debug!("  rule {index} for {} matched nothing", file.path);
        }
    }

    let packager = Packager::new(&config.work_dir, PackageLayout::marlin());
    let output = packager.package(&fetched, &config.name)?;
    info!("Firmware written to {output}");

    Ok(output)
}

fn existing_config(path: Option<&Utf8Path>) -> Result<&Utf8Path, RunError> {
    match path {
        Some(path) if path.exists() => Ok(path),
        _ => Err(RunError::MissingConfig { path: path.map(ToOwned::to_owned) }),
    }
}
