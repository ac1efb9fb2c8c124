// Copyright 2026 Oxide Computer Company

//! Command-line interface.

use camino::Utf8PathBuf;
use clap::Parser;
use marlin_patch_vcs::{FetchTarget, OutputName};
use tracing::level_filters::LevelFilter;

/// Default name for the packaged firmware directory.
pub const DEFAULT_NAME: &str = "Marlin_MPCNC";

/// Default upstream repository.
pub const DEFAULT_GIT_SERVER: &str = "https://github.com/MarlinFirmware/Marlin";

/// Default tag or branch to check out.
pub const DEFAULT_GIT_TAG: &str = "1.1.x";

/// Generate a customized Marlin firmware tree.
#[derive(Parser, Debug)]
#[command(name = "marlin-configure")]
#[command(version, about)]
#[command(long_about = concat!(
    "Generate a customized Marlin firmware tree.\n\n",
    "Clones Marlin at a given tag or branch, applies the literal text ",
    "substitutions listed in a YAML config, and packages the sketch ",
    "directory under a new name, without the example configurations.\n\n",
    "The config maps file paths, relative to the root of the clone, to ",
    "lists of [before, after] pairs:\n\n",
    "  Marlin/Configuration.h:\n",
    "    - [\"#define MOTHERBOARD BOARD_RAMPS_14_EFB\",\n",
    "       \"#define MOTHERBOARD BOARD_RAMPS_14_EEB\"]\n\n",
    "Every `before` string must be non-empty; a config with an empty one ",
    "is rejected before anything is cloned.",
))]
#[command(after_help = concat!(
    "EXIT STATUS:\n",
    "  0    success\n",
    "  1    invalid config, or a substitution or packaging step failed\n",
    "  254  cloning Marlin failed\n",
    "  255  the config file is missing\n",
))]
pub struct Cli {
    /// Config file that describes the changes needed to configure Marlin.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Name that describes this firmware.
    #[arg(short, long, default_value = DEFAULT_NAME)]
    pub name: OutputName,

    /// Show more of the steps being taken.
    #[arg(short, long)]
    pub verbose: bool,

    /// Location to get Marlin from, in standard git clone syntax.
    #[arg(
        short,
        long,
        value_name = "URL",
        default_value = DEFAULT_GIT_SERVER
    )]
    pub git_server: String,

    /// Tag or branch name to use for the checkout.
    #[arg(
        short = 't',
        long,
        value_name = "REF",
        default_value = DEFAULT_GIT_TAG
    )]
    pub git_tag: String,

    /// Fail if any substitution rule matches nothing in its file.
    #[arg(long)]
    pub strict: bool,
}

impl Cli {
    /// Returns the most verbose log level to emit.
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO }
    }

    /// Returns the repository and revision to fetch.
    pub fn fetch_target(&self) -> FetchTarget {
        FetchTarget::new(&self.git_server, &self.git_tag)
    }
}
