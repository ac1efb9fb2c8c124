// Copyright 2026 Oxide Computer Company

//! Fetching and packaging for Marlin firmware trees.
//!
//! A firmware build starts from a clone of the upstream Marlin repository at
//! a given tag or branch. This crate provides the [`Fetcher`] abstraction
//! for producing that clone (with [`Vcs`] as the git-backed implementation),
//! and the [`Packager`] that turns a fetched and rewritten tree into a
//! standalone, renamed sketch directory.
//!
//! # Usage
//!
//! ```no_run
//! use camino::Utf8Path;
//! use marlin_patch_vcs::{
//!     FetchTarget, Fetcher, OutputName, PackageLayout, Packager, Vcs,
//!     check_destination,
//! };
//!
//! let fetched = Utf8Path::new("Marlin");
//! check_destination(fetched).expect("nothing in the way");
//!
//! let target =
//!     FetchTarget::new("https://github.com/MarlinFirmware/Marlin", "1.1.x");
//! Vcs::git()
//!     .expect("$GIT is valid")
//!     .fetch(&target, fetched)
//!     .expect("cloned successfully");
//!
//! let name: OutputName = "Marlin_MPCNC".parse().expect("valid name");
//! let output = Packager::new(".", PackageLayout::marlin())
//!     .package(fetched, &name)
//!     .expect("packaged successfully");
//! assert_eq!(output.as_str(), "./Marlin_MPCNC");
//! ```

#![deny(missing_docs)]

mod errors;
mod package;
mod vcs;

pub use errors::{
    FetchError, OutputNameError, PackageError, VcsEnvError,
};
pub use package::{OutputName, PackageLayout, Packager};
pub use vcs::{FetchTarget, Fetcher, Vcs, check_destination};
