// Copyright 2026 Oxide Computer Company

//! Error types for fetching and packaging Marlin trees.

use camino::Utf8PathBuf;
use std::{ffi::OsString, io};
use thiserror::Error;

// ---- VCS errors ----

/// The git client to clone with could not be chosen from the environment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VcsEnvError {
    /// `$GIT` (or another override variable) is set to a non-UTF-8 value.
    #[error(
        "cannot clone: ${var} names a git binary that is not \
         UTF-8 ({value:?})"
    )]
    NonUtf8 {
        /// The variable that was read.
        var: &'static str,
        /// Its raw value.
        value: OsString,
    },
}

/// An error that occurs while fetching a source tree.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The fetch destination already exists.
    #[error(
        "{path} already exists (remove it, or run from another directory)"
    )]
    DestinationExists {
        /// The destination that was found.
        path: Utf8PathBuf,
    },

    /// An I/O error occurred while probing the fetch destination.
    #[error("I/O error while checking {path}")]
    Io {
        /// The path being checked when the error occurred.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to spawn the VCS process.
    #[error("failed to run git at {binary_path:?}")]
    SpawnFailed {
        /// The path to the VCS executable.
        binary_path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The clone command ran but did not succeed. Its output went straight
    /// to the terminal.
    #[error(
        "git failed to clone {revision} from {repository} ({exit_status})"
    )]
    VcsFailed {
        /// The repository location.
        repository: String,
        /// The requested tag or branch.
        revision: String,
        /// A human-readable description of the exit status (e.g.,
        /// "exit status: 128" or "signal: 9").
        exit_status: String,
    },

    /// The git binary to clone with could not be chosen.
    #[error(transparent)]
    Env(#[from] VcsEnvError),
}

// ---- Packaging errors ----

/// An error that occurs while validating an [`OutputName`](crate::OutputName).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum OutputNameError {
    /// The name was empty or contained only whitespace.
    #[error("output name is empty")]
    Empty,

    /// The name is not a single plain file name (e.g., it contains a path
    /// separator, or is `.` or `..`).
    #[error(
        "output name {0:?} must be a plain directory name \
         (no path separators, `.` or `..`)"
    )]
    NotPlainName(String),
}

/// Errors that can occur while packaging a fetched tree.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PackageError {
    /// The output directory already exists.
    #[error("output directory {path} already exists")]
    DestinationExists {
        /// The output directory.
        path: Utf8PathBuf,
    },

    /// An I/O error occurred while probing the output directory.
    #[error("I/O error while checking {path}")]
    Io {
        /// The path being checked when the error occurred.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// Copying the firmware directory failed.
    #[error("failed to copy {from} to {to}")]
    Copy {
        /// The directory being copied.
        from: Utf8PathBuf,
        /// The destination directory.
        to: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// Renaming the sketch entry point failed.
    #[error("failed to rename {from} to {to}")]
    Rename {
        /// The original entry point.
        from: Utf8PathBuf,
        /// The new entry point.
        to: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// Removing the examples directory from the output failed.
    #[error("failed to remove examples directory {path}")]
    RemoveExamples {
        /// The examples directory.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// Removing the fetched tree failed.
    #[error("failed to remove fetched tree {path}")]
    RemoveFetched {
        /// The fetched tree.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },
}
