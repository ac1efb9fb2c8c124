// Copyright 2026 Oxide Computer Company

//! Error types for loading substitution configs and rewriting files.

use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;

/// An error that occurs while parsing a
/// [`ConfigDocument`](crate::ConfigDocument) from YAML.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseError {
    /// The document is not valid YAML, or does not have the shape
    /// `path: [[before, after], ...]`.
    #[error("invalid substitution config")]
    Yaml(#[from] serde_yaml::Error),

    /// A file path key was empty.
    #[error("substitution config has an empty file path")]
    EmptyPath,

    /// A file path key contains a non-normal component (e.g., `..`, `.`,
    /// `/`, or a Windows prefix). Only plain file and directory names are
    /// allowed.
    #[error(
        "file path {path:?} contains non-normal component {component:?} \
         (only plain file/directory names are allowed)"
    )]
    InvalidPathComponent {
        /// The full path that failed validation.
        path: Utf8PathBuf,
        /// The non-normal component that was found (e.g., `..`, `.`, `/`).
        component: String,
    },

    /// A rule has an empty `before` string, which would match between every
    /// character of every line.
    #[error("rule {index} for {path} has an empty `before` string")]
    EmptyBefore {
        /// The file the rule belongs to.
        path: Utf8PathBuf,
        /// The zero-based position of the rule in the file's rule list.
        index: usize,
    },
}

/// An error that occurs while loading a
/// [`ConfigDocument`](crate::ConfigDocument) from disk.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// Failed to read the config file.
    #[error("failed to read substitution config {path}")]
    Read {
        /// The path to the config file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// The config file could not be parsed.
    #[error("failed to parse substitution config {path}")]
    Parse {
        /// The path to the config file.
        path: Utf8PathBuf,
        /// Details about the parsing error.
        #[source]
        error: ConfigParseError,
    },
}

/// An error that occurs while applying substitutions to a source tree.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubstituteError {
    /// Failed to read a target file.
    #[error("failed to read {path}")]
    Read {
        /// The path to the target file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// Failed to write a rewritten file back into place.
    #[error("failed to write rewritten file {path}")]
    Write {
        /// The path where the write failed.
        path: Utf8PathBuf,
        /// The underlying write error.
        #[source]
        error: AtomicWriteError,
    },

    /// In strict mode, a rule did not match any line of its file.
    #[error("rule {index} for {path} matched nothing: {before:?}")]
    UnmatchedRule {
        /// The file the rule belongs to.
        path: Utf8PathBuf,
        /// The zero-based position of the rule in the file's rule list.
        index: usize,
        /// The `before` string that was not found.
        before: String,
    },
}

/// An error that occurred during an atomic file write.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AtomicWriteError {
    /// Writing contents to the temporary file failed.
    #[error("writing file contents failed")]
    Write(#[source] io::Error),

    /// The atomic write infrastructure failed (e.g., creating the
    /// temporary file, or renaming it into place).
    #[error("atomic create or rename failed")]
    Rename(#[source] io::Error),
}
