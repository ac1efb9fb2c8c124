// Copyright 2026 Oxide Computer Company

//! Fetching source trees with a version control client.

use crate::{FetchError, VcsEnvError};
use camino::Utf8Path;
use std::{fmt, io, process::Command};

/// Returns the client binary named by `var`, or `default` when the
/// variable is unset or blank. Surrounding whitespace is ignored.
fn binary_from_env(
    var: &'static str,
    default: &str,
) -> Result<String, VcsEnvError> {
    let Some(value) = std::env::var_os(var) else {
        return Ok(default.to_owned());
    };
    let value = value
        .into_string()
        .map_err(|value| VcsEnvError::NonUtf8 { var, value })?;
    let value = value.trim();
    Ok(if value.is_empty() { default } else { value }.to_owned())
}

/// A repository location and the revision to check out from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTarget {
    repository: String,
    revision: String,
}

impl FetchTarget {
    /// Creates a fetch target.
    ///
    /// `repository` is anything the VCS client accepts as a clone source (a
    /// URL or a local path). `revision` is a tag or branch name.
    pub fn new(
        repository: impl Into<String>,
        revision: impl Into<String>,
    ) -> Self {
        FetchTarget { repository: repository.into(), revision: revision.into() }
    }

    /// Returns the repository location.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Returns the tag or branch name.
    pub fn revision(&self) -> &str {
        &self.revision
    }
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.repository, self.revision)
    }
}

/// Materializes a [`FetchTarget`] into a local directory.
///
/// [`Vcs`] is the production implementation. Tests substitute their own.
pub trait Fetcher {
    /// Fetches `target` into `dest`, which must not exist yet.
    ///
    /// Blocks until the fetch finishes. On error, `dest` may be missing or
    /// partially populated and must not be trusted.
    fn fetch(&self, target: &FetchTarget, dest: &Utf8Path)
    -> Result<(), FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(
        &self,
        target: &FetchTarget,
        dest: &Utf8Path,
    ) -> Result<(), FetchError> {
        (**self).fetch(target, dest)
    }
}

/// Returns an error unless `dest` is free to fetch into.
///
/// Anything at `dest`, including a dangling symlink, counts as taken.
pub fn check_destination(dest: &Utf8Path) -> Result<(), FetchError> {
    match dest.symlink_metadata() {
        Ok(_) => Err(FetchError::DestinationExists { path: dest.to_owned() }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(FetchError::Io { path: dest.to_owned(), source }),
    }
}

/// The git client, used to clone source trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vcs {
    binary: String,
}

impl Vcs {
    /// Creates a Git VCS using the `$GIT` environment variable or
    /// `"git"`.
    ///
    /// Returns an error if the `$GIT` environment variable is set
    /// but is not valid UTF-8.
    pub fn git() -> Result<Self, VcsEnvError> {
        let binary = binary_from_env("GIT", "git")?;
        Ok(Vcs { binary })
    }

    /// Returns the path to the git binary.
    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl Fetcher for Vcs {
    /// Runs `git clone -b <revision> -- <repository> <dest>`.
    ///
    /// git's stdout and stderr are inherited, so progress and errors go
    /// straight to the terminal.
    fn fetch(
        &self,
        target: &FetchTarget,
        dest: &Utf8Path,
    ) -> Result<(), FetchError> {
        let status = Command::new(&self.binary)
            .args(["clone", "-b", target.revision()])
            // `--` is required so locations beginning with `-` are treated
            // as repositories rather than options.
            .arg("--")
            .arg(target.repository())
            .arg(dest.as_str())
            .status()
            .map_err(|source| FetchError::SpawnFailed {
                binary_path: self.binary.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(FetchError::VcsFailed {
                repository: target.repository().to_owned(),
                revision: target.revision().to_owned(),
                exit_status: status.to_string(),
            })
        }
    }
}
