// Copyright 2026 Oxide Computer Company

//! Packaging a fetched tree into a named firmware directory.

use crate::{OutputNameError, PackageError};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::{fmt, io, str::FromStr};
use walkdir::WalkDir;

/// The name of a packaged firmware directory, e.g. `Marlin_MPCNC`.
///
/// # Invariants
///
/// The name is a single plain path component: non-empty, with no path
/// separators, and not `.` or `..`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputName(String);

impl OutputName {
    /// Returns the name as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OutputName {
    type Err = OutputNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(OutputNameError::Empty);
        }
        if s.contains(['/', '\\']) {
            return Err(OutputNameError::NotPlainName(s.to_owned()));
        }
        let mut components = Utf8Path::new(s).components();
        match (components.next(), components.next()) {
            (Some(Utf8Component::Normal(_)), None) => {
                Ok(OutputName(s.to_owned()))
            }
            _ => Err(OutputNameError::NotPlainName(s.to_owned())),
        }
    }
}

impl fmt::Display for OutputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Utf8Path> for OutputName {
    fn as_ref(&self) -> &Utf8Path {
        Utf8Path::new(&self.0)
    }
}

/// The fixed names used to carve a firmware directory out of a fetched
/// tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageLayout {
    firmware_dir: Utf8PathBuf,
    entry_point: String,
    examples_dir: Utf8PathBuf,
}

impl PackageLayout {
    /// Creates a layout.
    ///
    /// - `firmware_dir` is the directory to extract, relative to the fetched
    ///   tree.
    /// - `entry_point` is the file inside `firmware_dir` that gets renamed
    ///   after the output name, keeping its extension.
    /// - `examples_dir` is removed from the output, relative to
    ///   `firmware_dir`.
    pub fn new(
        firmware_dir: impl Into<Utf8PathBuf>,
        entry_point: impl Into<String>,
        examples_dir: impl Into<Utf8PathBuf>,
    ) -> Self {
        PackageLayout {
            firmware_dir: firmware_dir.into(),
            entry_point: entry_point.into(),
            examples_dir: examples_dir.into(),
        }
    }

    /// The layout of a Marlin 1.1 checkout: the sketch lives in `Marlin/`,
    /// its entry point is `Marlin.ino`, and sample configs live in
    /// `Marlin/example_configurations/`.
    pub fn marlin() -> Self {
        Self::new("Marlin", "Marlin.ino", "example_configurations")
    }

    /// Returns the directory to extract, relative to the fetched tree.
    pub fn firmware_dir(&self) -> &Utf8Path {
        &self.firmware_dir
    }

    /// Returns the entry point file name.
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Returns the examples directory, relative to the firmware directory.
    pub fn examples_dir(&self) -> &Utf8Path {
        &self.examples_dir
    }

    /// Returns the entry point's file name once renamed after `name`.
    pub fn renamed_entry_point(&self, name: &OutputName) -> String {
        match Utf8Path::new(&self.entry_point).extension() {
            Some(ext) => format!("{name}.{ext}"),
            None => name.to_string(),
        }
    }
}

impl Default for PackageLayout {
    fn default() -> Self {
        Self::marlin()
    }
}

/// Turns a fetched tree into a standalone, named firmware directory.
#[derive(Clone, Debug)]
pub struct Packager {
    output_root: Utf8PathBuf,
    layout: PackageLayout,
}

impl Packager {
    /// Creates a packager that writes output directories into
    /// `output_root`.
    ///
    /// `output_root` is relative to the current working directory. (It is
    /// also allowed to be absolute.)
    pub fn new(
        output_root: impl Into<Utf8PathBuf>,
        layout: PackageLayout,
    ) -> Self {
        Packager { output_root: output_root.into(), layout }
    }

    /// Returns the layout in use.
    pub fn layout(&self) -> &PackageLayout {
        &self.layout
    }

    /// Returns the directory that [`package`](Self::package) would create
    /// for `name`.
    pub fn output_dir(&self, name: &OutputName) -> Utf8PathBuf {
        self.output_root.join(name)
    }

    /// Packages `fetched` as `name`.
    ///
    /// In order:
    ///
    /// 1. Copies the layout's firmware directory to `<output_root>/<name>`,
    ///    failing if that already exists.
    /// 2. Renames the entry point to `<name>.<ext>`.
    /// 3. Removes the examples directory from the copy.
    /// 4. Removes `fetched`.
    ///
    /// Nothing is undone if a step fails.
    ///
    /// Returns the path to the output directory.
    pub fn package(
        &self,
        fetched: &Utf8Path,
        name: &OutputName,
    ) -> Result<Utf8PathBuf, PackageError> {
        let source = fetched.join(&self.layout.firmware_dir);
        let output = self.output_dir(name);

        match output.symlink_metadata() {
            Ok(_) => {
                return Err(PackageError::DestinationExists { path: output });
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(error) => {
                return Err(PackageError::Io { path: output, error });
            }
        }

        copy_tree(&source, &output).map_err(|error| PackageError::Copy {
            from: source.clone(),
            to: output.clone(),
            error,
        })?;

        let entry_from = output.join(&self.layout.entry_point);
        let entry_to = output.join(self.layout.renamed_entry_point(name));
        fs::rename(&entry_from, &entry_to).map_err(|error| {
            PackageError::Rename { from: entry_from, to: entry_to, error }
        })?;

        let examples = output.join(&self.layout.examples_dir);
        fs::remove_dir_all(&examples).map_err(|error| {
            PackageError::RemoveExamples { path: examples, error }
        })?;

        fs::remove_dir_all(fetched).map_err(|error| {
            PackageError::RemoveFetched { path: fetched.to_owned(), error }
        })?;

        Ok(output)
    }
}

/// Recursively copies the directory `from` to `to`, which must not exist.
///
/// Symlinks are followed, so the copy holds the files they point to.
fn copy_tree(from: &Utf8Path, to: &Utf8Path) -> io::Result<()> {
    for entry in WalkDir::new(from).follow_links(true) {
        let entry = entry?;
        let relative =
            entry.path().strip_prefix(from).map_err(io::Error::other)?;
        let target = to.as_std_path().join(relative);
        if entry.file_type().is_dir() {
            if entry.depth() == 0 {
                fs::create_dir(&target)?;
            } else {
                fs::create_dir_all(&target)?;
            }
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
