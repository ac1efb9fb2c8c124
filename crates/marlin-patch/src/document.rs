// Copyright 2026 Oxide Computer Company

//! Substitution config types and YAML loading.

use crate::{ConfigParseError, LoadError};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use std::{collections::BTreeMap, fmt, str::FromStr};

/// A literal text substitution: every occurrence of `before` in a line is
/// replaced with `after`.
///
/// In YAML, a rule is written as a two-element sequence `[before, after]`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "(String, String)")]
pub struct Rule {
    before: String,
    after: String,
}

impl Rule {
    /// Creates a new rule.
    pub fn new(before: impl Into<String>, after: impl Into<String>) -> Self {
        Rule { before: before.into(), after: after.into() }
    }

    /// Returns the text to search for.
    pub fn before(&self) -> &str {
        &self.before
    }

    /// Returns the replacement text.
    pub fn after(&self) -> &str {
        &self.after
    }
}

impl From<(String, String)> for Rule {
    fn from((before, after): (String, String)) -> Self {
        Rule { before, after }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.before, self.after)
    }
}

/// A path to a file to rewrite, relative to the root of the fetched tree.
///
/// # Invariants
///
/// - The path is non-empty.
/// - The path uses forward slashes (backslashes are normalized on
///   construction).
/// - Every path component is a normal file or directory name (no `..`,
///   `.`, root `/`, or Windows prefixes), so the path cannot escape the
///   tree it is joined to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetPath(Utf8PathBuf);

impl TargetPath {
    /// Validates and normalizes a relative file path.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Result<Self, ConfigParseError> {
        let path = path.into();
        let normalized = path.as_str().replace('\\', "/");
        if normalized.is_empty() {
            return Err(ConfigParseError::EmptyPath);
        }
        let path = Utf8PathBuf::from(normalized);

        if let Some(component) = find_non_normal_component(&path) {
            return Err(ConfigParseError::InvalidPathComponent {
                path,
                component,
            });
        }

        Ok(TargetPath(path))
    }

    /// Returns the path relative to the tree root.
    pub fn as_path(&self) -> &Utf8Path {
        &self.0
    }
}

impl AsRef<Utf8Path> for TargetPath {
    fn as_ref(&self) -> &Utf8Path {
        &self.0
    }
}

impl fmt::Display for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A set of substitution rules, keyed by the file they apply to.
///
/// The YAML form maps each file path to an ordered list of rules:
///
/// ```yaml
/// Configuration.h:
///   - ["#define MOTHERBOARD BOARD_RAMPS_14_EFB", "#define MOTHERBOARD BOARD_RAMPS_14_EEB"]
///   - ["#define BAUDRATE 115200", "#define BAUDRATE 250000"]
/// ```
///
/// Files are visited in sorted path order. Rules within a file keep their
/// declared order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    files: BTreeMap<TargetPath, Vec<Rule>>,
}

impl ConfigDocument {
    /// Builds a document from `(path, rules)` pairs, validating each rule.
    ///
    /// Returns an error if any rule has an empty `before` string. If the same
    /// path appears more than once, the last entry wins.
    pub fn from_files(
        files: impl IntoIterator<Item = (TargetPath, Vec<Rule>)>,
    ) -> Result<Self, ConfigParseError> {
        let mut map = BTreeMap::new();
        for (path, rules) in files {
            if let Some(index) = rules.iter().position(|r| r.before.is_empty())
            {
                return Err(ConfigParseError::EmptyBefore {
                    path: path.0,
                    index,
                });
            }
            map.insert(path, rules);
        }
        Ok(ConfigDocument { files: map })
    }

    /// Reads and parses a YAML document from `path`.
    pub fn load(path: &Utf8Path) -> Result<Self, LoadError> {
        let contents = fs::read_to_string(path).map_err(|error| {
            LoadError::Read { path: path.to_owned(), error }
        })?;
        contents
            .parse()
            .map_err(|error| LoadError::Parse { path: path.to_owned(), error })
    }

    /// Iterates over the configured files and their rules, in path order.
    pub fn files(&self) -> impl Iterator<Item = (&TargetPath, &[Rule])> {
        self.files.iter().map(|(path, rules)| (path, rules.as_slice()))
    }

    /// Returns the rules for `path`, if the file is configured.
    pub fn rules_for(&self, path: &TargetPath) -> Option<&[Rule]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// Returns the number of configured files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if no files are configured.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FromStr for ConfigDocument {
    type Err = ConfigParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A file with nothing but comments is a valid, empty config.
        if is_blank_document(s) {
            return Ok(ConfigDocument::default());
        }

        let raw: Option<BTreeMap<String, Vec<Rule>>> = serde_yaml::from_str(s)?;
        let files = raw
            .unwrap_or_default()
            .into_iter()
            .map(|(path, rules)| Ok((TargetPath::new(path)?, rules)))
            .collect::<Result<Vec<_>, ConfigParseError>>()?;
        ConfigDocument::from_files(files)
    }
}

fn is_blank_document(s: &str) -> bool {
    s.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}

/// Returns the first non-normal component in the path, if any.
fn find_non_normal_component(path: &Utf8Path) -> Option<String> {
    path.components().find_map(|component| match component {
        Utf8Component::Normal(_) => None,
        Utf8Component::Prefix(_)
        | Utf8Component::RootDir
        | Utf8Component::CurDir
        | Utf8Component::ParentDir => Some(component.as_str().to_owned()),
    })
}
