// Copyright 2026 Oxide Computer Company

//! Line-by-line literal substitution over a source tree.

use crate::{
    ConfigDocument, Rule, SubstituteError, TargetPath, errors::AtomicWriteError,
};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use bstr::ByteSlice;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::{
    borrow::Cow,
    fs::Permissions,
    io::{self, Write},
};

/// The result of running a rule list over a single piece of text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rewrite {
    /// The rewritten text.
    pub text: Vec<u8>,
    /// The number of lines whose content changed.
    pub lines_changed: usize,
    /// For each rule, in order, the number of lines it matched.
    pub rule_matches: Vec<usize>,
}

/// Applies `rules` to every line of `text`.
///
/// Each line is processed independently. Rules run in order, and each rule
/// sees the output of the rules before it. A rule whose `before` occurs in
/// the line replaces every occurrence on that line.
///
/// `text` is treated as bytes, so files in legacy encodings such as
/// Latin-1 are rewritten without complaint. Lines keep their terminators,
/// so `\r\n` endings and a missing final newline survive unchanged.
pub fn apply_rules(text: &[u8], rules: &[Rule]) -> Rewrite {
    let mut out = Vec::with_capacity(text.len());
    let mut lines_changed = 0;
    let mut rule_matches = vec![0; rules.len()];

    for line in text.lines_with_terminator() {
        let mut current = Cow::Borrowed(line);
        for (rule, matches) in rules.iter().zip(rule_matches.iter_mut()) {
            if current.contains_str(rule.before()) {
                current =
                    Cow::Owned(current.replace(rule.before(), rule.after()));
                *matches += 1;
            }
        }
        if *current != *line {
            lines_changed += 1;
        }
        out.extend_from_slice(&current);
    }

    Rewrite { text: out, lines_changed, rule_matches }
}

/// What happened to one file during a substitution pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileReport {
    /// The file, relative to the tree root.
    pub path: TargetPath,
    /// The number of lines whose content changed.
    pub lines_changed: usize,
    /// For each rule, in order, the number of lines it matched.
    pub rule_matches: Vec<usize>,
}

impl FileReport {
    /// Returns the indexes of rules that matched no lines.
    pub fn unmatched_rules(&self) -> impl Iterator<Item = usize> + '_ {
        self.rule_matches
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count == 0)
            .map(|(index, _)| index)
    }
}

/// The per-file results of a substitution pass, in the order the files were
/// rewritten.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubstitutionReport {
    files: Vec<FileReport>,
}

impl SubstitutionReport {
    /// Returns the report for each rewritten file.
    pub fn files(&self) -> &[FileReport] {
        &self.files
    }

    /// Returns the total number of changed lines across all files.
    pub fn lines_changed(&self) -> usize {
        self.files.iter().map(|f| f.lines_changed).sum()
    }
}

/// Rewrites the files named by a [`ConfigDocument`] inside a source tree.
///
/// Every configured file is read whole, transformed in memory and written
/// back through a temporary file that is renamed into place with the
/// original file's permissions. The rename needs a writable directory, not
/// a writable file. Files are processed one at a time; if a later file
/// fails, earlier files stay rewritten.
#[derive(Clone, Debug)]
pub struct Substituter {
    root: Utf8PathBuf,
    strict: bool,
}

impl Substituter {
    /// Creates a substituter for the tree at `root`.
    ///
    /// `root` is relative to the current working directory. (It is also
    /// allowed to be absolute.)
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Substituter { root: root.into(), strict: false }
    }

    /// Sets strict mode.
    ///
    /// In strict mode, a file in which some rule matched no lines is left
    /// untouched and [`apply`](Self::apply) returns
    /// [`SubstituteError::UnmatchedRule`].
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Returns the tree root.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Applies every file's rules in `doc`.
    pub fn apply(
        &self,
        doc: &ConfigDocument,
    ) -> Result<SubstitutionReport, SubstituteError> {
        let mut report = SubstitutionReport::default();
        for (path, rules) in doc.files() {
            report.files.push(self.apply_file(path, rules)?);
        }
        Ok(report)
    }

    fn apply_file(
        &self,
        path: &TargetPath,
        rules: &[Rule],
    ) -> Result<FileReport, SubstituteError> {
        let full_path = self.root.join(path);

        let read_error = |error: io::Error| SubstituteError::Read {
            path: full_path.clone(),
            error,
        };
        let contents = fs::read(&full_path).map_err(read_error)?;
        let permissions =
            fs::metadata(&full_path).map_err(read_error)?.permissions();

        let rewrite = apply_rules(&contents, rules);
        let report = FileReport {
            path: path.clone(),
            lines_changed: rewrite.lines_changed,
            rule_matches: rewrite.rule_matches,
        };

        if self.strict {
            if let Some(index) = report.unmatched_rules().next() {
                return Err(SubstituteError::UnmatchedRule {
                    path: full_path,
                    index,
                    before: rules[index].before().to_owned(),
                });
            }
        }

        // The file is always written back, even when nothing changed.
        write_atomic(&full_path, &rewrite.text, permissions)?;

        Ok(report)
    }
}

fn write_atomic(
    path: &Utf8Path,
    contents: &[u8],
    permissions: Permissions,
) -> Result<(), SubstituteError> {
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| {
            f.write_all(contents)?;
            f.set_permissions(permissions)
        })
        .map_err(|error| {
            let error = match error {
                atomicwrites::Error::Internal(e) => AtomicWriteError::Rename(e),
                atomicwrites::Error::User(e) => AtomicWriteError::Write(e),
            };
            SubstituteError::Write { path: path.to_owned(), error }
        })
}
