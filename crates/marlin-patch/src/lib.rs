// Copyright 2026 Oxide Computer Company

//! Substitution configs for Marlin firmware trees.
//!
//! A *substitution config* is a YAML document that maps file paths, relative
//! to the root of a Marlin checkout, to ordered lists of literal
//! `[before, after]` rules. Every line of every listed file is run through
//! that file's rules in order: if a line contains `before`, each occurrence
//! is replaced with `after`, and the next rule sees the result. A rule with
//! an empty `before` is rejected when the config is parsed.
//!
//! The main entry points are [`ConfigDocument`] and [`Substituter`].
//!
//! # Examples
//!
//! ```
//! use marlin_patch::{ConfigDocument, apply_rules};
//!
//! let doc: ConfigDocument = r#"
//! Configuration.h:
//!   - ["BOARD_RAMPS_14_EFB", "BOARD_RAMPS_14_EEB"]
//! "#
//! .parse()
//! .unwrap();
//!
//! let (path, rules) = doc.files().next().unwrap();
//! assert_eq!(path.as_path().as_str(), "Configuration.h");
//!
//! let rewrite =
//!     apply_rules(b"#define MOTHERBOARD BOARD_RAMPS_14_EFB\n", rules);
//! assert_eq!(rewrite.text, b"#define MOTHERBOARD BOARD_RAMPS_14_EEB\n");
//! ```
//!
//! To rewrite files on disk, use [`Substituter`]:
//!
//! ```no_run
//! use camino::Utf8Path;
//! use marlin_patch::{ConfigDocument, Substituter};
//!
//! let doc = ConfigDocument::load(Utf8Path::new("mpcnc.yaml"))
//!     .expect("config loaded");
//! let report = Substituter::new("Marlin")
//!     .apply(&doc)
//!     .expect("files rewritten");
//! println!("{} lines changed", report.lines_changed());
//! ```

#![deny(missing_docs)]

mod document;
mod errors;
mod substitute;

pub use document::{ConfigDocument, Rule, TargetPath};
pub use errors::{
    AtomicWriteError, ConfigParseError, LoadError, SubstituteError,
};
pub use substitute::{
    FileReport, Rewrite, SubstitutionReport, Substituter, apply_rules,
};
