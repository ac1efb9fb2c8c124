// Copyright 2026 Oxide Computer Company

//! Generate customized Marlin firmware trees.
//!
//! `marlin-configure` clones Marlin at a tag or branch, rewrites the files
//! listed in a substitution config (see [`marlin_patch`]), and packages the
//! sketch directory under a new name (see [`marlin_patch_vcs`]).
//!
//! The binary is a thin wrapper around [`run::run`]; the pieces are exposed
//! here so the flow can be driven with a fake [`Fetcher`] in tests.
//!
//! [`Fetcher`]: marlin_patch_vcs::Fetcher

#![deny(missing_docs)]

pub mod cli;
pub mod logging;
pub mod run;
