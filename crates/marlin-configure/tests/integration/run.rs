// Copyright 2026 Oxide Computer Company

//! End-to-end runs, with a fake fetcher and with a real git clone.

use anyhow::Result;
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use fs_err as fs;
use marlin_configure::run::{
    EXIT_FAILURE, EXIT_FETCH_FAILED, EXIT_MISSING_CONFIG, RunConfig, RunError,
    run,
};
use marlin_patch_vcs::{FetchError, FetchTarget, Fetcher, Vcs, VcsEnvError};
use std::{cell::RefCell, ffi::OsString, io::Write, process::Command};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

const CONFIGURATION_H: &str = "\
// Marlin 1.1 configuration
#define MOTHERBOARD BOARD_RAMPS_14_EFB
#define BAUDRATE 250000
";

const BOARD_CONFIG: &str = r##"
Marlin/Configuration.h:
  - ["#define MOTHERBOARD BOARD_RAMPS_14_EFB", "#define MOTHERBOARD BOARD_RAMPS_14_EEB"]
"##;

/// Writes content to a file atomically, creating parent directories.
fn write_file(
    path: impl AsRef<Utf8Path>,
    content: impl AsRef<[u8]>,
) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(content.as_ref()))
        .map_err(|e| e.into())
}

/// Writes the parts of a Marlin 1.1 checkout that a run touches.
fn lay_out_marlin(root: &Utf8Path) -> std::io::Result<()> {
    write_file(root.join("Marlin/Marlin.ino"), "// sketch\n")?;
    write_file(root.join("Marlin/Configuration.h"), CONFIGURATION_H)?;
    write_file(
        root.join("Marlin/example_configurations/delta/Configuration.h"),
        "// delta\n",
    )?;
    write_file(root.join("README.md"), "# Marlin\n")
}

/// A fetcher that lays out a Marlin tree instead of cloning, and records
/// what it was asked for.
#[derive(Default)]
struct FakeFetcher {
    calls: RefCell<Vec<(FetchTarget, Utf8PathBuf)>>,
    fail: bool,
}

impl FakeFetcher {
    fn failing() -> Self {
        FakeFetcher { fail: true, ..Default::default() }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(
        &self,
        target: &FetchTarget,
        dest: &Utf8Path,
    ) -> Result<(), FetchError> {
        self.calls.borrow_mut().push((target.clone(), dest.to_owned()));
        if self.fail {
            return Err(FetchError::VcsFailed {
                repository: target.repository().to_owned(),
                revision: target.revision().to_owned(),
                exit_status: "exit status: 128".to_owned(),
            });
        }
        lay_out_marlin(dest).map_err(|source| FetchError::Io {
            path: dest.to_owned(),
            source,
        })
    }
}

/// A working directory holding a config file.
struct Workspace {
    temp: Utf8TempDir,
}

impl Workspace {
    fn new(config: &str) -> Result<Self> {
        let temp = Utf8TempDir::with_prefix("marlin-configure-")?;
        write_file(temp.path().join("mpcnc.yaml"), config)?;
        Ok(Workspace { temp })
    }

    fn path(&self) -> &Utf8Path {
        self.temp.path()
    }

    fn run_config(&self) -> RunConfig {
        RunConfig {
            config: Some(self.path().join("mpcnc.yaml")),
            name: "Marlin_MPCNC".parse().unwrap(),
            target: FetchTarget::new(
                "https://github.com/MarlinFirmware/Marlin",
                "1.1.x",
            ),
            strict: false,
            work_dir: self.path().to_owned(),
        }
    }

    /// Returns the sorted names of the entries in the working directory.
    fn entries(&self) -> Result<Vec<String>> {
        let mut names = fs::read_dir(self.path())?
            .map(|entry| Ok(entry?.file_name().to_string_lossy().into_owned()))
            .collect::<Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_run_end_to_end() -> Result<()> {
    let ws = Workspace::new(BOARD_CONFIG)?;
    let fetcher = FakeFetcher::default();

    let output = run(&ws.run_config(), || Ok(&fetcher))?;

    assert_eq!(output, ws.path().join("Marlin_MPCNC"));
    assert!(output.join("Marlin_MPCNC.ino").is_file());
    assert!(!output.join("Marlin.ino").exists());
    assert!(!output.join("example_configurations").exists());
    let configuration = fs::read_to_string(output.join("Configuration.h"))?;
    assert!(
        configuration.contains("#define MOTHERBOARD BOARD_RAMPS_14_EEB\n"),
        "new board should be set: {configuration:?}"
    );
    assert!(
        !configuration.contains("BOARD_RAMPS_14_EFB"),
        "old board should be gone: {configuration:?}"
    );
    assert_eq!(
        ws.entries()?,
        ["Marlin_MPCNC", "mpcnc.yaml"],
        "the clone should be removed"
    );

    let calls = fetcher.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.revision(), "1.1.x");
    assert_eq!(calls[0].1, ws.path().join("Marlin"));

    Ok(())
}

#[test]
fn test_run_without_config() -> Result<()> {
    let ws = Workspace::new(BOARD_CONFIG)?;
    let fetcher = FakeFetcher::default();
    let config = RunConfig { config: None, ..ws.run_config() };

    let err = run(&config, || Ok(&fetcher)).unwrap_err();

    assert!(matches!(err, RunError::MissingConfig { path: None }));
    assert_eq!(err.exit_code(), EXIT_MISSING_CONFIG);
    assert_eq!(fetcher.call_count(), 0, "nothing should be fetched");

    Ok(())
}

/// Stands in for a fetcher that cannot be built, such as git with a
/// non-UTF-8 `$GIT`.
fn unusable_fetcher() -> Result<FakeFetcher, FetchError> {
    Err(FetchError::Env(VcsEnvError::NonUtf8 {
        var: "GIT",
        value: OsString::from("git"),
    }))
}

#[test]
fn test_run_missing_config_checked_before_fetcher() -> Result<()> {
    let ws = Workspace::new(BOARD_CONFIG)?;
    let config = RunConfig { config: None, ..ws.run_config() };

    let err = run(&config, unusable_fetcher).unwrap_err();

    assert!(matches!(err, RunError::MissingConfig { path: None }), "{err:?}");
    assert_eq!(err.exit_code(), EXIT_MISSING_CONFIG);

    Ok(())
}

#[test]
fn test_run_unusable_fetcher() -> Result<()> {
    let ws = Workspace::new(BOARD_CONFIG)?;

    let err = run(&ws.run_config(), unusable_fetcher).unwrap_err();

    assert!(
        matches!(err, RunError::Fetch(FetchError::Env(_))),
        "got {err:?}"
    );
    assert_eq!(err.exit_code(), EXIT_FETCH_FAILED);
    assert_eq!(ws.entries()?, ["mpcnc.yaml"], "nothing should be created");

    Ok(())
}

#[test]
fn test_run_with_nonexistent_config() -> Result<()> {
    let ws = Workspace::new(BOARD_CONFIG)?;
    let fetcher = FakeFetcher::default();
    let config = RunConfig {
        config: Some(ws.path().join("nope.yaml")),
        ..ws.run_config()
    };

    let err = run(&config, || Ok(&fetcher)).unwrap_err();

    assert!(matches!(err, RunError::MissingConfig { path: Some(_) }));
    assert_eq!(err.exit_code(), EXIT_MISSING_CONFIG);
    assert_eq!(fetcher.call_count(), 0, "nothing should be fetched");
    assert_eq!(ws.entries()?, ["mpcnc.yaml"], "nothing should be created");

    Ok(())
}

#[test]
fn test_run_with_malformed_config() -> Result<()> {
    let ws = Workspace::new("Marlin/Configuration.h: [[\"a\"]]\n")?;
    let fetcher = FakeFetcher::default();

    let err = run(&ws.run_config(), || Ok(&fetcher)).unwrap_err();

    assert!(matches!(err, RunError::Load(_)), "got {err:?}");
    assert_eq!(err.exit_code(), EXIT_FAILURE);
    assert_eq!(fetcher.call_count(), 0, "config is parsed before fetching");

    Ok(())
}

#[test]
fn test_run_fetch_failure() -> Result<()> {
    let ws = Workspace::new(BOARD_CONFIG)?;
    let fetcher = FakeFetcher::failing();

    let err = run(&ws.run_config(), || Ok(&fetcher)).unwrap_err();

    assert!(matches!(err, RunError::Fetch(FetchError::VcsFailed { .. })));
    assert_eq!(err.exit_code(), EXIT_FETCH_FAILED);
    assert_eq!(fetcher.call_count(), 1);
    assert_eq!(ws.entries()?, ["mpcnc.yaml"], "nothing should be packaged");

    Ok(())
}

#[test]
fn test_run_refuses_existing_fetch_dir() -> Result<()> {
    let ws = Workspace::new(BOARD_CONFIG)?;
    fs::create_dir(ws.path().join("Marlin"))?;
    let fetcher = FakeFetcher::default();

    let err = run(&ws.run_config(), || Ok(&fetcher)).unwrap_err();

    assert!(
        matches!(err, RunError::Fetch(FetchError::DestinationExists { .. })),
        "got {err:?}"
    );
    assert_eq!(err.exit_code(), EXIT_FETCH_FAILED);
    assert_eq!(fetcher.call_count(), 0, "fetcher should not be called");

    Ok(())
}

#[test]
fn test_run_strict_unmatched_rule() -> Result<()> {
    let ws = Workspace::new(
        "Marlin/Configuration.h: [[\"BOARD_RUMBA\", \"BOARD_MKS\"]]\n",
    )?;
    let fetcher = FakeFetcher::default();
    let config = RunConfig { strict: true, ..ws.run_config() };

    let err = run(&config, || Ok(&fetcher)).unwrap_err();

    assert!(matches!(err, RunError::Substitute(_)), "got {err:?}");
    assert_eq!(err.exit_code(), EXIT_FAILURE);
    // No rollback: the clone stays behind and nothing is packaged.
    assert_eq!(ws.entries()?, ["Marlin", "mpcnc.yaml"]);

    Ok(())
}

#[test]
fn test_run_permissive_unmatched_rule() -> Result<()> {
    let ws = Workspace::new(
        "Marlin/Configuration.h: [[\"BOARD_RUMBA\", \"BOARD_MKS\"]]\n",
    )?;

    let output = run(&ws.run_config(), || Ok(FakeFetcher::default()))?;

    assert_eq!(
        fs::read_to_string(output.join("Configuration.h"))?,
        CONFIGURATION_H
    );

    Ok(())
}

#[test]
fn test_run_existing_output_dir() -> Result<()> {
    let ws = Workspace::new(BOARD_CONFIG)?;
    fs::create_dir(ws.path().join("Marlin_MPCNC"))?;

    let err =
        run(&ws.run_config(), || Ok(FakeFetcher::default())).unwrap_err();

    assert!(matches!(err, RunError::Package(_)), "got {err:?}");
    assert_eq!(err.exit_code(), EXIT_FAILURE);
    assert_eq!(ws.entries()?, ["Marlin", "Marlin_MPCNC", "mpcnc.yaml"]);

    Ok(())
}

// ---------------------------------------------------------------------------
// Real git
// ---------------------------------------------------------------------------

/// Returns a `Command` for git, respecting the `$GIT` environment variable.
fn git_command() -> Command {
    let bin = std::env::var("GIT").unwrap_or_else(|_| "git".to_string());
    Command::new(bin)
}

/// Runs git in `dir` and asserts that it succeeded.
fn git(dir: &Utf8Path, args: &[&str]) -> Result<()> {
    let status = git_command().args(args).current_dir(dir).status()?;
    assert!(status.success(), "git {} failed", args.join(" "));
    Ok(())
}

#[test]
fn test_run_with_git_clone() -> Result<()> {
    let upstream = Utf8TempDir::with_prefix("marlin-configure-upstream-")?;
    git(upstream.path(), &["init"])?;
    git(upstream.path(), &["config", "user.email", "test@example.com"])?;
    git(upstream.path(), &["config", "user.name", "Test User"])?;
    git(upstream.path(), &["config", "commit.gpgsign", "false"])?;
    lay_out_marlin(upstream.path())?;
    git(upstream.path(), &["add", "."])?;
    git(upstream.path(), &["commit", "-m", "Marlin 1.1"])?;
    git(upstream.path(), &["branch", "1.1.x"])?;

    let ws = Workspace::new(BOARD_CONFIG)?;
    let config = RunConfig {
        target: FetchTarget::new(upstream.path().as_str(), "1.1.x"),
        ..ws.run_config()
    };

    let output = run(&config, || Vcs::git().map_err(FetchError::from))?;

    assert!(output.join("Marlin_MPCNC.ino").is_file());
    assert!(
        fs::read_to_string(output.join("Configuration.h"))?
            .contains("BOARD_RAMPS_14_EEB")
    );
    assert_eq!(ws.entries()?, ["Marlin_MPCNC", "mpcnc.yaml"]);

    Ok(())
}
