//! `prepare-publish` / `post-publish`
//!
//! Keys before the `"[!start-pkg]"` marker are workspace-only (scripts,
//! devDependencies, ...). They are stripped for the published tarball and the
//! full manifest is restored afterwards from `package.tmp.json`.

use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use zile_manifest::manifest::parse_package_json;
use zile_manifest::{render_package_json, strip_through_marker, PACKAGE_JSON};

use crate::commands::build::{run_build, BuildArgs};
use crate::commands::load_config;
use crate::common::CwdArg;
use crate::errors::CliError;
use crate::GlobalOpts;

/// Marker key separating workspace-only fields from published fields
pub const START_MARKER: &str = "[!start-pkg]";

/// Backup written by `prepare-publish`
pub const BACKUP_FILE: &str = "package.tmp.json";

#[derive(Args, Debug, Clone, Default)]
pub struct PublishArgs {
    #[command(flatten)]
    pub cwd: CwdArg,
}

fn backup_path(cwd: &Path) -> PathBuf {
    cwd.join(BACKUP_FILE)
}

/// Back up package.json and strip everything up to the marker
pub fn strip_for_publish(cwd: &Path) -> Result<(), CliError> {
    let path = cwd.join(PACKAGE_JSON);
    fs::copy(&path, backup_path(cwd))?;

    let content = fs::read_to_string(&path)?;
    let package_json = parse_package_json(&content, &path)?;
    let stripped = strip_through_marker(&package_json, START_MARKER);
    fs::write(&path, render_package_json(&stripped, None)?)?;
    Ok(())
}

/// Put the backed-up package.json back, if there is one
pub fn restore_after_publish(cwd: &Path) -> Result<bool, CliError> {
    let backup = backup_path(cwd);
    if !backup.is_file() {
        return Ok(false);
    }
    fs::rename(&backup, cwd.join(PACKAGE_JSON))?;
    Ok(true)
}

pub fn handle_prepare_publish(args: PublishArgs, _opts: &GlobalOpts) -> Result<(), CliError> {
    let cwd = args.cwd.resolve()?;
    let config = load_config()?;

    zile_logger::progress(&format!("Preparing package at {}", cwd.display()));
    let build_args = BuildArgs {
        cwd: args.cwd,
        ..Default::default()
    };
    run_build(&cwd, &build_args, false, &config)?;
    strip_for_publish(&cwd)?;

    zile_logger::success(&format!("Package at {} prepared successfully", cwd.display()));
    Ok(())
}

pub fn handle_post_publish(args: PublishArgs, _opts: &GlobalOpts) -> Result<(), CliError> {
    let cwd = args.cwd.resolve()?;
    if restore_after_publish(&cwd)? {
        zile_logger::info(&format!("Restored {}", cwd.join(PACKAGE_JSON).display()));
    } else {
        zile_logger::debug(&format!("No {} to restore", BACKUP_FILE));
    }
    Ok(())
}
