//! Common types and utilities shared across commands

use clap::{Args, Parser};
use std::path::PathBuf;
use zile_manifest::paths;

use crate::errors::CliError;

/// Global CLI options available to all commands
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    #[arg(short, long, global = true, help = "Decrease verbosity")]
    pub quiet: bool,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase verbosity (-v for debug, -vv for trace)")]
    pub verbose: u8,
}

impl GlobalOpts {
    /// Get the effective verbosity level
    /// - 0: quiet/warn only
    /// - 1: debug (-v)
    /// - 2: trace (-vv)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

/// `--cwd`, shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct CwdArg {
    /// Working directory of the package
    #[arg(long, value_name = "DIRECTORY")]
    pub cwd: Option<PathBuf>,
}

impl CwdArg {
    /// Absolute package directory
    pub fn resolve(&self) -> Result<PathBuf, CliError> {
        let current = std::env::current_dir()?;
        let cwd = match &self.cwd {
            Some(dir) => paths::normalize(&current.join(dir)),
            None => current,
        };
        if !cwd.is_dir() {
            return Err(CliError::Usage(format!(
                "{} is not a directory",
                cwd.display()
            )));
        }
        Ok(cwd)
    }
}
