use clap::Args;
use colored::Colorize;
use std::path::Path;
use zile_build::{check_output, BuildError};
use zile_config::Config;

use crate::commands::load_config;
use crate::common::CwdArg;
use crate::errors::CliError;
use crate::GlobalOpts;

#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    #[command(flatten)]
    pub cwd: CwdArg,
}

/// Run attw and publint and print what they report
pub fn run_checks(cwd: &Path, config: &Config) -> Result<(), CliError> {
    zile_logger::progress(&format!("Checking package at {}", cwd.display()));
    zile_logger::spinner_start("Running attw and publint");
    let result = check_output(cwd, config);
    zile_logger::spinner_stop();

    let report = match result {
        Ok(report) => report,
        Err(BuildError::Checker { tool, code, output }) => {
            zile_logger::capture_output(&tool, code, &output);
            zile_logger::spinner_error(&format!("{} found problems", tool));
            return Err(BuildError::Checker { tool, code, output }.into());
        }
        Err(e) => return Err(e.into()),
    };

    for (tool, output) in &report.outputs {
        zile_logger::capture_output(tool, Some(0), output);
        if !output.trim().is_empty() {
            println!("{}\n{}", tool.bold(), output.trim_end());
        }
    }
    zile_logger::success("Checks passed");
    Ok(())
}

pub fn handle_check(args: CheckArgs, _opts: &GlobalOpts) -> Result<(), CliError> {
    let cwd = args.cwd.resolve()?;
    let config = load_config()?;
    run_checks(&cwd, &config)
}
