//! Post-build checks with external linters
//!
//! `attw` verifies the published types resolve, `publint` lints the package
//! layout. Both run at the same time and both must exit 0.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use tracing::info;
use zile_config::{resolve_tool, Config, Tool};

use crate::errors::BuildError;
use crate::process::{run_captured, CapturedOutput};

const ATTW_ARGS: &[&str] = &["--pack", ".", "--format", "table-flipped", "--profile", "esm-only"];
const PUBLINT_ARGS: &[&str] = &["--strict"];

/// One checker invocation
#[derive(Debug, Clone)]
pub struct CheckCommand {
    pub tool: String,
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CheckCommand {
    fn command(&self, cwd: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).current_dir(cwd).env("NO_COLOR", "1");
        command
    }
}

/// Output of each checker, in the order they were given
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub outputs: Vec<(String, String)>,
}

impl CheckReport {
    pub fn output(&self, tool: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(name, _)| name == tool)
            .map(|(_, output)| output.as_str())
    }
}

/// The `attw` and `publint` invocations for the package at `cwd`
pub fn default_checks(cwd: &Path, config: &Config) -> Result<Vec<CheckCommand>, BuildError> {
    [(Tool::Attw, ATTW_ARGS), (Tool::Publint, PUBLINT_ARGS)]
        .into_iter()
        .map(|(tool, args)| {
            Ok(CheckCommand {
                tool: tool.binary_name().to_string(),
                program: resolve_tool(tool, cwd, config)?,
                args: args.iter().map(|a| (*a).to_string()).collect(),
            })
        })
        .collect()
}

/// Run `checks` concurrently in `cwd`
pub fn run_checks(cwd: &Path, checks: &[CheckCommand]) -> Result<CheckReport, BuildError> {
    let results: Vec<Result<CapturedOutput, BuildError>> = thread::scope(|scope| {
        let handles: Vec<_> = checks
            .iter()
            .map(|check| scope.spawn(move || run_captured(&check.tool, check.command(cwd), None)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    Err(BuildError::Io(std::io::Error::other("checker thread panicked")))
                })
            })
            .collect()
    });

    let mut outputs = Vec::with_capacity(checks.len());
    for (check, result) in checks.iter().zip(results) {
        let captured = result?;
        if !captured.success() {
            return Err(BuildError::Checker {
                tool: check.tool.clone(),
                code: captured.code,
                output: captured.output,
            });
        }
        info!("{} passed", check.tool);
        outputs.push((check.tool.clone(), captured.output));
    }
    Ok(CheckReport { outputs })
}

/// Run `attw` and `publint` against the built package
pub fn check_output(cwd: &Path, config: &Config) -> Result<CheckReport, BuildError> {
    let checks = default_checks(cwd, config)?;
    run_checks(cwd, &checks)
}
