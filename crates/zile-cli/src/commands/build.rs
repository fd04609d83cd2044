use clap::Args;
use std::path::{Path, PathBuf};
use zile_build::{build, BuildError, BuildOptions, BuildOutput, BuildSession, ProcessTranspiler};
use zile_config::Config;
use zile_manifest::TSCONFIG_FILE;

use crate::commands::{check, load_config};
use crate::common::CwdArg;
use crate::errors::CliError;
use crate::GlobalOpts;

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub cwd: CwdArg,

    /// Path to tsconfig.json, relative to the working directory
    #[arg(long, value_name = "PATH", default_value = TSCONFIG_FILE)]
    pub project: PathBuf,

    /// Compile with tsgo instead of tsc
    #[arg(long)]
    pub tsgo: bool,

    /// Run attw and publint on the result
    #[arg(long)]
    pub check: bool,
}

impl Default for BuildArgs {
    fn default() -> Self {
        BuildArgs {
            cwd: CwdArg::default(),
            project: PathBuf::from(TSCONFIG_FILE),
            tsgo: false,
            check: false,
        }
    }
}

/// Build (or with `link`, symlink) the package and rewrite its package.json
pub fn run_build(
    cwd: &Path,
    args: &BuildArgs,
    link: bool,
    config: &Config,
) -> Result<BuildOutput, CliError> {
    let verb = if link { "Linking" } else { "Building" };
    zile_logger::progress(&format!("{} package at {}", verb, cwd.display()));

    let session = BuildSession::new();
    let options = BuildOptions::new(cwd)
        .project(&args.project)
        .link(link);
    let transpiler = ProcessTranspiler::new(config.clone(), args.tsgo);

    if !link {
        zile_logger::spinner_start(&format!("Compiling with {}", transpiler.tool()));
    }
    let result = build(&session, &options, &transpiler);
    match &result {
        Ok(_) if !link => {
            zile_logger::spinner_success(&format!("Compiled with {}", transpiler.tool()));
        }
        Err(BuildError::Compiler { code, output }) => {
            zile_logger::spinner_error(&format!("{} failed", transpiler.tool()));
            zile_logger::capture_output(transpiler.tool().binary_name(), *code, output);
        }
        _ => zile_logger::spinner_stop(),
    }
    let output = result?;

    zile_logger::debug(&format!(
        "{} source(s), {} asset(s), output in {}",
        output.sources.len(),
        output.assets.len(),
        output.out_dir.display()
    ));
    for outcome in output.links.iter().filter(|o| !o.created) {
        zile_logger::warn(&format!(
            "Could not link {}: {}",
            outcome.link.display(),
            outcome.reason.as_deref().unwrap_or("unknown error")
        ));
    }

    zile_logger::success(&format!("{} completed successfully", verb));
    Ok(output)
}

pub fn handle_build(args: BuildArgs, link: bool, _opts: &GlobalOpts) -> Result<(), CliError> {
    let cwd = args.cwd.resolve()?;
    let config = load_config()?;

    run_build(&cwd, &args, link, &config)?;

    if args.check && !link {
        check::run_checks(&cwd, &config)?;
    }
    Ok(())
}
