use std::io;
use std::path::PathBuf;
use thiserror::Error;
use zile_config::ToolPathError;
use zile_manifest::ManifestError;

fn exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Errors raised while building, linking or checking a package
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    ToolNotFound(#[from] ToolPathError),

    #[error("Compilation failed ({})\n{output}", exit_code(.code))]
    Compiler { code: Option<i32>, output: String },

    #[error("`{tool}` reported problems ({})\n{output}", exit_code(.code))]
    Checker {
        tool: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Failed to copy asset {path}: {source}")]
    AssetCopy { path: PathBuf, source: io::Error },

    #[error("Failed to start `{tool}`: {source}")]
    Spawn { tool: String, source: io::Error },

    #[error("`{tool}` did not finish within {seconds}s and was stopped")]
    Timeout { tool: String, seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl BuildError {
    /// Mistakes in the package or its setup rather than failures of zile itself
    pub fn is_user_error(&self) -> bool {
        match self {
            BuildError::Manifest(err) => err.is_user_error(),
            BuildError::ToolNotFound(_) => true,
            _ => false,
        }
    }
}
