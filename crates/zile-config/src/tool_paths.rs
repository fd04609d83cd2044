//! Locating the external binaries zile drives
//!
//! Lookup order for each tool:
//! 1. explicit path from `zile.toml`
//! 2. `node_modules/.bin/<tool>` in the package directory or any ancestor
//! 3. `PATH` (via `which`)

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::Config;

/// The directory package managers link executables into
pub const NODE_BIN_DIR: &str = "node_modules/.bin";

/// Suffixes tried for linked executables
#[cfg(not(windows))]
const BIN_SUFFIXES: &[&str] = &[""];
#[cfg(windows)]
const BIN_SUFFIXES: &[&str] = &[".cmd", ".exe", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// The TypeScript compiler (`tsc`)
    Compiler,
    /// The native-preview compiler (`tsgo`)
    AlternateCompiler,
    /// Are-the-types-wrong export checker
    Attw,
    /// Package linter
    Publint,
}

impl Tool {
    pub fn binary_name(self) -> &'static str {
        match self {
            Tool::Compiler => "tsc",
            Tool::AlternateCompiler => "tsgo",
            Tool::Attw => "attw",
            Tool::Publint => "publint",
        }
    }

    pub fn compiler(use_alternate: bool) -> Self {
        if use_alternate {
            Tool::AlternateCompiler
        } else {
            Tool::Compiler
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary_name())
    }
}

#[derive(Error, Debug, Clone)]
pub enum ToolPathError {
    /// The configured override does not point at a file
    #[error("Configured {tool} path does not exist: {}", .path.display())]
    OverrideMissing { tool: Tool, path: PathBuf },
    /// Nothing found in node_modules or on PATH
    #[error(
        "Could not find `{tool}` in {} (or any parent) nor on PATH",
        .searched_from.join(NODE_BIN_DIR).display()
    )]
    NotFound { tool: Tool, searched_from: PathBuf },
}

/// Resolve the executable for `tool` as seen from the package at `cwd`
pub fn resolve_tool(tool: Tool, cwd: &Path, config: &Config) -> Result<PathBuf, ToolPathError> {
    if let Some(path) = config.tool_override(tool) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(path);
        }
        return Err(ToolPathError::OverrideMissing { tool, path });
    }

    if let Some(path) = find_in_node_modules(tool.binary_name(), cwd) {
        return Ok(path);
    }

    which::which(tool.binary_name()).map_err(|_| ToolPathError::NotFound {
        tool,
        searched_from: cwd.to_path_buf(),
    })
}

/// Walk up from `start` looking for `node_modules/.bin/<name>`
pub fn find_in_node_modules(name: &str, start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        let bin_dir = dir.join(NODE_BIN_DIR);
        BIN_SUFFIXES
            .iter()
            .map(|suffix| bin_dir.join(format!("{}{}", name, suffix)))
            .find(|candidate| candidate.is_file())
    })
}
