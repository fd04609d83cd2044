//! Configuration for the zile CLI
//!
//! Holds the optional `zile.toml` settings file and the lookup rules for the
//! external tools zile drives (the TypeScript compiler and the output checkers).

pub mod config;
pub mod tool_paths;

pub use config::{Config, ConfigError};
pub use tool_paths::{resolve_tool, Tool, ToolPathError};
