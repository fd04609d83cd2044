//! Error type for the command layer

use std::io;
use thiserror::Error;
use zile_build::BuildError;
use zile_config::ConfigError;
use zile_manifest::ManifestError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Usage(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Problems the user can fix in their package or invocation
    pub fn is_user_error(&self) -> bool {
        match self {
            CliError::Build(e) => e.is_user_error(),
            CliError::Manifest(e) => e.is_user_error(),
            CliError::Config(_) | CliError::Usage(_) => true,
            CliError::Io(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors() {
        assert!(CliError::Usage("bad".to_string()).is_user_error());
        let err = CliError::from(ManifestError::configuration("bin", "must not be empty"));
        assert!(err.is_user_error());
        assert_eq!(err.to_string(), "Invalid configuration in `bin`: must not be empty");
        assert!(!CliError::from(io::Error::other("disk")).is_user_error());
    }
}
