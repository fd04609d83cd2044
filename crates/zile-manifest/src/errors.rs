use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading, validating or rewriting a package manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize package.json: {0}")]
    Serialize(serde_json::Error),

    /// Malformed or missing manifest / project fields
    #[error("Invalid configuration in `{field}`: {message}")]
    Configuration { field: String, message: String },

    /// A declared entry file does not exist
    #[error("`{key}` points to a file that does not exist: {path}")]
    Validation { key: String, path: PathBuf },
}

impl ManifestError {
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        ManifestError::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Configuration and validation failures are mistakes in the user's package,
    /// everything else is an environment or internal failure.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ManifestError::Configuration { .. }
                | ManifestError::Validation { .. }
                | ManifestError::Parse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_names_field() {
        let err = ManifestError::configuration("exports[\"./utils\"]", "missing `src` field");
        assert_eq!(
            err.to_string(),
            "Invalid configuration in `exports[\"./utils\"]`: missing `src` field"
        );
        assert!(err.is_user_error());
    }

    #[test]
    fn test_io_is_not_user_error() {
        let err = ManifestError::from(io::Error::other("disk on fire"));
        assert!(!err.is_user_error());
    }
}
