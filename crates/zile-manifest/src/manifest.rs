//! Reading package.json and the project configuration through the session cache

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::cache::ManifestCache;
use crate::errors::ManifestError;
use crate::paths;
use crate::tsconfig::TsConfig;
use crate::types::PackageJson;

pub const PACKAGE_JSON: &str = "package.json";

pub fn package_json_path(cwd: &Path) -> PathBuf {
    cwd.join(PACKAGE_JSON)
}

/// Parse manifest text; the top level must be a JSON object
pub fn parse_package_json(raw: &str, path: &Path) -> Result<PackageJson, ManifestError> {
    serde_json::from_str(raw).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read `<cwd>/package.json`, reusing the cached text when this directory was
/// already read in the session
pub fn read_package_json(cwd: &Path, cache: &ManifestCache) -> Result<PackageJson, ManifestError> {
    let path = package_json_path(cwd);

    let raw = match cache.package_json(cwd) {
        Some(raw) => raw,
        None => {
            debug!("Reading {}", path.display());
            let raw: Arc<str> = Arc::from(fs::read_to_string(&path)?);
            cache.store_package_json(cwd, Arc::clone(&raw));
            raw
        }
    };

    parse_package_json(&raw, &path)
}

/// Read the project configuration at `project` (relative to `cwd`)
pub fn read_tsconfig(
    cwd: &Path,
    project: &Path,
    cache: &ManifestCache,
) -> Result<Arc<TsConfig>, ManifestError> {
    let project = paths::normalize(&cwd.join(project));
    if let Some(config) = cache.tsconfig(cwd, &project) {
        return Ok(config);
    }

    let config = Arc::new(TsConfig::load(&project)?);
    cache.store_tsconfig(cwd, &project, Arc::clone(&config));
    Ok(config)
}
