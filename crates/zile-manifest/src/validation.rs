//! Pre-build checks on the manifest's declared files

use std::path::Path;
use tracing::debug;

use crate::entries::{declared_entries, DeclaredEntry};
use crate::errors::ManifestError;
use crate::paths;
use crate::types::PackageJson;

/// A manifest must declare at least one of `exports`, `main` or `bin`
pub fn require_entrypoints(package_json: &PackageJson) -> Result<(), ManifestError> {
    if package_json.has_entrypoints() {
        return Ok(());
    }
    Err(ManifestError::configuration(
        "package.json",
        "must declare at least one of `exports`, `main` or `bin`",
    ))
}

/// Confirm every declared `bin`/`main`/`exports` file exists.
///
/// Paths inside `out_dir` are skipped, they only exist once the build ran.
pub fn check_package_json(
    package_json: &PackageJson,
    cwd: &Path,
    out_dir: &Path,
) -> Result<(), ManifestError> {
    require_entrypoints(package_json)?;

    let mut declared = declared_entries(package_json)?;
    // `main` is checked even when `exports` takes precedence for the build
    if let Some(main) = package_json.main() {
        if !declared.iter().any(|d| d.field == "main") {
            declared.push(DeclaredEntry {
                field: "main".to_string(),
                value: main.to_string(),
            });
        }
    }

    for entry in declared {
        let path = paths::resolve(cwd, &entry.value);
        if paths::is_within(&path, out_dir) {
            debug!("Skipping {} ({}): inside output directory", entry.field, entry.value);
            continue;
        }
        if !path.is_file() {
            return Err(ManifestError::Validation {
                key: entry.field,
                path,
            });
        }
    }
    Ok(())
}
