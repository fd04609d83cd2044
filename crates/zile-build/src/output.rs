//! The output directory and the assets copied into it

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use zile_manifest::paths;

use crate::errors::BuildError;

/// Recursively delete `out_dir`; a missing directory is fine
pub fn remove_output_dir(out_dir: &Path) -> Result<(), BuildError> {
    match fs::remove_dir_all(out_dir) {
        Ok(()) => {
            debug!("Removed {}", out_dir.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Delete and recreate `out_dir` empty
pub fn reset_output_dir(out_dir: &Path) -> Result<(), BuildError> {
    remove_output_dir(out_dir)?;
    fs::create_dir_all(out_dir)?;
    Ok(())
}

/// Copy each asset to `<out_dir>/<path relative to cwd>`
pub fn copy_assets(assets: &[PathBuf], cwd: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut copied = Vec::with_capacity(assets.len());
    for asset in assets {
        let destination = out_dir.join(paths::relative_to(asset, cwd));
        let wrap = |source: io::Error| BuildError::AssetCopy {
            path: asset.clone(),
            source,
        };

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
        fs::copy(asset, &destination).map_err(wrap)?;
        debug!("Copied {} -> {}", asset.display(), destination.display());
        copied.push(destination);
    }
    Ok(copied)
}
