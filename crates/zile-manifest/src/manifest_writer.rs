//! Writing package.json back in the author's own format
//!
//! The indentation of the original file (first indented line, tab beats
//! spaces) and whether it ended with a newline are reproduced. A manifest that
//! was never read is written with two spaces and a trailing newline.

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::ManifestCache;
use crate::errors::ManifestError;
use crate::manifest::package_json_path;
use crate::types::PackageJson;

pub const DEFAULT_INDENT: &str = "  ";

/// Indentation of the first indented line of `content`
pub fn detect_indent(content: &str) -> String {
    content
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .find_map(|line| {
            if line.starts_with('\t') {
                return Some("\t".to_string());
            }
            let spaces = line.len() - line.trim_start_matches(' ').len();
            (spaces > 0).then(|| " ".repeat(spaces))
        })
        .unwrap_or_else(|| DEFAULT_INDENT.to_string())
}

/// Serialize with the given indent string
pub fn to_json_string(package_json: &PackageJson, indent: &str) -> Result<String, ManifestError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    package_json
        .serialize(&mut serializer)
        .map_err(ManifestError::Serialize)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Render `package_json` in the format of `original` (or the default format)
pub fn render_package_json(
    package_json: &PackageJson,
    original: Option<&str>,
) -> Result<String, ManifestError> {
    let (indent, trailing_newline) = match original {
        Some(text) => (detect_indent(text), text.ends_with('\n')),
        None => (DEFAULT_INDENT.to_string(), true),
    };

    let mut content = to_json_string(package_json, &indent)?;
    if trailing_newline {
        content.push('\n');
    }
    Ok(content)
}

/// Write `<cwd>/package.json`, formatted like the cached original
pub fn write_package_json(
    cwd: &Path,
    package_json: &PackageJson,
    cache: &ManifestCache,
) -> Result<(), ManifestError> {
    let path = package_json_path(cwd);
    let original = cache.package_json(cwd);
    let content = render_package_json(package_json, original.as_deref())?;

    debug!("Writing {}", path.display());

    // Write to a sibling temp file, then rename over the manifest
    let temp_path = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
    }
    fs::rename(&temp_path, &path)?;

    cache.store_package_json(cwd, Arc::from(content));
    info!("Wrote {}", path.display());
    Ok(())
}
