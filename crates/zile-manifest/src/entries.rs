//! Collecting and classifying the files a manifest refers to
//!
//! Files are read from `bin`, then `exports` in declaration order, falling
//! back to `main` when there is no `exports` map. A code file is compiled, any
//! other file is an asset copied verbatim into the output directory.
//! Declaration files (`.d.ts`) are assets: the compiler emits nothing for them.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::errors::ManifestError;
use crate::paths;
use crate::types::{export_field, PackageJson};

static SOURCE_FILE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\.(m|c)?[jt]sx?$").ok());
static DECLARATION_FILE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\.d\.(m|c)?ts$").ok());

fn matches(pattern: &Lazy<Option<Regex>>, path: &Path) -> bool {
    pattern
        .as_ref()
        .is_some_and(|re| re.is_match(&path.to_string_lossy()))
}

/// `.js .jsx .ts .tsx` with an optional `.m`/`.c` module-type infix, excluding declarations
pub fn is_source_file(path: &Path) -> bool {
    matches(&SOURCE_FILE, path) && !is_declaration_file(path)
}

/// `.d.ts`, `.d.mts` or `.d.cts`
pub fn is_declaration_file(path: &Path) -> bool {
    matches(&DECLARATION_FILE, path)
}

/// A path as written in the manifest with the key it was found under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredEntry {
    pub field: String,
    pub value: String,
}

/// Every file reference in `bin`, `exports` (or `main`), in manifest order
pub fn declared_entries(package_json: &PackageJson) -> Result<Vec<DeclaredEntry>, ManifestError> {
    let mut declared = Vec::new();

    if let Some(bin) = package_json.bin()? {
        declared.extend(bin.sources()?.into_iter().map(|s| DeclaredEntry {
            field: s.field,
            value: s.source,
        }));
    }

    match package_json.exports()? {
        Some(exports) => {
            declared.extend(exports.iter().map(|(key, entry)| DeclaredEntry {
                field: export_field(key),
                value: entry.source().to_string(),
            }));
        }
        None => {
            if let Some(main) = package_json.main() {
                declared.push(DeclaredEntry {
                    field: "main".to_string(),
                    value: main.to_string(),
                });
            }
        }
    }

    Ok(declared)
}

/// Absolute entry files split into compiled sources and copied assets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entries {
    pub sources: Vec<PathBuf>,
    pub assets: Vec<PathBuf>,
}

impl Entries {
    fn push(&mut self, path: PathBuf) {
        let list = if is_source_file(&path) {
            &mut self.sources
        } else {
            &mut self.assets
        };
        if !list.contains(&path) {
            list.push(path);
        }
    }

    /// Drop entries that already live in the output directory
    pub fn without_output(self, out_dir: &Path) -> Self {
        let keep = |paths: Vec<PathBuf>| -> Vec<PathBuf> {
            paths
                .into_iter()
                .filter(|p| !paths::is_within(p, out_dir))
                .collect()
        };
        Entries {
            sources: keep(self.sources),
            assets: keep(self.assets),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.assets.is_empty()
    }
}

/// Resolve every manifest entry against `cwd` and classify it
pub fn resolve_entries(package_json: &PackageJson, cwd: &Path) -> Result<Entries, ManifestError> {
    let mut entries = Entries::default();
    for declared in declared_entries(package_json)? {
        entries.push(paths::resolve(cwd, &declared.value));
    }
    Ok(entries)
}
