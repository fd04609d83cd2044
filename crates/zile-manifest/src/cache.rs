//! Per-session cache of manifest text and project configuration
//!
//! One cache belongs to one build session. It is keyed by package directory,
//! filled on first read and only cleared explicitly, so the raw text that was
//! read at the start of a build is still around to recover formatting when
//! the decorated manifest is written back.

use ahash::AHashMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::tsconfig::TsConfig;

#[derive(Debug, Clone, Default)]
struct CacheEntry {
    package_json: Option<Arc<str>>,
    tsconfig: Option<(PathBuf, Arc<TsConfig>)>,
}

#[derive(Debug, Default)]
pub struct ManifestCache {
    entries: RwLock<AHashMap<PathBuf, CacheEntry>>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw package.json text last read from or written to `cwd`
    pub fn package_json(&self, cwd: &Path) -> Option<Arc<str>> {
        self.entries
            .read()
            .get(cwd)
            .and_then(|entry| entry.package_json.clone())
    }

    pub fn store_package_json(&self, cwd: &Path, raw: Arc<str>) {
        self.entries
            .write()
            .entry(cwd.to_path_buf())
            .or_default()
            .package_json = Some(raw);
    }

    /// Project configuration for `cwd`, if it was loaded from `project`
    pub fn tsconfig(&self, cwd: &Path, project: &Path) -> Option<Arc<TsConfig>> {
        self.entries
            .read()
            .get(cwd)
            .and_then(|entry| entry.tsconfig.as_ref())
            .filter(|(path, _)| path == project)
            .map(|(_, config)| Arc::clone(config))
    }

    pub fn store_tsconfig(&self, cwd: &Path, project: &Path, config: Arc<TsConfig>) {
        self.entries
            .write()
            .entry(cwd.to_path_buf())
            .or_default()
            .tsconfig = Some((project.to_path_buf(), config));
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
