//! Path helpers shared by the resolver, the decorator and the writer
//!
//! Manifest values are always forward-slash paths relative to the package
//! directory and prefixed with `./` (`./src/index.ts`).

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: drop `.` components and fold `..` into the parent.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve a manifest value against the package directory
pub fn resolve(cwd: &Path, value: &str) -> PathBuf {
    normalize(&cwd.join(value))
}

/// `path` relative to `base`, or `path` unchanged when no relative form exists
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Render a relative path the way package.json expects it
pub fn to_manifest_path(relative: &Path) -> String {
    let parts: Vec<String> = relative
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if parts.is_empty() {
        return ".".to_string();
    }
    let joined = parts.join("/");
    if parts[0] == ".." {
        joined
    } else {
        format!("./{}", joined)
    }
}

/// Whether `path` lives inside (or is) `dir`
pub fn is_within(path: &Path, dir: &Path) -> bool {
    normalize(path).starts_with(normalize(dir))
}

/// Drop the final extension: `nested/foo.ts` -> `nested/foo`
pub fn strip_extension(path: &Path) -> PathBuf {
    match path.file_stem() {
        Some(stem) => path.with_file_name(stem),
        None => path.to_path_buf(),
    }
}
