//! Inferring the directory sources are laid out under

use std::path::{Component, Path, PathBuf};

/// Directory used when there are no source entries
pub const DEFAULT_SOURCE_DIR: &str = "src";

/// Deepest directory shared by the parent of every source.
///
/// Only used to shorten output paths: it is never checked to exist and a
/// root that degrades to `cwd` simply means nothing is stripped.
pub fn infer_source_root(sources: &[PathBuf], cwd: &Path) -> PathBuf {
    if sources.is_empty() {
        return cwd.join(DEFAULT_SOURCE_DIR);
    }

    let dirs: Vec<Vec<Component<'_>>> = sources
        .iter()
        .map(|source| {
            source
                .parent()
                .map(|dir| dir.components().collect())
                .unwrap_or_default()
        })
        .collect();

    let shortest = dirs.iter().map(Vec::len).min().unwrap_or(0);
    let mut root = PathBuf::new();
    for index in 0..shortest {
        let component = dirs[0][index];
        if dirs.iter().any(|dir| dir[index] != component) {
            break;
        }
        root.push(component.as_os_str());
    }

    if root.as_os_str().is_empty() {
        cwd.to_path_buf()
    } else {
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(cwd: &Path, files: &[&str]) -> Vec<PathBuf> {
        files.iter().map(|f| cwd.join(f)).collect()
    }

    #[test]
    fn test_common_directory() {
        let cwd = Path::new("/pkg");
        let files = sources(cwd, &["src/index.ts", "src/foo.ts", "src/nested/dir/bar.ts"]);
        assert_eq!(infer_source_root(&files, cwd), PathBuf::from("/pkg/src"));
    }

    #[test]
    fn test_no_shared_parent_falls_back_to_cwd() {
        let cwd = Path::new("/pkg");
        let files = sources(cwd, &["src/index.ts", "foo.ts"]);
        assert_eq!(infer_source_root(&files, cwd), PathBuf::from("/pkg"));
    }

    #[test]
    fn test_single_nested_source() {
        let cwd = Path::new("/pkg");
        let files = sources(cwd, &["src/lib/index.ts"]);
        assert_eq!(infer_source_root(&files, cwd), PathBuf::from("/pkg/src/lib"));
    }

    #[test]
    fn test_sibling_directories_share_parent() {
        let cwd = Path::new("/pkg");
        let files = sources(cwd, &["src/a/index.ts", "src/b/index.ts"]);
        assert_eq!(infer_source_root(&files, cwd), PathBuf::from("/pkg/src"));
    }

    #[test]
    fn test_empty_defaults_to_src() {
        let cwd = Path::new("/pkg");
        assert_eq!(infer_source_root(&[], cwd), PathBuf::from("/pkg/src"));
    }
}
