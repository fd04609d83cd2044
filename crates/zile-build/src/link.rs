//! Symlinks from output paths back to sources (development mode)

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zile_manifest::{paths, PlannedLink};

/// What happened to one planned symlink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    pub link: PathBuf,
    /// Target as written into the link, relative to the link's directory
    pub target: PathBuf,
    pub created: bool,
    /// Why the link could not be created
    pub reason: Option<String>,
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

fn create_link(planned: &PlannedLink, target: &Path) -> io::Result<()> {
    if let Some(parent) = planned.link.parent() {
        fs::create_dir_all(parent)?;
    }
    if planned.link.symlink_metadata().is_ok() {
        debug!("Removing existing {}", planned.link.display());
        fs::remove_file(&planned.link)?;
    }
    symlink(target, &planned.link)
}

/// Create every planned link.
///
/// Failures are recorded in the returned outcomes and never abort the batch.
pub fn create_links(planned: &[PlannedLink]) -> Vec<LinkOutcome> {
    planned
        .iter()
        .map(|planned| {
            let base = planned.link.parent().unwrap_or_else(|| Path::new(""));
            let target = paths::relative_to(&planned.target, base);

            match create_link(planned, &target) {
                Ok(()) => {
                    debug!("Linked {} -> {}", planned.link.display(), target.display());
                    LinkOutcome {
                        link: planned.link.clone(),
                        target,
                        created: true,
                        reason: None,
                    }
                }
                Err(e) => {
                    warn!("Could not link {}: {}", planned.link.display(), e);
                    LinkOutcome {
                        link: planned.link.clone(),
                        target,
                        created: false,
                        reason: Some(e.to_string()),
                    }
                }
            }
        })
        .collect()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_links_are_relative_to_their_directory() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let cwd = temp_dir.path();
        assert!(fs::create_dir_all(cwd.join("src/nested")).is_ok());
        assert!(fs::write(cwd.join("src/nested/a.ts"), "export const a = 1").is_ok());

        let outcomes = create_links(&[PlannedLink {
            link: cwd.join("dist/nested/a.js"),
            target: cwd.join("src/nested/a.ts"),
        }]);

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].created);
        assert_eq!(outcomes[0].target, PathBuf::from("../../src/nested/a.ts"));
        assert_eq!(
            fs::read_to_string(cwd.join("dist/nested/a.js")).unwrap_or_default(),
            "export const a = 1"
        );
    }

    #[test]
    fn test_existing_link_is_replaced() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let cwd = temp_dir.path();
        assert!(fs::write(cwd.join("index.ts"), "").is_ok());
        let planned = PlannedLink {
            link: cwd.join("dist/index.js"),
            target: cwd.join("index.ts"),
        };

        assert!(create_links(std::slice::from_ref(&planned))[0].created);
        assert!(create_links(std::slice::from_ref(&planned))[0].created);
    }

    #[test]
    fn test_failure_is_reported_not_raised() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let cwd = temp_dir.path();
        // a file where the link's directory should be
        assert!(fs::write(cwd.join("dist"), "").is_ok());

        let outcomes = create_links(&[
            PlannedLink {
                link: cwd.join("dist/index.js"),
                target: cwd.join("index.ts"),
            },
            PlannedLink {
                link: cwd.join("out/index.js"),
                target: cwd.join("index.ts"),
            },
        ]);
        assert!(!outcomes[0].created);
        assert!(outcomes[0].reason.is_some());
        assert!(outcomes[1].created);
    }
}
