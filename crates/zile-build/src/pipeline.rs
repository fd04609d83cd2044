//! The build: read, validate, compile (or link), decorate, write
//!
//! ```text
//! package.json + tsconfig.json
//!   -> check declared files exist
//!   -> resolve entries (sources / assets)
//!   -> build: compile sources        link: empty the output directory
//!   -> infer source root
//!   -> copy assets
//!   -> decorate manifest             link: create symlinks
//!   -> write package.json
//! ```
//!
//! Nothing is written before validation passes, and package.json is written
//! last, so a failed build leaves the manifest as it was.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use zile_manifest::{
    check_package_json, decorate_package_json, infer_source_root, paths, read_package_json,
    read_tsconfig, resolve_entries, write_package_json, DecorateOptions, ManifestCache,
    ManifestError, PackageJson, TsConfig, DEFAULT_OUT_DIR, TSCONFIG_FILE,
};

use crate::compiler::{compile, Transpiler};
use crate::errors::BuildError;
use crate::link::{create_links, LinkOutcome};
use crate::output::{copy_assets, reset_output_dir};

/// State shared by the builds of one zile invocation
#[derive(Debug, Default)]
pub struct BuildSession {
    cache: ManifestCache,
}

impl BuildSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &ManifestCache {
        &self.cache
    }

    /// Forget everything read so far
    pub fn clear(&self) {
        self.cache.clear();
    }
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Absolute package directory
    pub cwd: PathBuf,
    /// Project configuration, relative to `cwd`
    pub project: PathBuf,
    /// Symlink sources instead of compiling
    pub link: bool,
}

impl BuildOptions {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        BuildOptions {
            cwd: cwd.into(),
            project: PathBuf::from(TSCONFIG_FILE),
            link: false,
        }
    }

    pub fn project(mut self, project: impl Into<PathBuf>) -> Self {
        self.project = project.into();
        self
    }

    pub fn link(mut self, link: bool) -> Self {
        self.link = link;
        self
    }
}

/// Everything a build produced
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// The manifest as written
    pub package_json: PackageJson,
    /// `None` only for a link-mode build without a project file
    pub tsconfig: Option<Arc<TsConfig>>,
    pub out_dir: PathBuf,
    pub source_dir: PathBuf,
    pub sources: Vec<PathBuf>,
    pub assets: Vec<PathBuf>,
    pub links: Vec<LinkOutcome>,
}

fn load_tsconfig(
    session: &BuildSession,
    cwd: &Path,
    options: &BuildOptions,
) -> Result<Option<Arc<TsConfig>>, BuildError> {
    let project = cwd.join(&options.project);
    if options.link && !project.is_file() {
        debug!("No {} found, linking with defaults", project.display());
        return Ok(None);
    }
    Ok(Some(read_tsconfig(cwd, &options.project, session.cache())?))
}

/// The output directory is deleted on every build; it must not hold the package itself
fn guard_out_dir(cwd: &Path, out_dir: &Path) -> Result<(), BuildError> {
    if paths::is_within(cwd, out_dir) {
        return Err(ManifestError::configuration(
            "compilerOptions.outDir",
            format!(
                "{} would delete the package directory; point it at a subdirectory such as `{}`",
                out_dir.display(),
                DEFAULT_OUT_DIR
            ),
        )
        .into());
    }
    Ok(())
}

/// Build (or link) the package at `options.cwd` and rewrite its package.json
pub fn build(
    session: &BuildSession,
    options: &BuildOptions,
    transpiler: &dyn Transpiler,
) -> Result<BuildOutput, BuildError> {
    let cwd = paths::normalize(&options.cwd);
    let cache = session.cache();

    let package_json = read_package_json(&cwd, cache)?;
    let tsconfig = load_tsconfig(session, &cwd, options)?;
    let out_dir = match &tsconfig {
        Some(tsconfig) => tsconfig.out_dir(&cwd),
        None => cwd.join(DEFAULT_OUT_DIR),
    };
    guard_out_dir(&cwd, &out_dir)?;

    check_package_json(&package_json, &cwd, &out_dir)?;
    let entries = resolve_entries(&package_json, &cwd)?.without_output(&out_dir);
    debug!(
        "Resolved {} source(s) and {} asset(s)",
        entries.sources.len(),
        entries.assets.len()
    );

    match (&tsconfig, options.link) {
        (Some(tsconfig), false) if !entries.sources.is_empty() => {
            compile(&cwd, tsconfig, &entries.sources, transpiler)?;
        }
        (None, false) => {
            return Err(ManifestError::configuration(
                options.project.display().to_string(),
                "project configuration is required to build",
            )
            .into());
        }
        _ => {
            info!("Preparing {}", out_dir.display());
            reset_output_dir(&out_dir)?;
        }
    }

    let source_dir = infer_source_root(&entries.sources, &cwd);
    copy_assets(&entries.assets, &cwd, &out_dir)?;

    let decoration = decorate_package_json(
        &package_json,
        &DecorateOptions {
            cwd: &cwd,
            out_dir: &out_dir,
            source_dir: &source_dir,
            link: options.link,
        },
    )?;
    let links = create_links(&decoration.links);

    write_package_json(&cwd, &decoration.package_json, cache)?;

    Ok(BuildOutput {
        package_json: decoration.package_json,
        tsconfig,
        out_dir,
        source_dir,
        sources: entries.sources,
        assets: entries.assets,
        links,
    })
}
