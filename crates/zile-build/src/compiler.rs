//! Driving the TypeScript compiler
//!
//! The project's own tsconfig is never touched. A derived configuration that
//! `extends` it is written to a scratch directory inside the package, forcing
//! the options a publishable build needs, and the compiler is pointed at that
//! file with `--project`.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};
use zile_config::{resolve_tool, Config, Tool};
use zile_manifest::{ManifestError, TsConfig};

use crate::errors::BuildError;
use crate::output::remove_output_dir;
use crate::process::{run_captured, CapturedOutput};

/// `target` used when the project does not set one
pub const DEFAULT_TARGET: &str = "es2021";

/// Options every build forces regardless of the project configuration
pub const FORCED_OPTIONS: &[(&str, bool)] = &[
    ("composite", false),
    ("declaration", true),
    ("declarationMap", true),
    ("emitDeclarationOnly", false),
    ("esModuleInterop", true),
    ("noEmit", false),
    ("skipLibCheck", true),
    ("sourceMap", true),
];

const DERIVED_DIR_PREFIX: &str = ".zile-";
const DERIVED_FILE: &str = "tsconfig.json";

/// Something that can run a compiler against a project file
pub trait Transpiler {
    /// Display name used in logs and errors
    fn name(&self) -> &str;

    /// Compile the project described by `project`, with `cwd` as working directory
    fn transpile(&self, cwd: &Path, project: &Path) -> Result<CapturedOutput, BuildError>;
}

/// Runs a real compiler binary (`tsc` or `tsgo`).
///
/// The binary is looked up when compilation starts, relative to the package
/// being built, so a link-only run never needs a compiler installed.
#[derive(Debug, Clone)]
pub struct ProcessTranspiler {
    tool: Tool,
    config: Config,
}

impl ProcessTranspiler {
    pub fn new(config: Config, use_alternate: bool) -> Self {
        ProcessTranspiler {
            tool: Tool::compiler(use_alternate),
            config,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }
}

impl Transpiler for ProcessTranspiler {
    fn name(&self) -> &str {
        self.tool.binary_name()
    }

    fn transpile(&self, cwd: &Path, project: &Path) -> Result<CapturedOutput, BuildError> {
        let program = resolve_tool(self.tool, cwd, &self.config)?;
        debug!("Using {} at {}", self.tool, program.display());

        let mut command = Command::new(&program);
        command.arg("--project").arg(project).current_dir(cwd);
        run_captured(self.name(), command, self.config.compile_timeout())
    }
}

/// The configuration handed to the compiler
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedTsConfig {
    pub extends: String,
    pub compiler_options: Map<String, Value>,
    pub include: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

/// Build the derived configuration for compiling `sources`
pub fn derive_tsconfig(tsconfig: &TsConfig, cwd: &Path, sources: &[PathBuf]) -> DerivedTsConfig {
    let options = &tsconfig.compiler_options;
    let mut compiler_options = Map::new();

    for (name, value) in FORCED_OPTIONS {
        compiler_options.insert((*name).to_string(), Value::Bool(*value));
    }
    compiler_options.insert(
        "outDir".to_string(),
        Value::String(path_string(&tsconfig.out_dir(cwd))),
    );
    if let Some(dir) = &options.declaration_dir {
        compiler_options.insert("declarationDir".to_string(), Value::String(dir.clone()));
    }
    compiler_options.insert(
        "target".to_string(),
        Value::String(options.target.clone().unwrap_or_else(|| DEFAULT_TARGET.to_string())),
    );

    // Entries only; tsc roots outDir at the common directory of its inputs
    let include = sources.iter().map(|source| path_string(source)).collect();

    DerivedTsConfig {
        extends: path_string(&tsconfig.path),
        compiler_options,
        include,
        exclude: tsconfig.exclude.clone(),
    }
}

/// Validate the project, compile `sources` and leave the output in `outDir`.
///
/// The output directory is removed first. The derived configuration lives in
/// a temporary directory that is deleted however the compiler exits.
pub fn compile(
    cwd: &Path,
    tsconfig: &TsConfig,
    sources: &[PathBuf],
    transpiler: &dyn Transpiler,
) -> Result<DerivedTsConfig, BuildError> {
    tsconfig.check_module_resolution()?;

    let derived = derive_tsconfig(tsconfig, cwd, sources);
    remove_output_dir(&tsconfig.out_dir(cwd))?;

    let scratch = tempfile::Builder::new()
        .prefix(DERIVED_DIR_PREFIX)
        .tempdir_in(cwd)?;
    let project = scratch.path().join(DERIVED_FILE);
    let content = serde_json::to_string_pretty(&derived).map_err(ManifestError::Serialize)?;
    fs::write(&project, content)?;

    info!(
        "Compiling {} source(s) with {}",
        sources.len(),
        transpiler.name()
    );
    let captured = transpiler.transpile(cwd, &project)?;
    if !captured.success() {
        return Err(BuildError::Compiler {
            code: captured.code,
            output: captured.output,
        });
    }

    debug!("{} finished", transpiler.name());
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;
    use zile_manifest::CompilerOptions;

    struct Recorder {
        code: Option<i32>,
        seen: RefCell<Option<(PathBuf, String)>>,
    }

    impl Transpiler for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn transpile(&self, _cwd: &Path, project: &Path) -> Result<CapturedOutput, BuildError> {
            let content = fs::read_to_string(project)?;
            *self.seen.borrow_mut() = Some((project.to_path_buf(), content));
            Ok(CapturedOutput {
                code: self.code,
                output: "error TS1005".to_string(),
            })
        }
    }

    fn nodenext(cwd: &Path) -> TsConfig {
        TsConfig {
            path: cwd.join("tsconfig.json"),
            compiler_options: CompilerOptions {
                module: Some("NodeNext".to_string()),
                module_resolution: Some("nodenext".to_string()),
                ..Default::default()
            },
            include: None,
            exclude: Some(vec![cwd.join("test").display().to_string()]),
        }
    }

    #[test]
    fn test_derived_config_forces_publish_options() {
        let cwd = Path::new("/pkg");
        let derived = derive_tsconfig(&nodenext(cwd), cwd, &[cwd.join("src/index.ts")]);

        assert_eq!(derived.extends, "/pkg/tsconfig.json");
        assert_eq!(derived.compiler_options["declaration"], Value::Bool(true));
        assert_eq!(derived.compiler_options["noEmit"], Value::Bool(false));
        assert_eq!(derived.compiler_options["outDir"], "/pkg/dist");
        assert_eq!(derived.compiler_options["target"], DEFAULT_TARGET);
        assert!(derived.compiler_options.get("declarationDir").is_none());
        assert_eq!(derived.include, vec!["/pkg/src/index.ts".to_string()]);
        assert_eq!(derived.exclude, Some(vec!["/pkg/test".to_string()]));
    }

    #[test]
    fn test_project_target_kept_and_include_narrowed_to_sources() {
        let cwd = Path::new("/pkg");
        let mut tsconfig = nodenext(cwd);
        tsconfig.compiler_options.target = Some("esnext".to_string());
        tsconfig.include = Some(vec!["/pkg/src".to_string(), "/pkg/test".to_string()]);

        let derived = derive_tsconfig(&tsconfig, cwd, &[cwd.join("src/index.ts")]);
        assert_eq!(derived.compiler_options["target"], "esnext");
        assert_eq!(derived.include, vec!["/pkg/src/index.ts"]);
    }

    #[test]
    fn test_scratch_config_removed_after_failure() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let cwd = temp_dir.path();
        assert!(fs::create_dir_all(cwd.join("dist/stale")).is_ok());

        let recorder = Recorder {
            code: Some(2),
            seen: RefCell::new(None),
        };
        let result = compile(cwd, &nodenext(cwd), &[cwd.join("index.ts")], &recorder);
        assert!(matches!(result, Err(BuildError::Compiler { code: Some(2), .. })));

        let Some((project, content)) = recorder.seen.into_inner() else {
            panic!("compiler should have been invoked");
        };
        assert!(content.contains("\"extends\""));
        assert!(!project.exists());
        assert!(!cwd.join("dist").exists());
    }

    #[test]
    fn test_invalid_module_resolution_stops_before_compiling() {
        let cwd = Path::new("/pkg");
        let mut tsconfig = nodenext(cwd);
        tsconfig.compiler_options.module = Some("esnext".to_string());

        let recorder = Recorder {
            code: Some(0),
            seen: RefCell::new(None),
        };
        let result = compile(cwd, &tsconfig, &[], &recorder);
        assert!(result.is_err_and(|e| e.is_user_error()));
        assert!(recorder.seen.borrow().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_process_transpiler_passes_project_flag() {
        use std::os::unix::fs::PermissionsExt;

        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let cwd = temp_dir.path();
        let script = cwd.join("fake-tsc");
        assert!(fs::write(&script, "#!/bin/sh\necho \"$1 $2\"\nexit 1\n").is_ok());
        assert!(fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).is_ok());

        let config = Config {
            compiler_path: Some(script.display().to_string()),
            ..Default::default()
        };
        let transpiler = ProcessTranspiler::new(config, false);
        assert_eq!(transpiler.name(), "tsc");

        let Ok(captured) = transpiler.transpile(cwd, Path::new("/tmp/derived.json")) else {
            return;
        };
        assert_eq!(captured.code, Some(1));
        assert_eq!(captured.output.trim(), "--project /tmp/derived.json");
    }
}
