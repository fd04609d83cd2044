//! Loading the TypeScript project configuration
//!
//! tsconfig files are JSON with comments and trailing commas. `extends` chains
//! are followed and merged child-over-parent, and every path-valued option is
//! made absolute against the file that declared it so the merged result no
//! longer depends on where it came from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::ManifestError;
use crate::paths;

/// Default project file name
pub const TSCONFIG_FILE: &str = "tsconfig.json";

/// Output directory used when the project does not declare `outDir`
pub const DEFAULT_OUT_DIR: &str = "dist";

const NODENEXT: &str = "nodenext";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declaration_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl CompilerOptions {
    fn merged_over(self, parent: CompilerOptions) -> CompilerOptions {
        let mut other = parent.other;
        other.extend(self.other);
        CompilerOptions {
            module: self.module.or(parent.module),
            module_resolution: self.module_resolution.or(parent.module_resolution),
            out_dir: self.out_dir.or(parent.out_dir),
            declaration_dir: self.declaration_dir.or(parent.declaration_dir),
            target: self.target.or(parent.target),
            other,
        }
    }

    fn absolutize(mut self, base: &Path) -> Self {
        let absolute = |value: String| paths::resolve(base, &value).display().to_string();
        self.out_dir = self.out_dir.map(absolute);
        self.declaration_dir = self.declaration_dir.map(absolute);
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Extends {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTsConfig {
    extends: Option<Extends>,
    compiler_options: Option<CompilerOptions>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

/// A project configuration with its `extends` chain merged in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TsConfig {
    /// Absolute path of the project file
    pub path: PathBuf,
    /// Merged options; `outDir`/`declarationDir` are absolute
    pub compiler_options: CompilerOptions,
    /// Absolute include patterns
    pub include: Option<Vec<String>>,
    /// Absolute exclude patterns
    pub exclude: Option<Vec<String>>,
}

impl TsConfig {
    /// Load `path`, following `extends`
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let path = paths::normalize(path);
        let mut chain = Vec::new();
        load_recursive(&path, &mut chain)
    }

    /// Declared output directory, or `<cwd>/dist`
    pub fn out_dir(&self, cwd: &Path) -> PathBuf {
        match &self.compiler_options.out_dir {
            Some(dir) => PathBuf::from(dir),
            None => cwd.join(DEFAULT_OUT_DIR),
        }
    }

    /// Require `module` and `moduleResolution` to both be `nodenext`.
    ///
    /// Both problems are reported together; nothing is corrected silently.
    pub fn check_module_resolution(&self) -> Result<(), ManifestError> {
        let options = &self.compiler_options;
        let describe = |value: &Option<String>| match value {
            Some(v) => format!("\"{}\"", v),
            None => "undefined".to_string(),
        };
        let is_nodenext =
            |value: &Option<String>| value.as_deref().is_some_and(|v| v.eq_ignore_ascii_case(NODENEXT));

        let mut problems = Vec::new();
        if !is_nodenext(&options.module) {
            problems.push(format!(
                "  - \"module\" must be \"nodenext\". Found: {}",
                describe(&options.module)
            ));
        }
        if !is_nodenext(&options.module_resolution) {
            problems.push(format!(
                "  - \"moduleResolution\" must be \"nodenext\". Found: {}",
                describe(&options.module_resolution)
            ));
        }

        if problems.is_empty() {
            return Ok(());
        }
        Err(ManifestError::configuration(
            self.path.display().to_string(),
            format!("invalid compiler options:\n{}", problems.join("\n")),
        ))
    }
}

fn load_recursive(path: &Path, chain: &mut Vec<PathBuf>) -> Result<TsConfig, ManifestError> {
    if chain.iter().any(|seen| seen == path) {
        return Err(ManifestError::configuration(
            "extends",
            format!("circular extends chain through {}", path.display()),
        ));
    }
    chain.push(path.to_path_buf());
    debug!("Reading project config {}", path.display());

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ManifestError::configuration(
                path.display().to_string(),
                "project configuration file not found",
            )
        } else {
            ManifestError::Io(e)
        }
    })?;
    let raw: RawTsConfig =
        serde_json::from_str(&strip_jsonc(&content)).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let base = path.parent().unwrap_or(Path::new("/")).to_path_buf();

    let parents = match raw.extends {
        None => Vec::new(),
        Some(Extends::One(spec)) => vec![spec],
        Some(Extends::Many(specs)) => specs,
    };

    let mut merged = TsConfig::default();
    for spec in parents {
        let parent_path = resolve_extends(&spec, &base)?;
        let parent = load_recursive(&parent_path, chain)?;
        merged = TsConfig {
            path: PathBuf::new(),
            compiler_options: parent.compiler_options.merged_over(merged.compiler_options),
            include: parent.include.or(merged.include),
            exclude: parent.exclude.or(merged.exclude),
        };
    }

    let absolute_patterns = |patterns: Vec<String>| -> Vec<String> {
        patterns
            .into_iter()
            .map(|p| paths::resolve(&base, &p).display().to_string())
            .collect()
    };

    chain.pop();
    Ok(TsConfig {
        path: path.to_path_buf(),
        compiler_options: raw
            .compiler_options
            .unwrap_or_default()
            .absolutize(&base)
            .merged_over(merged.compiler_options),
        include: raw.include.map(absolute_patterns).or(merged.include),
        exclude: raw.exclude.map(absolute_patterns).or(merged.exclude),
    })
}

/// Resolve an `extends` specifier: a relative/absolute file or a package in node_modules
fn resolve_extends(spec: &str, base: &Path) -> Result<PathBuf, ManifestError> {
    let with_json = |candidate: PathBuf| -> Option<PathBuf> {
        if candidate.is_dir() {
            let inner = candidate.join(TSCONFIG_FILE);
            return inner.is_file().then_some(inner);
        }
        if candidate.is_file() {
            return Some(candidate);
        }
        let mut with_ext = candidate.into_os_string();
        with_ext.push(".json");
        let with_ext = PathBuf::from(with_ext);
        with_ext.is_file().then_some(with_ext)
    };

    let found = if spec.starts_with('.') || Path::new(spec).is_absolute() {
        with_json(paths::resolve(base, spec))
    } else {
        base.ancestors()
            .find_map(|dir| with_json(dir.join("node_modules").join(spec)))
    };

    found.ok_or_else(|| {
        ManifestError::configuration(
            "extends",
            format!("cannot resolve \"{}\" from {}", spec, base.display()),
        )
    })
}

/// Remove `//` and `/* */` comments and trailing commas, leaving string contents intact
pub fn strip_jsonc(input: &str) -> String {
    let mut without_comments = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            without_comments.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        without_comments.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                without_comments.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        without_comments.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if next == '\n' {
                        without_comments.push('\n');
                    }
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => without_comments.push(c),
        }
    }

    strip_trailing_commas(&without_comments)
}

fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if !matches!(next, Some('}') | Some(']')) {
                out.push(c);
            }
        } else {
            out.push(c);
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = fs::write(&path, content);
        path
    }

    #[test]
    fn test_strip_jsonc() {
        let input = r#"{
  // line comment
  "a": "http://not-a-comment", /* block
  comment */ "b": [1, 2,],
  "c": "quote \" // still string",
}"#;
        let parsed: Result<Value, _> = serde_json::from_str(&strip_jsonc(input));
        let Ok(value) = parsed else {
            panic!("stripped input should be valid JSON");
        };
        assert_eq!(value["a"], "http://not-a-comment");
        assert_eq!(value["b"], serde_json::json!([1, 2]));
        assert_eq!(value["c"], "quote \" // still string");
    }

    #[test]
    fn test_extends_merges_and_absolutizes() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let root = temp_dir.path();
        write(
            root,
            "configs/base.json",
            r#"{ "compilerOptions": { "module": "NodeNext", "outDir": "../out", "strict": true } }"#,
        );
        let path = write(
            root,
            "pkg/tsconfig.json",
            r#"{
  "extends": "../configs/base",
  "compilerOptions": { "moduleResolution": "nodenext", "strict": false },
  "include": ["src"]
}"#,
        );

        let Ok(config) = TsConfig::load(&path) else {
            panic!("config should load");
        };
        let options = &config.compiler_options;
        assert_eq!(options.module.as_deref(), Some("NodeNext"));
        assert_eq!(options.module_resolution.as_deref(), Some("nodenext"));
        assert_eq!(options.other.get("strict"), Some(&Value::Bool(false)));
        assert_eq!(config.out_dir(&root.join("pkg")), root.join("out"));
        assert_eq!(
            config.include,
            Some(vec![root.join("pkg").join("src").display().to_string()])
        );
        assert!(config.check_module_resolution().is_ok());
    }

    #[test]
    fn test_extends_package_from_node_modules() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let root = temp_dir.path();
        write(
            root,
            "node_modules/@acme/tsconfig/tsconfig.json",
            r#"{ "compilerOptions": { "target": "es2022" } }"#,
        );
        let path = write(root, "tsconfig.json", r#"{ "extends": "@acme/tsconfig" }"#);

        let config = TsConfig::load(&path);
        assert!(config.is_ok_and(|c| c.compiler_options.target.as_deref() == Some("es2022")));
    }

    #[test]
    fn test_circular_extends() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let root = temp_dir.path();
        write(root, "a.json", r#"{ "extends": "./b.json" }"#);
        let path = write(root, "b.json", r#"{ "extends": "./a.json" }"#);

        let err = TsConfig::load(&path).err();
        assert!(matches!(err, Some(ManifestError::Configuration { ref field, .. }) if field == "extends"));
    }

    #[test]
    fn test_default_out_dir() {
        let config = TsConfig::default();
        assert_eq!(config.out_dir(Path::new("/pkg")), PathBuf::from("/pkg/dist"));
    }

    #[test]
    fn test_module_resolution_reports_both_problems() {
        let config = TsConfig {
            path: PathBuf::from("/pkg/tsconfig.json"),
            compiler_options: CompilerOptions {
                module: Some("esnext".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let Err(err) = config.check_module_resolution() else {
            panic!("esnext must be rejected");
        };
        let message = err.to_string();
        assert!(message.contains("/pkg/tsconfig.json"));
        assert!(message.contains("\"module\" must be \"nodenext\". Found: \"esnext\""));
        assert!(message.contains("\"moduleResolution\" must be \"nodenext\". Found: undefined"));
    }

    #[test]
    fn test_module_resolution_is_case_insensitive() {
        let config = TsConfig {
            compiler_options: CompilerOptions {
                module: Some("NodeNext".to_string()),
                module_resolution: Some("NODENEXT".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.check_module_resolution().is_ok());
    }
}
