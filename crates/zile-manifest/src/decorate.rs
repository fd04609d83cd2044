//! Rewriting manifest entry points to their published shape
//!
//! ```text
//! "main": "./src/index.ts"
//! ↓ ↓ ↓
//! "main": "./dist/index.js",
//! "exports": {
//!   ".": {
//!     "src": "./src/index.ts",
//!     "types": "./dist/index.d.ts",
//!     "default": "./dist/index.js"
//!   }
//! }
//! ```
//!
//! In link mode the manifest gets the same shape, but instead of relying on
//! compiler output the decoration also plans symlinks from each output path
//! back to its source. Creating those links is left to the caller.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::entries::{is_declaration_file, is_source_file};
use crate::errors::ManifestError;
use crate::paths;
use crate::types::{Bin, ExportEntry, Exports, PackageJson, BIN_SOURCE_SUFFIX, ROOT_EXPORT};
use crate::validation::require_entrypoints;

const JS_EXT: &str = ".js";
const DTS_EXT: &str = ".d.ts";

#[derive(Debug, Clone, Copy)]
pub struct DecorateOptions<'a> {
    /// Package directory
    pub cwd: &'a Path,
    /// Absolute output directory
    pub out_dir: &'a Path,
    /// Inferred source root, stripped from output paths
    pub source_dir: &'a Path,
    /// Development mode: plan symlinks, keep asset paths
    pub link: bool,
}

/// A symlink at `link` that should resolve to `target` (both absolute)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLink {
    pub link: PathBuf,
    pub target: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub package_json: PackageJson,
    /// Empty unless decorating in link mode
    pub links: Vec<PlannedLink>,
}

struct Decorator<'a> {
    options: DecorateOptions<'a>,
    links: Vec<PlannedLink>,
}

impl Decorator<'_> {
    fn absolute(&self, value: &str) -> PathBuf {
        paths::resolve(self.options.cwd, value)
    }

    fn is_built(&self, value: &str) -> bool {
        paths::is_within(&self.absolute(value), self.options.out_dir)
    }

    /// Output location of `name` with its extension replaced by `ext`
    fn out_path(&self, name: &str, ext: &str) -> PathBuf {
        let absolute = self.absolute(name);
        let relative = if paths::is_within(&absolute, self.options.source_dir) {
            absolute
                .strip_prefix(paths::normalize(self.options.source_dir))
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| paths::relative_to(&absolute, self.options.cwd))
        } else {
            paths::relative_to(&absolute, self.options.cwd)
        };

        let mut file = paths::strip_extension(&relative).into_os_string();
        file.push(ext);
        self.options.out_dir.join(file)
    }

    fn manifest_path(&self, path: &Path) -> String {
        paths::to_manifest_path(&paths::relative_to(path, self.options.cwd))
    }

    fn out_file(&self, name: &str, ext: &str) -> String {
        self.manifest_path(&self.out_path(name, ext))
    }

    /// Where the asset copier puts `value`
    fn asset_file(&self, value: &str) -> String {
        let relative = paths::relative_to(&self.absolute(value), self.options.cwd);
        self.manifest_path(&self.options.out_dir.join(relative))
    }

    fn plan_link(&mut self, source: &str, ext: &str) {
        let link = self.out_path(source, ext);
        if self.links.iter().any(|planned| planned.link == link) {
            return;
        }
        let target = self.absolute(source);
        self.links.push(PlannedLink { link, target });
    }

    fn compiles(&self, value: &str) -> bool {
        is_source_file(Path::new(value)) && !self.is_built(value)
    }

    fn decorate_bin(&mut self, package_json: &PackageJson) -> Result<Option<Value>, ManifestError> {
        let Some(bin) = package_json.bin()? else {
            return Ok(None);
        };
        let sources = bin.sources()?;

        let decorated = match &bin {
            Bin::Single(source) => {
                if !self.compiles(source) {
                    return Ok(Some(bin.to_value()));
                }
                let name = package_json.bin_name()?;
                Bin::Commands(vec![
                    (name.clone(), self.out_file(source, JS_EXT)),
                    (format!("{}{}", name, BIN_SOURCE_SUFFIX), source.clone()),
                ])
            }
            Bin::Commands(commands) => {
                let mut rewritten = Vec::with_capacity(commands.len() * 2);
                for entry in &sources {
                    let Some(name) = entry.command.as_deref() else {
                        continue;
                    };
                    let src_key = format!("{}{}", name, BIN_SOURCE_SUFFIX);
                    if self.compiles(&entry.source) {
                        rewritten.push((name.to_string(), self.out_file(&entry.source, JS_EXT)));
                        rewritten.push((src_key, entry.source.clone()));
                    } else {
                        rewritten.extend(
                            commands
                                .iter()
                                .filter(|(key, _)| key == name || *key == src_key)
                                .cloned(),
                        );
                    }
                }
                Bin::Commands(rewritten)
            }
        };

        if self.options.link {
            let linked: Vec<&str> = sources
                .iter()
                .map(|s| s.source.as_str())
                .filter(|source| self.compiles(source))
                .collect();
            for source in linked {
                self.plan_link(source, JS_EXT);
            }
        }

        Ok(Some(decorated.to_value()))
    }

    fn decorate_export(&mut self, entry: ExportEntry) -> ExportEntry {
        let source = entry.source().to_string();
        if self.is_built(&source) {
            return entry;
        }

        if !is_source_file(Path::new(&source)) {
            if self.options.link {
                return entry;
            }
            let default = self.asset_file(&source);
            if is_declaration_file(Path::new(&source)) {
                return match entry {
                    ExportEntry::Path(src) => ExportEntry::compiled(&src, default.clone(), default),
                    ExportEntry::Object(object) => ExportEntry::Object(
                        object.with("types", default.clone()).with("default", default),
                    ),
                };
            }
            return match entry {
                ExportEntry::Path(_) => ExportEntry::Path(default),
                ExportEntry::Object(object) => ExportEntry::Object(object.with("default", default)),
            };
        }

        if self.options.link {
            self.plan_link(&source, JS_EXT);
            self.plan_link(&source, DTS_EXT);
        }

        let types = self.out_file(&source, DTS_EXT);
        let default = self.out_file(&source, JS_EXT);
        match entry {
            ExportEntry::Path(src) => ExportEntry::compiled(&src, types, default),
            ExportEntry::Object(object) => {
                ExportEntry::Object(object.with("types", types).with("default", default))
            }
        }
    }

    fn decorate_exports(&mut self, package_json: &PackageJson) -> Result<Option<Exports>, ManifestError> {
        let exports = match package_json.exports()? {
            Some(exports) => exports,
            // A bare `main` becomes the root export
            None => match package_json.main() {
                Some(main) => Exports(vec![(
                    ROOT_EXPORT.to_string(),
                    ExportEntry::Path(main.to_string()),
                )]),
                None => return Ok(None),
            },
        };

        Ok(Some(Exports(
            exports
                .0
                .into_iter()
                .map(|(key, entry)| (key, self.decorate_export(entry)))
                .collect(),
        )))
    }
}

/// Copy the root export's build output into `main`, `module` and `types`.
///
/// Author-set values are overwritten so the top-level fields always agree
/// with the export map.
fn promote_root_export(package_json: &mut PackageJson, exports: &Exports) {
    let Some(root) = exports.get(ROOT_EXPORT) else {
        return;
    };
    let default = match root {
        ExportEntry::Path(path) => Some(path.as_str()),
        ExportEntry::Object(_) => root.field_str("default"),
    };
    let Some(default) = default.filter(|d| is_source_file(Path::new(d))) else {
        return;
    };

    package_json.set("main", default);
    package_json.set("module", default);
    if let Some(types) = root.field_str("types") {
        package_json.set("types", types);
    }
}

/// Produce the published form of `package_json`.
///
/// The input is left untouched; the result is a new manifest plus, in link
/// mode, the symlinks that make it resolvable without compiling.
pub fn decorate_package_json(
    package_json: &PackageJson,
    options: &DecorateOptions<'_>,
) -> Result<Decoration, ManifestError> {
    require_entrypoints(package_json)?;

    let mut decorator = Decorator {
        options: *options,
        links: Vec::new(),
    };
    let bin = decorator.decorate_bin(package_json)?;
    let exports = decorator.decorate_exports(package_json)?;

    let mut decorated = package_json.clone();
    decorated.set_default("type", "module");
    decorated.set_default("sideEffects", false);
    if let Some(bin) = bin {
        decorated.set("bin", bin);
    }
    if let Some(exports) = exports {
        promote_root_export(&mut decorated, &exports);
        decorated.set("exports", exports.to_value());
    }

    Ok(Decoration {
        package_json: decorated,
        links: decorator.links,
    })
}

/// Remove every top-level key up to and including `marker`.
///
/// Returns the manifest unchanged when the marker is absent.
pub fn strip_through_marker(package_json: &PackageJson, marker: &str) -> PackageJson {
    let fields = package_json.fields();
    let Some(position) = fields.keys().position(|key| key == marker) else {
        return package_json.clone();
    };
    let kept: Map<String, Value> = fields
        .iter()
        .skip(position + 1)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    PackageJson::from_map(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn package(value: Value) -> PackageJson {
        serde_json::from_value(value).unwrap_or_default()
    }

    fn decorate(pkg: &PackageJson, source_dir: &str, link: bool) -> Decoration {
        let cwd = Path::new("/pkg");
        let out_dir = cwd.join("dist");
        let source_dir = cwd.join(source_dir);
        let options = DecorateOptions {
            cwd,
            out_dir: &out_dir,
            source_dir: &source_dir,
            link,
        };
        match decorate_package_json(pkg, &options) {
            Ok(decoration) => decoration,
            Err(e) => panic!("decoration failed: {e}"),
        }
    }

    fn as_json(pkg: &PackageJson) -> Value {
        serde_json::to_value(pkg).unwrap_or_default()
    }

    #[test]
    fn test_main_becomes_root_export() {
        let pkg = package(json!({ "name": "x", "main": "./src/index.ts" }));
        let decorated = as_json(&decorate(&pkg, "src", false).package_json);

        assert_eq!(
            decorated["exports"]["."],
            json!({
                "src": "./src/index.ts",
                "types": "./dist/index.d.ts",
                "default": "./dist/index.js"
            })
        );
        assert_eq!(decorated["main"], "./dist/index.js");
        assert_eq!(decorated["module"], "./dist/index.js");
        assert_eq!(decorated["types"], "./dist/index.d.ts");
        assert_eq!(decorated["type"], "module");
        assert_eq!(decorated["sideEffects"], false);
    }

    #[test]
    fn test_root_level_main() {
        let pkg = package(json!({ "main": "./index.ts" }));
        let decorated = as_json(&decorate(&pkg, "", false).package_json);
        assert_eq!(
            decorated,
            json!({
                "main": "./dist/index.js",
                "type": "module",
                "sideEffects": false,
                "module": "./dist/index.js",
                "types": "./dist/index.d.ts",
                "exports": {
                    ".": {
                        "src": "./index.ts",
                        "types": "./dist/index.d.ts",
                        "default": "./dist/index.js"
                    }
                }
            })
        );
    }

    #[test]
    fn test_decoration_is_idempotent() {
        let pkg = package(json!({
            "name": "x",
            "exports": {
                ".": "./src/index.ts",
                "./utils": { "src": "./src/nested/utils.ts", "import": "./keep.js" },
                "./built": "./dist/built.js"
            }
        }));
        let once = decorate(&pkg, "src", false).package_json;
        let twice = decorate(&once, "src", false).package_json;
        assert_eq!(once, twice);

        let decorated = as_json(&once);
        assert_eq!(decorated["exports"]["./built"], "./dist/built.js");
        assert_eq!(
            decorated["exports"]["./utils"],
            json!({
                "src": "./src/nested/utils.ts",
                "import": "./keep.js",
                "types": "./dist/nested/utils.d.ts",
                "default": "./dist/nested/utils.js"
            })
        );
    }

    #[test]
    fn test_author_values_are_overwritten_by_root_export() {
        let pkg = package(json!({
            "main": "./lib/old.js",
            "types": "./lib/old.d.ts",
            "exports": { ".": "./src/index.ts" }
        }));
        let decorated = as_json(&decorate(&pkg, "src", false).package_json);
        assert_eq!(decorated["main"], "./dist/index.js");
        assert_eq!(decorated["types"], "./dist/index.d.ts");
    }

    #[test]
    fn test_sources_outside_root_keep_full_path() {
        let pkg = package(json!({
            "exports": { ".": "./src/index.ts", "./foo": "./foo.ts" }
        }));
        let decorated = as_json(&decorate(&pkg, "", false).package_json);
        assert_eq!(decorated["exports"]["."]["default"], "./dist/src/index.js");
        assert_eq!(decorated["exports"]["./foo"]["default"], "./dist/foo.js");
    }

    #[test]
    fn test_assets_rewritten_only_in_build_mode() {
        let pkg = package(json!({
            "exports": {
                ".": "./src/index.ts",
                "./styles.css": "./src/styles.css",
                "./data": { "src": "./data.json" }
            }
        }));

        let built = as_json(&decorate(&pkg, "src", false).package_json);
        assert_eq!(built["exports"]["./styles.css"], "./dist/src/styles.css");
        assert_eq!(
            built["exports"]["./data"],
            json!({ "src": "./data.json", "default": "./dist/data.json" })
        );

        let linked = as_json(&decorate(&pkg, "src", true).package_json);
        assert_eq!(linked["exports"]["./styles.css"], "./src/styles.css");
        assert_eq!(linked["exports"]["./data"], json!({ "src": "./data.json" }));
    }

    #[test]
    fn test_string_bin_becomes_command_map() {
        let pkg = package(json!({ "name": "@acme/tool", "bin": "./src/cli.ts" }));
        let decorated = as_json(&decorate(&pkg, "src", false).package_json);
        assert_eq!(
            decorated["bin"],
            json!({ "tool": "./dist/cli.js", "tool.src": "./src/cli.ts" })
        );
        assert!(decorated.get("exports").is_none());
    }

    #[test]
    fn test_bin_commands_are_idempotent() {
        let pkg = package(json!({
            "name": "tool",
            "bin": { "a": "./src/a.ts", "b": "./scripts/b.sh" }
        }));
        let once = decorate(&pkg, "src", false).package_json;
        assert_eq!(
            as_json(&once)["bin"],
            json!({ "a": "./dist/a.js", "a.src": "./src/a.ts", "b": "./scripts/b.sh" })
        );
        assert_eq!(decorate(&once, "src", false).package_json, once);
    }

    #[test]
    fn test_link_mode_plans_symlinks() {
        let pkg = package(json!({
            "name": "tool",
            "bin": "./src/cli.ts",
            "exports": { ".": "./src/index.ts", "./styles.css": "./src/styles.css" }
        }));
        let decoration = decorate(&pkg, "src", true);

        let links: Vec<(String, String)> = decoration
            .links
            .iter()
            .map(|l| (l.link.display().to_string(), l.target.display().to_string()))
            .collect();
        assert_eq!(
            links,
            vec![
                ("/pkg/dist/cli.js".to_string(), "/pkg/src/cli.ts".to_string()),
                ("/pkg/dist/index.js".to_string(), "/pkg/src/index.ts".to_string()),
                ("/pkg/dist/index.d.ts".to_string(), "/pkg/src/index.ts".to_string()),
            ]
        );
        assert!(decorate(&pkg, "src", false).links.is_empty());
    }

    #[test]
    fn test_declaration_exports_are_copied_not_compiled() {
        let pkg = package(json!({
            "exports": {
                ".": "./src/index.ts",
                "./globals": "./src/globals.d.ts",
                "./env": { "src": "./src/env.d.mts", "import": "./keep.js" }
            }
        }));

        let built = decorate(&pkg, "src", false);
        let decorated = as_json(&built.package_json);
        assert_eq!(
            decorated["exports"]["./globals"],
            json!({
                "src": "./src/globals.d.ts",
                "types": "./dist/src/globals.d.ts",
                "default": "./dist/src/globals.d.ts"
            })
        );
        assert_eq!(
            decorated["exports"]["./env"],
            json!({
                "src": "./src/env.d.mts",
                "import": "./keep.js",
                "types": "./dist/src/env.d.mts",
                "default": "./dist/src/env.d.mts"
            })
        );
        assert_eq!(decorate(&built.package_json, "src", false).package_json, built.package_json);

        let linked = decorate(&pkg, "src", true);
        let links: Vec<PathBuf> = linked.links.iter().map(|l| l.link.clone()).collect();
        assert_eq!(
            links,
            vec![PathBuf::from("/pkg/dist/index.js"), PathBuf::from("/pkg/dist/index.d.ts")]
        );
        assert_eq!(
            as_json(&linked.package_json)["exports"]["./globals"],
            "./src/globals.d.ts"
        );
    }

    #[test]
    fn test_object_export_without_src_fails() {
        let pkg = package(json!({ "exports": { ".": { "types": "./index.d.ts" } } }));
        let options = DecorateOptions {
            cwd: Path::new("/pkg"),
            out_dir: Path::new("/pkg/dist"),
            source_dir: Path::new("/pkg"),
            link: false,
        };
        assert!(matches!(
            decorate_package_json(&pkg, &options),
            Err(ManifestError::Configuration { .. })
        ));
    }

    #[test]
    fn test_empty_bin_fails() {
        let pkg = package(json!({ "name": "x", "bin": "" }));
        let options = DecorateOptions {
            cwd: Path::new("/pkg"),
            out_dir: Path::new("/pkg/dist"),
            source_dir: Path::new("/pkg"),
            link: false,
        };
        let err = decorate_package_json(&pkg, &options).err();
        assert!(err.is_some_and(|e| e.to_string().contains("`bin`")));
    }

    #[test]
    fn test_strip_through_marker() {
        let pkg = package(json!({
            "scripts": { "build": "zile" },
            "devDependencies": {},
            "[!start-pkg]": "",
            "name": "x",
            "version": "1.0.0"
        }));
        let stripped = strip_through_marker(&pkg, "[!start-pkg]");
        let keys: Vec<&String> = stripped.fields().keys().collect();
        assert_eq!(keys, ["name", "version"]);

        let untouched = package(json!({ "name": "x" }));
        assert_eq!(strip_through_marker(&untouched, "[!start-pkg]"), untouched);
    }
}
