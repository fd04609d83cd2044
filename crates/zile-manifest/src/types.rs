//! Typed views over a package.json document
//!
//! The document itself is kept as an ordered JSON map so that unknown fields and
//! key order survive a read/decorate/write cycle. The entry-point fields are
//! parsed on demand into the tagged types below.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ManifestError;

/// Suffix marking the source twin of a `bin` command (`"zile.src"`)
pub const BIN_SOURCE_SUFFIX: &str = ".src";

/// Root subpath of the `exports` map
pub const ROOT_EXPORT: &str = ".";

/// Manifest field label used in error messages, e.g. `exports["./utils"]`
pub fn export_field(key: &str) -> String {
    format!("exports[\"{}\"]", key)
}

/// A parsed `package.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageJson {
    fields: Map<String, Value>,
}

impl PackageJson {
    pub fn from_map(fields: Map<String, Value>) -> Self {
        PackageJson { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Insert or replace a top-level field, keeping its position when it already exists
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// Set a field only when the author has not
    pub fn set_default(&mut self, key: &str, value: impl Into<Value>) {
        if self.get(key).is_none() {
            self.set(key, value);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    pub fn main(&self) -> Option<&str> {
        self.get_str("main")
    }

    pub fn module(&self) -> Option<&str> {
        self.get_str("module")
    }

    pub fn types(&self) -> Option<&str> {
        self.get_str("types")
    }

    /// A publishable manifest declares at least one of `exports`, `main`, `bin`
    pub fn has_entrypoints(&self) -> bool {
        ["exports", "main", "bin"]
            .iter()
            .any(|key| self.contains_key(key))
    }

    pub fn bin(&self) -> Result<Option<Bin>, ManifestError> {
        self.get("bin").map(Bin::from_value).transpose()
    }

    pub fn exports(&self) -> Result<Option<Exports>, ManifestError> {
        self.get("exports").map(Exports::from_value).transpose()
    }

    /// Command name used for a string-form `bin`: the package name without its scope
    ///
    /// npm installs a string `bin` under the same unscoped name.
    pub fn bin_name(&self) -> Result<String, ManifestError> {
        let name = self.name().map(str::trim).unwrap_or_default();
        let unscoped = name.rsplit('/').next().unwrap_or(name);
        if unscoped.is_empty() {
            return Err(ManifestError::configuration(
                "name",
                "a string `bin` requires the package to have a `name`",
            ));
        }
        Ok(unscoped.to_string())
    }
}

/// One `bin` source as declared in the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinSource {
    /// Manifest key the source was read from (`bin`, `bin.cli`, `bin.cli.src`)
    pub field: String,
    /// Command name, `None` for the string form
    pub command: Option<String>,
    /// Path as written in the manifest
    pub source: String,
}

/// The `bin` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bin {
    Single(String),
    Commands(Vec<(String, String)>),
}

impl Bin {
    pub fn from_value(value: &Value) -> Result<Self, ManifestError> {
        match value {
            Value::String(path) => Ok(Bin::Single(path.clone())),
            Value::Object(map) => map
                .iter()
                .map(|(command, path)| match path.as_str() {
                    Some(path) => Ok((command.clone(), path.to_string())),
                    None => Err(ManifestError::configuration(
                        format!("bin.{}", command),
                        "must be a string path",
                    )),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Bin::Commands),
            _ => Err(ManifestError::configuration(
                "bin",
                "must be a string or an object of command names to paths",
            )),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Bin::Single(path) => Value::String(path.clone()),
            Bin::Commands(commands) => Value::Object(
                commands
                    .iter()
                    .map(|(command, path)| (command.clone(), Value::String(path.clone())))
                    .collect(),
            ),
        }
    }

    fn lookup(commands: &[(String, String)], key: &str) -> Option<String> {
        commands
            .iter()
            .find(|(command, _)| command == key)
            .map(|(_, path)| path.clone())
    }

    /// Command names in declaration order, `<name>.src` twins folded into `<name>`
    pub fn command_names(commands: &[(String, String)]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for (key, _) in commands {
            let name = key.strip_suffix(BIN_SOURCE_SUFFIX).unwrap_or(key);
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Source path of every command.
    ///
    /// When a `<name>.src` twin exists it is the source and `<name>` is build
    /// output; otherwise `<name>` itself is the source.
    pub fn sources(&self) -> Result<Vec<BinSource>, ManifestError> {
        let sources = match self {
            Bin::Single(path) => vec![BinSource {
                field: "bin".to_string(),
                command: None,
                source: path.clone(),
            }],
            Bin::Commands(commands) => Self::command_names(commands)
                .into_iter()
                .filter_map(|name| {
                    let src_key = format!("{}{}", name, BIN_SOURCE_SUFFIX);
                    Self::lookup(commands, &src_key)
                        .map(|source| (format!("bin.{}", src_key), source))
                        .or_else(|| {
                            Self::lookup(commands, &name).map(|source| (format!("bin.{}", name), source))
                        })
                        .map(|(field, source)| BinSource {
                            field,
                            command: Some(name),
                            source,
                        })
                })
                .collect(),
        };

        if let Some(empty) = sources.iter().find(|s| s.source.trim().is_empty()) {
            return Err(ManifestError::configuration(
                empty.field.clone(),
                "must not be empty",
            ));
        }
        Ok(sources)
    }
}

/// Object-form export entry: `{ "src": "./src/utils.ts", ...extra }`
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectExport {
    src: String,
    fields: Map<String, Value>,
}

impl ObjectExport {
    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Copy of the entry with `key` set, keeping the position of existing keys
    pub fn with(&self, key: &str, value: impl Into<Value>) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(key.to_string(), value.into());
        ObjectExport {
            src: self.src.clone(),
            fields,
        }
    }
}

/// One value of the `exports` map
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEntry {
    Path(String),
    Object(ObjectExport),
}

impl ExportEntry {
    pub fn from_value(key: &str, value: &Value) -> Result<Self, ManifestError> {
        match value {
            Value::String(path) => Ok(ExportEntry::Path(path.clone())),
            Value::Object(map) => match map.get("src").and_then(Value::as_str) {
                Some(src) => Ok(ExportEntry::Object(ObjectExport {
                    src: src.to_string(),
                    fields: map.clone(),
                })),
                None => Err(ManifestError::configuration(
                    export_field(key),
                    "object entries must have a string `src` field",
                )),
            },
            _ => Err(ManifestError::configuration(
                export_field(key),
                "must be a path string or an object with a `src` field",
            )),
        }
    }

    /// `{ src, types, default }` for a compiled source
    pub fn compiled(src: &str, types: String, default: String) -> Self {
        let mut fields = Map::new();
        fields.insert("src".to_string(), Value::String(src.to_string()));
        fields.insert("types".to_string(), Value::String(types));
        fields.insert("default".to_string(), Value::String(default));
        ExportEntry::Object(ObjectExport {
            src: src.to_string(),
            fields,
        })
    }

    /// The path this entry is built from
    pub fn source(&self) -> &str {
        match self {
            ExportEntry::Path(path) => path,
            ExportEntry::Object(object) => object.src(),
        }
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        match self {
            ExportEntry::Path(_) => None,
            ExportEntry::Object(object) => object.fields.get(key).and_then(Value::as_str),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ExportEntry::Path(path) => Value::String(path.clone()),
            ExportEntry::Object(object) => Value::Object(object.fields.clone()),
        }
    }
}

/// The `exports` map in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exports(pub Vec<(String, ExportEntry)>);

impl Exports {
    pub fn from_value(value: &Value) -> Result<Self, ManifestError> {
        match value {
            // `"exports": "./index.ts"` is shorthand for the root subpath
            Value::String(_) => Ok(Exports(vec![(
                ROOT_EXPORT.to_string(),
                ExportEntry::from_value(ROOT_EXPORT, value)?,
            )])),
            Value::Object(map) => map
                .iter()
                .map(|(key, entry)| Ok((key.clone(), ExportEntry::from_value(key, entry)?)))
                .collect::<Result<Vec<_>, ManifestError>>()
                .map(Exports),
            _ => Err(ManifestError::configuration(
                "exports",
                "must be a path string or an object of subpaths",
            )),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ExportEntry> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, entry)| entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ExportEntry)> {
        self.0.iter()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(key, entry)| (key.clone(), entry.to_value()))
                .collect(),
        )
    }
}
