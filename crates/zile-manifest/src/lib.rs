//! Zile Manifest Handling
//!
//! This crate owns everything zile knows about a package's `package.json`:
//! reading it (through a per-session cache that keeps the raw text), finding
//! the files it declares, inferring the source root, rewriting entry points to
//! their published shape and writing the result back in the original format.
//!
//! The TypeScript project configuration is loaded here as well, since both the
//! decorator and the compiler need its output directory.

pub mod cache;
pub mod decorate;
pub mod entries;
pub mod errors;
pub mod manifest;
pub mod manifest_writer;
pub mod paths;
pub mod source_root;
pub mod tsconfig;
pub mod types;
pub mod validation;

pub use cache::ManifestCache;
pub use decorate::{decorate_package_json, strip_through_marker, DecorateOptions, Decoration, PlannedLink};
pub use entries::{is_source_file, resolve_entries, Entries};
pub use errors::ManifestError;
pub use source_root::infer_source_root;
pub use tsconfig::{CompilerOptions, TsConfig, DEFAULT_OUT_DIR, TSCONFIG_FILE};
pub use types::{Bin, BinSource, ExportEntry, Exports, ObjectExport, PackageJson};
pub use validation::check_package_json;

// Reader/writer entry points
pub use manifest::{read_package_json, read_tsconfig, PACKAGE_JSON};
pub use manifest_writer::{render_package_json, write_package_json};
