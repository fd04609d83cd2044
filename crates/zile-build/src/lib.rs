//! Zile Build
//!
//! Turns a source-oriented package into a publishable one: runs the
//! TypeScript compiler against a derived project configuration, copies
//! assets, and rewrites package.json to point at the output. In link mode the
//! compiler is skipped and output paths are symlinked to the sources instead.

pub mod checks;
pub mod compiler;
pub mod errors;
pub mod link;
pub mod output;
pub mod pipeline;
pub mod process;

pub use checks::{check_output, CheckReport};
pub use compiler::{ProcessTranspiler, Transpiler};
pub use errors::BuildError;
pub use link::LinkOutcome;
pub use pipeline::{build, BuildOptions, BuildOutput, BuildSession};
pub use process::CapturedOutput;
