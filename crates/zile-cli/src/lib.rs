//! zile: build TypeScript packages for publishing
//!
//! Library half of the CLI, exposed so the commands can be tested directly.

pub mod commands;
pub mod common;
pub mod errors;

pub use common::GlobalOpts;
pub use errors::CliError;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding a tracing filter for library diagnostics
pub const LOG_ENV: &str = "ZILE_LOG";

const TRACED_CRATES: &[&str] = &["zile", "zile_build", "zile_config", "zile_manifest"];

/// Install the tracing subscriber for library diagnostics.
///
/// `ZILE_LOG` (or `RUST_LOG`) wins; otherwise the zile crates log at the level `-v` selects.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let default = TRACED_CRATES
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",");
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| default.into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init();
}
