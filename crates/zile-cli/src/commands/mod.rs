pub mod build;
pub mod check;
pub mod publish;

use zile_config::Config;

use crate::errors::CliError;

/// Load `zile.toml`, falling back to defaults when it does not exist
pub(crate) fn load_config() -> Result<Config, CliError> {
    let config = Config::load()?;
    if let Some(path) = Config::path() {
        zile_logger::step(&format!("Configuration: {}", path.display()));
    }
    Ok(config)
}
