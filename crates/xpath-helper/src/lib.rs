pub mod app;
pub mod domain;
pub mod infra;
pub mod ui;

use anyhow::Result;

use crate::infra::config::Config;

/// Load the layered configuration and install logging from it.
pub fn init() -> Result<Config> {
    let config = Config::load()?;
    infra::logging::init(&config.logging);
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}
