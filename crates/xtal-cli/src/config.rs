use crate::error::{CliError, Result};
use std::path::Path;
use tracing::debug;
use xtal::engine::config::{LoadConfig, PartialLoadConfig};

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides {
    pub box_length: Option<f64>,
    pub max_bond_length: Option<f64>,
    pub no_sigma_scale: bool,
}

impl Overrides {
    fn merge_into(self, partial: &mut PartialLoadConfig) {
        if let Some(v) = self.box_length {
            partial.connectivity.box_length = Some(v);
        }
        if let Some(v) = self.max_bond_length {
            partial.connectivity.max_bond_length = Some(v);
        }
        if self.no_sigma_scale {
            partial.map.sigma_scale = Some(false);
        }
    }
}

/// Reads the optional TOML file, applies overrides and validates the result.
pub fn build_load_config(config_path: Option<&Path>, overrides: Overrides) -> Result<LoadConfig> {
    let mut partial = match config_path {
        Some(path) => {
            debug!("Reading configuration from {}", path.display());
            PartialLoadConfig::from_path(path).map_err(|e| CliError::FileParsing {
                path: path.to_path_buf(),
                source: e.into(),
            })?
        }
        None => PartialLoadConfig::default(),
    };
    overrides.merge_into(&mut partial);
    let config = partial.resolve().map_err(|e| CliError::Config(e.to_string()))?;
    debug!("Resolved configuration: {:?}", config);
    Ok(config)
}
