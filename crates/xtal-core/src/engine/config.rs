use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_BOX_LENGTH: f64 = 3.0;
pub const DEFAULT_MAX_BOND_LENGTH: f64 = 1.99;
pub const DEFAULT_MAX_BOND_LENGTH_H: f64 = 1.3;
pub const DEFAULT_MAX_BOND_LENGTH_SP: f64 = 2.2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Distance thresholds for bond perception, in Angstroms.
///
/// Only obtainable through [`ConnectivityConfigBuilder`] or `Default`, so the
/// bucket edge always covers the longest threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectivityConfig {
    box_length: f64,
    max_bond_length: f64,
    max_bond_length_h: f64,
    max_bond_length_sp: f64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            box_length: DEFAULT_BOX_LENGTH,
            max_bond_length: DEFAULT_MAX_BOND_LENGTH,
            max_bond_length_h: DEFAULT_MAX_BOND_LENGTH_H,
            max_bond_length_sp: DEFAULT_MAX_BOND_LENGTH_SP,
        }
    }
}

impl ConnectivityConfig {
    /// Edge of a spatial-hash bucket; at least every bond threshold.
    pub fn box_length(&self) -> f64 {
        self.box_length
    }

    pub fn max_bond_length(&self) -> f64 {
        self.max_bond_length
    }

    /// Used when either atom is a hydrogen.
    pub fn max_bond_length_h(&self) -> f64 {
        self.max_bond_length_h
    }

    /// Relaxed limit when either atom is sulfur or phosphorus.
    pub fn max_bond_length_sp(&self) -> f64 {
        self.max_bond_length_sp
    }

    fn validate(self) -> Result<Self, ConfigError> {
        for (name, value) in [
            ("box_length", self.box_length),
            ("max_bond_length", self.max_bond_length),
            ("max_bond_length_h", self.max_bond_length_h),
            ("max_bond_length_sp", self.max_bond_length_sp),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    name,
                    reason: format!("{} is not a positive distance", value),
                });
            }
        }
        if self.max_bond_length_sp < self.max_bond_length {
            return Err(ConfigError::Invalid {
                name: "max_bond_length_sp",
                reason: format!(
                    "{} is shorter than max_bond_length ({})",
                    self.max_bond_length_sp, self.max_bond_length
                ),
            });
        }
        let longest = self
            .max_bond_length
            .max(self.max_bond_length_h)
            .max(self.max_bond_length_sp);
        if self.box_length < longest {
            return Err(ConfigError::Invalid {
                name: "box_length",
                reason: format!("{} is shorter than the longest bond threshold ({})", self.box_length, longest),
            });
        }
        Ok(self)
    }
}

#[derive(Default)]
pub struct ConnectivityConfigBuilder {
    box_length: Option<f64>,
    max_bond_length: Option<f64>,
    max_bond_length_h: Option<f64>,
    max_bond_length_sp: Option<f64>,
}

impl ConnectivityConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the standard thresholds so that callers only set what they change.
    pub fn with_defaults() -> Self {
        let defaults = ConnectivityConfig::default();
        Self {
            box_length: Some(defaults.box_length),
            max_bond_length: Some(defaults.max_bond_length),
            max_bond_length_h: Some(defaults.max_bond_length_h),
            max_bond_length_sp: Some(defaults.max_bond_length_sp),
        }
    }

    pub fn box_length(mut self, length: f64) -> Self {
        self.box_length = Some(length);
        self
    }
    pub fn max_bond_length(mut self, length: f64) -> Self {
        self.max_bond_length = Some(length);
        self
    }
    pub fn max_bond_length_h(mut self, length: f64) -> Self {
        self.max_bond_length_h = Some(length);
        self
    }
    pub fn max_bond_length_sp(mut self, length: f64) -> Self {
        self.max_bond_length_sp = Some(length);
        self
    }

    pub fn build(self) -> Result<ConnectivityConfig, ConfigError> {
        ConnectivityConfig {
            box_length: self.box_length.ok_or(ConfigError::MissingParameter("box_length"))?,
            max_bond_length: self
                .max_bond_length
                .ok_or(ConfigError::MissingParameter("max_bond_length"))?,
            max_bond_length_h: self
                .max_bond_length_h
                .ok_or(ConfigError::MissingParameter("max_bond_length_h"))?,
            max_bond_length_sp: self
                .max_bond_length_sp
                .ok_or(ConfigError::MissingParameter("max_bond_length_sp"))?,
        }
        .validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapConfig {
    /// Normalize DSN6 maps to zero mean and unit sigma after decoding.
    pub sigma_scale: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self { sigma_scale: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoadConfig {
    pub connectivity: ConnectivityConfig,
    pub map: MapConfig,
}

/// On-disk form of [`LoadConfig`]. Every key is optional.
///
/// ```toml
/// [connectivity]
/// box-length = 3.0
/// max-bond-length = 1.99
///
/// [map]
/// sigma-scale = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialLoadConfig {
    #[serde(default)]
    pub connectivity: PartialConnectivityConfig,
    #[serde(default)]
    pub map: PartialMapConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialConnectivityConfig {
    pub box_length: Option<f64>,
    pub max_bond_length: Option<f64>,
    pub max_bond_length_h: Option<f64>,
    pub max_bond_length_sp: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialMapConfig {
    pub sigma_scale: Option<bool>,
}

impl PartialLoadConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Fills unset keys with defaults and validates the result.
    pub fn resolve(self) -> Result<LoadConfig, ConfigError> {
        let mut builder = ConnectivityConfigBuilder::with_defaults();
        let c = self.connectivity;
        if let Some(v) = c.box_length {
            builder = builder.box_length(v);
        }
        if let Some(v) = c.max_bond_length {
            builder = builder.max_bond_length(v);
        }
        if let Some(v) = c.max_bond_length_h {
            builder = builder.max_bond_length_h(v);
        }
        if let Some(v) = c.max_bond_length_sp {
            builder = builder.max_bond_length_sp(v);
        }
        Ok(LoadConfig {
            connectivity: builder.build()?,
            map: MapConfig {
                sigma_scale: self.map.sigma_scale.unwrap_or(MapConfig::default().sigma_scale),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod builder {
        use super::*;

        #[test]
        fn defaults_match_standard_thresholds() {
            let config = ConnectivityConfigBuilder::with_defaults().build().unwrap();
            assert_eq!(config, ConnectivityConfig::default());
            assert_eq!(config.max_bond_length(), 1.99);
            assert_eq!(config.max_bond_length_h(), 1.3);
        }

        #[test]
        fn missing_parameter_is_reported_by_name() {
            let result = ConnectivityConfigBuilder::new()
                .box_length(3.0)
                .max_bond_length(1.9)
                .max_bond_length_h(1.2)
                .build();
            assert!(matches!(result, Err(ConfigError::MissingParameter("max_bond_length_sp"))));
        }

        #[test]
        fn inconsistent_thresholds_are_rejected() {
            let short_sp = ConnectivityConfigBuilder::with_defaults().max_bond_length_sp(1.5).build();
            assert!(matches!(short_sp, Err(ConfigError::Invalid { name: "max_bond_length_sp", .. })));

            let negative = ConnectivityConfigBuilder::with_defaults().max_bond_length_h(-1.0).build();
            assert!(matches!(negative, Err(ConfigError::Invalid { name: "max_bond_length_h", .. })));

            let small_box = ConnectivityConfigBuilder::with_defaults().box_length(2.0).build();
            assert!(matches!(small_box, Err(ConfigError::Invalid { name: "box_length", .. })));
        }
    }

    mod toml_file {
        use super::*;

        #[test]
        fn partial_file_overlays_defaults() {
            let partial = PartialLoadConfig::from_toml_str(
                "[connectivity]\nmax-bond-length = 2.0\n\n[map]\nsigma-scale = false\n",
            )
            .unwrap();
            let config = partial.resolve().unwrap();
            assert_eq!(config.connectivity.max_bond_length(), 2.0);
            assert_eq!(config.connectivity.box_length(), DEFAULT_BOX_LENGTH);
            assert!(!config.map.sigma_scale);
        }

        #[test]
        fn empty_file_resolves_to_defaults() {
            let config = PartialLoadConfig::from_toml_str("").unwrap().resolve().unwrap();
            assert_eq!(config, LoadConfig::default());
            assert!(config.map.sigma_scale);
        }

        #[test]
        fn unknown_keys_are_rejected() {
            let result = PartialLoadConfig::from_toml_str("[connectivity]\nbond-cutoff = 2.0\n");
            assert!(matches!(result, Err(ConfigError::Toml(_))));
        }

        #[test]
        fn reads_from_path() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("xtal.toml");
            std::fs::write(&path, "[map]\nsigma-scale = false\n").unwrap();
            let partial = PartialLoadConfig::from_path(&path).unwrap();
            assert_eq!(partial.map.sigma_scale, Some(false));
            assert!(matches!(
                PartialLoadConfig::from_path(&dir.path().join("missing.toml")),
                Err(ConfigError::Io(_))
            ));
        }
    }
}
