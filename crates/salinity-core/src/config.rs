// crates/salinity-core/src/config.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Duration;
use salinity_parser::SourceSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::comparison::ComparisonConfig;
use crate::quality::QualityConfig;

/// Environment variable naming a config file when `--config` is not given.
pub const CONFIG_ENV_VAR: &str = "SALINITY_CONFIG";

pub const LOGGER_SOURCE: &str = "logger";
pub const SPREADSHEET_SOURCE: &str = "spreadsheet";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Validation(String),

    #[error("invalid source '{name}': {message}")]
    Source { name: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    /// Pressure used when a source has no pressure column, or a row's
    /// pressure cell is blank.
    pub pressure_dbar: f64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self { pressure_dbar: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlignmentConfig {
    pub tolerance_minutes: i64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            tolerance_minutes: 10,
        }
    }
}

impl AlignmentConfig {
    /// Tolerance as a duration, saturating at the largest representable
    /// span. `validate` rejects values that would saturate.
    pub fn tolerance(&self) -> Duration {
        Duration::try_minutes(self.tolerance_minutes).unwrap_or(Duration::MAX)
    }
}

/// Everything a pipeline run needs besides its input tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub conversion: ConversionConfig,
    pub alignment: AlignmentConfig,
    pub comparison: ComparisonConfig,
    pub quality: QualityConfig,
    /// Named source layouts. The built-in `logger` and `spreadsheet` layouts
    /// are always present unless a document overrides them by name.
    pub sources: BTreeMap<String, SourceSchema>,
}

pub fn default_sources() -> BTreeMap<String, SourceSchema> {
    BTreeMap::from([
        (LOGGER_SOURCE.to_string(), SourceSchema::logger_export()),
        (
            SPREADSHEET_SOURCE.to_string(),
            SourceSchema::spreadsheet_export(),
        ),
    ])
}

impl AnalysisConfig {
    /// Built-in defaults, including the default source layouts.
    pub fn with_defaults() -> Self {
        Self {
            sources: default_sources(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: AnalysisConfig = toml::from_str(text)?;
        for (name, schema) in default_sources() {
            config.sources.entry(name).or_insert(schema);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), sources = config.sources.len(), "loaded config");
        Ok(config)
    }

    /// Loads the file named by `path`, else by `SALINITY_CONFIG` (a `.env`
    /// file is honoured), else returns the built-in defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        dotenvy::dotenv().ok();
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::load(PathBuf::from(path)),
            _ => {
                debug!("no config file given, using defaults");
                Ok(Self::with_defaults())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let tolerance_minutes = self.alignment.tolerance_minutes;
        if tolerance_minutes < 0 {
            return Err(ConfigError::Validation(format!(
                "alignment.tolerance_minutes must be >= 0, got {tolerance_minutes}"
            )));
        }
        if Duration::try_minutes(tolerance_minutes).is_none() {
            return Err(ConfigError::Validation(format!(
                "alignment.tolerance_minutes is too large to represent, got {tolerance_minutes}"
            )));
        }
        let alpha = self.comparison.significance_level;
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ConfigError::Validation(format!(
                "comparison.significance_level must lie in (0, 1), got {alpha}"
            )));
        }
        if self.comparison.min_sample_size < 1 {
            return Err(ConfigError::Validation(
                "comparison.min_sample_size must be at least 1".to_string(),
            ));
        }
        let multiplier = self.quality.outlier_multiplier;
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(ConfigError::Validation(format!(
                "quality.outlier_multiplier must be positive, got {multiplier}"
            )));
        }
        if !self.conversion.pressure_dbar.is_finite() {
            return Err(ConfigError::Validation(
                "conversion.pressure_dbar must be finite".to_string(),
            ));
        }
        for (name, schema) in &self.sources {
            schema.validate().map_err(|message| ConfigError::Source {
                name: name.clone(),
                message,
            })?;
        }
        Ok(())
    }

    pub fn source(&self, name: &str) -> Option<&SourceSchema> {
        self.sources.get(name)
    }

    /// Source layouts in name order, for auto-detection.
    pub fn source_candidates(&self) -> impl Iterator<Item = (&str, &SourceSchema)> {
        self.sources
            .iter()
            .map(|(name, schema)| (name.as_str(), schema))
    }
}
