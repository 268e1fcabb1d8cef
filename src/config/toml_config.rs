use crate::adapters::csv_source::CsvReferenceSource;
use crate::core::engine::EngineSettings;
use crate::utils::error::{PortageError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub engine: EngineSettings,
    pub reference: ReferenceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// CSV export of the transport-rate table.
    pub path: String,
    pub source_id: String,
    /// Zero-based column holding the commune codes.
    pub column: usize,
    pub delimiter: Option<char>,
    pub preload_on_startup: bool,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            path: "data/taux_transport.csv".to_string(),
            source_id: "tauxTransport".to_string(),
            column: 0,
            delimiter: None,
            preload_on_startup: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub json: bool,
}

impl SimulatorConfig {
    /// Loads and parses a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PortageError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PortageError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left untouched.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PortageError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn reference_source(&self) -> Result<CsvReferenceSource> {
        let source = CsvReferenceSource::new(
            self.reference.source_id.clone(),
            &self.reference.path,
            self.reference.column,
        );
        match self.reference.delimiter {
            None => Ok(source),
            Some(c) if c.is_ascii() => Ok(source.with_delimiter(c as u8)),
            Some(c) => Err(PortageError::InvalidConfigValueError {
                field: "reference.delimiter".to_string(),
                value: c.to_string(),
                reason: "Delimiter must be a single ASCII character".to_string(),
            }),
        }
    }
}

impl Validate for SimulatorConfig {
    fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        validate_path("reference.path", &self.reference.path)?;
        validate_non_empty_string("reference.source_id", &self.reference.source_id)?;
        self.reference_source()?;
        Ok(())
    }
}
