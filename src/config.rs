//! Configuration Management
//!
//! Persistent CLI configuration, and loading of resource configuration
//! documents.

use crate::aws::auth::validate_region;
use crate::error::ConfigError;
use crate::resource::{has_errors, service_level_objective_schema, ServiceLevelObjectiveModel};
use crate::state::StateStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Region used when no flag is given
    #[serde(default)]
    pub region: Option<String>,
    /// Endpoint override, e.g. a local emulator
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Where state files live
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("slo-binding").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// A missing or unreadable file yields the defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get the explicitly chosen region (CLI > config).
    ///
    /// `None` leaves the choice to the AWS provider chain.
    pub fn explicit_region(&self, cli: Option<&str>) -> Result<Option<String>, ConfigError> {
        match cli.map(str::to_string).or_else(|| self.region.clone()) {
            Some(region) if !validate_region(&region) => Err(ConfigError::InvalidRegion(region)),
            region => Ok(region),
        }
    }

    /// Get effective endpoint override (CLI > config)
    pub fn effective_endpoint(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string).or_else(|| self.endpoint.clone())
    }

    /// Get effective state store (CLI > config > user config dir > cwd)
    pub fn state_store(&self, cli: Option<&Path>) -> StateStore {
        let dir = cli
            .map(Path::to_path_buf)
            .or_else(|| self.state_dir.clone())
            .or_else(StateStore::default_dir)
            .unwrap_or_else(|| PathBuf::from(".slo-state"));
        StateStore::new(dir)
    }
}

// =============================================================================
// Resource configuration documents
// =============================================================================

/// Read a YAML or JSON document
pub fn read_document(path: &Path) -> Result<Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    // YAML is a superset of JSON
    serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Validate a document against the schema, then build the model
pub fn parse_model(
    path: &Path,
    document: &Value,
) -> Result<ServiceLevelObjectiveModel, ConfigError> {
    let diags = service_level_objective_schema().validate(document);
    if has_errors(&diags) {
        return Err(ConfigError::Validation(diags));
    }
    for warning in &diags {
        tracing::warn!("{}", warning);
    }

    serde_json::from_value(document.clone()).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// [`read_document`] then [`parse_model`]
pub fn load_model(path: &Path) -> Result<ServiceLevelObjectiveModel, ConfigError> {
    let document = read_document(path)?;
    parse_model(path, &document)
}
