//! Local state
//!
//! One pretty-printed JSON file per service level objective, named after it,
//! under the state directory.

use crate::error::ConfigError;
use crate::resource::{ServiceLevelObjectiveModel, RESOURCE_TYPE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const STATE_VERSION: u32 = 0;

/// On-disk envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub attributes: ServiceLevelObjectiveModel,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<config_dir>/slo-binding/state`
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("slo-binding").join("state"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> Result<PathBuf, ConfigError> {
        validate_state_name(name)?;
        Ok(self.dir.join(format!("{}.json", name)))
    }

    /// `Ok(None)` when nothing is stored under `name`
    pub fn load(&self, name: &str) -> Result<Option<ServiceLevelObjectiveModel>, ConfigError> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let file: StateFile = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        if file.resource_type != RESOURCE_TYPE {
            return Err(ConfigError::Parse {
                path,
                message: format!("unexpected resource type {:?}", file.resource_type),
            });
        }
        Ok(Some(file.attributes))
    }

    pub fn save(&self, model: &ServiceLevelObjectiveModel) -> Result<PathBuf, ConfigError> {
        let path = self.path_for(&model.name)?;
        std::fs::create_dir_all(&self.dir).map_err(|source| ConfigError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let file = StateFile {
            version: STATE_VERSION,
            resource_type: RESOURCE_TYPE.to_string(),
            attributes: model.clone(),
        };
        let content = serde_json::to_string_pretty(&file).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::debug!("Saved state to {:?}", path);
        Ok(path)
    }

    /// Returns whether a file was removed
    pub fn remove(&self, name: &str) -> Result<bool, ConfigError> {
        let path = self.path_for(name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }
}

/// Reject names that would escape the state directory
fn validate_state_name(name: &str) -> Result<(), ConfigError> {
    let valid = !name.is_empty()
        && name.len() <= 255
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidName(name.to_string()))
    }
}
