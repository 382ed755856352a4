//! Error types
//!
//! Typed errors for the remote API, the model mapping layer, the resource
//! lifecycle and local configuration handling.

use crate::resource::diag::Diagnostic;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by the remote SLO API
#[derive(Error, Debug)]
pub enum ApiError {
    /// The remote system reports the object does not exist
    #[error("resource not found: {message}")]
    NotFound { message: String },
    #[error("{code} (status {status}): {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("decoding response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid request: {0}")]
    Request(String),
    #[error("credentials: {0}")]
    Credentials(String),
    #[error("signing request: {0}")]
    Signing(String),
}

impl ApiError {
    /// Whether this is the distinguished not-found class
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

/// Errors raised while converting between model and API shapes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    #[error("{path}: expected exactly one of [{expected}], found none")]
    MissingVariant {
        path: String,
        expected: &'static str,
    },
    #[error("{path}: expected exactly one of [{expected}], found several")]
    ConflictingVariants {
        path: String,
        expected: &'static str,
    },
    #[error("{path}: invalid RFC 3339 timestamp {value:?}")]
    InvalidTimestamp { path: String, value: String },
    #[error("{path}: missing required value")]
    MissingValue { path: String },
}

/// Lifecycle verb, used to annotate errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Creating,
    Reading,
    Updating,
    Deleting,
    Importing,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Action::Creating => "creating",
            Action::Reading => "reading",
            Action::Updating => "updating",
            Action::Deleting => "deleting",
            Action::Importing => "importing",
        };
        f.write_str(verb)
    }
}

/// Errors surfaced by the resource lifecycle methods
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("{action} service level objective ({name}): {source}")]
    Api {
        action: Action,
        name: String,
        #[source]
        source: ApiError,
    },
    /// The remote call succeeded but returned no object
    #[error("{action} service level objective ({name}): empty output")]
    EmptyOutput { action: Action, name: String },
    #[error("{action} service level objective ({name}): {source}")]
    Mapping {
        action: Action,
        name: String,
        #[source]
        source: MappingError,
    },
    #[error("{action} service level objective ({name}): timed out after {after:?}")]
    Timeout {
        action: Action,
        name: String,
        after: Duration,
    },
    #[error("{action} service level objective ({name}): {message}")]
    Invalid {
        action: Action,
        name: String,
        message: String,
    },
}

impl ResourceError {
    pub fn action(&self) -> Action {
        match self {
            ResourceError::Api { action, .. }
            | ResourceError::EmptyOutput { action, .. }
            | ResourceError::Mapping { action, .. }
            | ResourceError::Timeout { action, .. }
            | ResourceError::Invalid { action, .. } => *action,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ResourceError::Api { source, .. } if source.is_not_found())
    }
}

/// Errors from configuration files, state files and credentials
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("configuration is invalid:\n{}", format_diagnostics(.0))]
    Validation(Vec<Diagnostic>),
    #[error("invalid duration {0:?}")]
    Duration(String),
    #[error("invalid resource name {0:?}")]
    InvalidName(String),
    #[error("invalid region {0:?}")]
    InvalidRegion(String),
    #[error("credentials: {0}")]
    Credentials(String),
}

fn format_diagnostics(diags: &[Diagnostic]) -> String {
    diags
        .iter()
        .map(|d| format!("  {}", d))
        .collect::<Vec<_>>()
        .join("\n")
}
