//! Declarative resource binding for Application Signals service level
//! objectives.
//!
//! - [`resource`] - schema, model, mapping and the CRUD + Import lifecycle
//! - [`api`] - the remote operations behind the [`api::SloApi`] seam
//! - [`aws`] - credentials, SigV4 signing and the HTTP transport
//! - [`state`] / [`config`] - local files used by the `slo` binary

pub mod api;
pub mod aws;
pub mod config;
pub mod error;
pub mod resource;
pub mod state;

pub use error::{Action, ApiError, ConfigError, MappingError, ResourceError};
