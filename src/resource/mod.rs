//! Resource binding layer
//!
//! Declarative schema plus the lifecycle of the
//! `aws_applicationsignals_service_level_objective` resource.
//!
//! # Architecture
//!
//! - [`schema`] - schema as data, and validation of configuration documents
//! - [`model`] - typed configuration/state model
//! - [`expand`] / [`flatten`] - mapping to and from the API shapes
//! - [`diff`] - which configurable attributes changed
//! - [`slo`] - Create / Read / Update / Delete / Import
//! - [`sweep`] - bulk delete by name prefix
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use slo_binding::aws::client::AwsClient;
//! use slo_binding::resource::{ServiceLevelObjectiveResource, ReadOutcome};
//!
//! async fn refresh(client: AwsClient, state: &ServiceLevelObjectiveModel) -> anyhow::Result<()> {
//!     let resource = ServiceLevelObjectiveResource::new(Arc::new(client));
//!     match resource.read(state).await? {
//!         ReadOutcome::Found(model) => println!("{}", model.name),
//!         ReadOutcome::Removed(diag) => eprintln!("{}", diag),
//!     }
//!     Ok(())
//! }
//! ```

pub mod diag;
pub mod diff;
pub mod expand;
pub mod flatten;
pub mod model;
pub mod schema;
pub mod slo;
pub mod sweep;

pub use diag::{has_errors, Diagnostic, Severity};
pub use model::ServiceLevelObjectiveModel;
pub use schema::{service_level_objective_schema, Schema};
pub use slo::{ReadOutcome, ServiceLevelObjectiveResource, RESOURCE_TYPE};
pub use sweep::{sweep, SweepReport};
