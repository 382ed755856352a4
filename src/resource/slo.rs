//! Service level objective resource
//!
//! The Create / Read / Update / Delete / Import lifecycle. Each method makes
//! at most one remote call and returns the state to persist; nothing is
//! written on an error path.

use super::diag::Diagnostic;
use super::diff::diff;
use super::expand::{expand_create_input, expand_update_input};
use super::flatten::flatten_service_level_objective;
use super::model::ServiceLevelObjectiveModel;
use super::schema::{service_level_objective_schema, Schema};
use crate::api::{find_service_level_objective_by_name, SloApi};
use crate::error::{Action, ApiError, ResourceError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

pub const RESOURCE_TYPE: &str = "aws_applicationsignals_service_level_objective";

/// Result of a refresh
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Found(ServiceLevelObjectiveModel),
    /// Deleted out of band; drop it from state
    Removed(Diagnostic),
}

pub struct ServiceLevelObjectiveResource {
    api: Arc<dyn SloApi>,
    schema: Schema,
}

impl ServiceLevelObjectiveResource {
    pub fn new(api: Arc<dyn SloApi>) -> Self {
        Self {
            api,
            schema: service_level_objective_schema(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        RESOURCE_TYPE
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn api(&self) -> &dyn SloApi {
        self.api.as_ref()
    }

    pub async fn create(
        &self,
        plan: &ServiceLevelObjectiveModel,
    ) -> Result<ServiceLevelObjectiveModel, ResourceError> {
        self.create_inner(plan)
            .instrument(invocation_span(Action::Creating, &plan.name))
            .await
    }

    pub async fn read(
        &self,
        state: &ServiceLevelObjectiveModel,
    ) -> Result<ReadOutcome, ResourceError> {
        self.read_inner(state)
            .instrument(invocation_span(Action::Reading, &state.name))
            .await
    }

    pub async fn update(
        &self,
        plan: &ServiceLevelObjectiveModel,
        state: &ServiceLevelObjectiveModel,
    ) -> Result<ServiceLevelObjectiveModel, ResourceError> {
        self.update_inner(plan, state)
            .instrument(invocation_span(Action::Updating, &state.name))
            .await
    }

    /// Already gone counts as deleted
    pub async fn delete(&self, state: &ServiceLevelObjectiveModel) -> Result<(), ResourceError> {
        self.delete_inner(state)
            .instrument(invocation_span(Action::Deleting, &state.name))
            .await
    }

    async fn create_inner(
        &self,
        plan: &ServiceLevelObjectiveModel,
    ) -> Result<ServiceLevelObjectiveModel, ResourceError> {
        let action = Action::Creating;
        let name = plan.name.as_str();

        let input = expand_create_input(plan).map_err(|source| ResourceError::Mapping {
            action,
            name: name.to_string(),
            source,
        })?;
        let after = deadline(action, name, plan.timeouts().create())?;

        let output = with_deadline(
            action,
            name,
            after,
            self.api.create_service_level_objective(&input),
        )
        .await?
        .ok_or_else(|| ResourceError::EmptyOutput {
            action,
            name: name.to_string(),
        })?;

        let state = flatten(action, name, &output, plan)?;
        info!(arn = ?state.arn, "created service level objective");
        Ok(state)
    }

    async fn read_inner(
        &self,
        state: &ServiceLevelObjectiveModel,
    ) -> Result<ReadOutcome, ResourceError> {
        let action = Action::Reading;
        let name = state.name.as_str();

        match find_service_level_objective_by_name(self.api.as_ref(), name).await {
            Ok(output) => Ok(ReadOutcome::Found(flatten(action, name, &output, state)?)),
            Err(source) if source.is_not_found() => {
                warn!("service level objective not found, removing from state");
                Ok(ReadOutcome::Removed(
                    Diagnostic::warning(
                        "Resource not found",
                        format!(
                            "service level objective {} was not found, removing from state",
                            name
                        ),
                    )
                    .with_path("name"),
                ))
            }
            Err(source) => Err(ResourceError::Api {
                action,
                name: name.to_string(),
                source,
            }),
        }
    }

    async fn update_inner(
        &self,
        plan: &ServiceLevelObjectiveModel,
        state: &ServiceLevelObjectiveModel,
    ) -> Result<ServiceLevelObjectiveModel, ResourceError> {
        let action = Action::Updating;
        let name = state.name.as_str();

        let changes = diff(&self.schema, plan, state);
        if !changes.has_changes() {
            info!("no changes, skipping remote update");
            return Ok(plan.clone().with_computed_from(state));
        }
        if changes.requires_replace() {
            return Err(ResourceError::Invalid {
                action,
                name: name.to_string(),
                message: format!(
                    "name cannot change in place (planned {:?}); delete and recreate",
                    plan.name
                ),
            });
        }
        info!(changed = ?changes.paths(), "updating service level objective");

        let input = expand_update_input(plan).map_err(|source| ResourceError::Mapping {
            action,
            name: name.to_string(),
            source,
        })?;
        let after = deadline(action, name, plan.timeouts().update())?;

        let output = with_deadline(
            action,
            name,
            after,
            self.api.update_service_level_objective(&input),
        )
        .await?
        .ok_or_else(|| ResourceError::EmptyOutput {
            action,
            name: name.to_string(),
        })?;

        flatten(action, name, &output, plan)
    }

    async fn delete_inner(&self, state: &ServiceLevelObjectiveModel) -> Result<(), ResourceError> {
        let action = Action::Deleting;
        let name = state.name.as_str();

        let after = deadline(action, name, state.timeouts().delete())?;
        match with_deadline(
            action,
            name,
            after,
            self.api.delete_service_level_objective(name),
        )
        .await
        {
            Ok(()) => {
                info!("deleted service level objective");
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                info!("service level objective already deleted");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Seed state from an import identifier; a read fills in the rest
    pub fn import_state(&self, id: &str) -> Result<ServiceLevelObjectiveModel, ResourceError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ResourceError::Invalid {
                action: Action::Importing,
                name: String::new(),
                message: "import identifier must be the service level objective name".to_string(),
            });
        }
        info!(slo = id, "importing service level objective");
        Ok(ServiceLevelObjectiveModel::new(id))
    }
}

fn invocation_span(action: Action, name: &str) -> tracing::Span {
    info_span!(
        "service_level_objective",
        %action,
        slo = %name,
        invocation = %Uuid::new_v4()
    )
}

fn deadline(
    action: Action,
    name: &str,
    timeout: Result<Duration, crate::error::ConfigError>,
) -> Result<Duration, ResourceError> {
    timeout.map_err(|e| ResourceError::Invalid {
        action,
        name: name.to_string(),
        message: format!("timeouts: {}", e),
    })
}

async fn with_deadline<T>(
    action: Action,
    name: &str,
    after: Duration,
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ResourceError> {
    match tokio::time::timeout(after, call).await {
        Ok(result) => result.map_err(|source| ResourceError::Api {
            action,
            name: name.to_string(),
            source,
        }),
        Err(_) => Err(ResourceError::Timeout {
            action,
            name: name.to_string(),
            after,
        }),
    }
}

fn flatten(
    action: Action,
    name: &str,
    output: &crate::api::types::ServiceLevelObjective,
    prior: &ServiceLevelObjectiveModel,
) -> Result<ServiceLevelObjectiveModel, ResourceError> {
    flatten_service_level_objective(output, prior).map_err(|source| ResourceError::Mapping {
        action,
        name: name.to_string(),
        source,
    })
}
