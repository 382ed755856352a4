//! Application Signals SLO API
//!
//! The [`SloApi`] trait is the seam between the resource adapter and the
//! remote service. [`rest`] implements it over the signed REST-JSON
//! transport in [`crate::aws`]; tests substitute in-memory doubles.
//!
//! # Module Structure
//!
//! - [`types`] - request and response shapes
//! - [`rest`] - `SloApi` for [`crate::aws::client::AwsClient`]

pub mod rest;
pub mod types;

use crate::error::ApiError;
use async_trait::async_trait;
use types::{
    CreateServiceLevelObjectiveInput, ListServiceLevelObjectivesOutput, ServiceLevelObjective,
    ServiceLevelObjectiveSummary, UpdateServiceLevelObjectiveInput,
};

/// Remote SLO operations.
///
/// Create, get and update return `Ok(None)` when the call succeeded but the
/// response carried no SLO. Not-found is reported as [`ApiError::NotFound`].
#[async_trait]
pub trait SloApi: Send + Sync {
    async fn create_service_level_objective(
        &self,
        input: &CreateServiceLevelObjectiveInput,
    ) -> Result<Option<ServiceLevelObjective>, ApiError>;

    /// `id` is the SLO name or ARN
    async fn get_service_level_objective(
        &self,
        id: &str,
    ) -> Result<Option<ServiceLevelObjective>, ApiError>;

    async fn update_service_level_objective(
        &self,
        input: &UpdateServiceLevelObjectiveInput,
    ) -> Result<Option<ServiceLevelObjective>, ApiError>;

    async fn delete_service_level_objective(&self, id: &str) -> Result<(), ApiError>;

    /// Fetch one page of summaries
    async fn list_service_level_objectives(
        &self,
        next_token: Option<&str>,
    ) -> Result<ListServiceLevelObjectivesOutput, ApiError>;
}

/// Look up an SLO by name.
///
/// A successful response without an SLO is treated as not found.
pub async fn find_service_level_objective_by_name(
    api: &dyn SloApi,
    name: &str,
) -> Result<ServiceLevelObjective, ApiError> {
    match api.get_service_level_objective(name).await? {
        Some(slo) => Ok(slo),
        None => Err(ApiError::NotFound {
            message: format!("empty result for service level objective {}", name),
        }),
    }
}

/// Fetch all SLO summaries (auto-paginate)
pub async fn list_all_service_level_objectives(
    api: &dyn SloApi,
) -> Result<Vec<ServiceLevelObjectiveSummary>, ApiError> {
    let mut all_items = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let page = api
            .list_service_level_objectives(next_token.as_deref())
            .await?;
        all_items.extend(page.slo_summaries);

        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }

    tracing::debug!("Listed {} service level objectives", all_items.len());
    Ok(all_items)
}
