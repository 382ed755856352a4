//! Bulk deletion of service level objectives by name prefix

use super::model::ServiceLevelObjectiveModel;
use super::slo::ServiceLevelObjectiveResource;
use crate::api::list_all_service_level_objectives;
use crate::error::ApiError;
use futures::stream::{self, StreamExt};

/// Deletes in flight at once
pub const SWEEP_CONCURRENCY: usize = 4;

#[derive(Debug, Default)]
pub struct SweepReport {
    pub deleted: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl SweepReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delete every SLO whose name starts with `prefix`.
///
/// Failures are collected per name rather than stopping the sweep.
pub async fn sweep(
    resource: &ServiceLevelObjectiveResource,
    prefix: &str,
) -> Result<SweepReport, ApiError> {
    let names: Vec<String> = list_all_service_level_objectives(resource.api())
        .await?
        .into_iter()
        .map(|summary| summary.name)
        .filter(|name| name.starts_with(prefix))
        .collect();

    tracing::info!("Sweeping {} service level objectives with prefix {:?}", names.len(), prefix);

    let results: Vec<(String, Result<(), String>)> = stream::iter(names)
        .map(|name| async move {
            let state = ServiceLevelObjectiveModel::new(name.clone());
            let result = resource.delete(&state).await.map_err(|e| e.to_string());
            (name, result)
        })
        .buffer_unordered(SWEEP_CONCURRENCY)
        .collect()
        .await;

    let mut report = SweepReport::default();
    for (name, result) in results {
        match result {
            Ok(()) => report.deleted.push(name),
            Err(message) => {
                tracing::error!("Failed to sweep {}: {}", name, message);
                report.failed.push((name, message));
            }
        }
    }
    report.deleted.sort();
    report.failed.sort();
    Ok(report)
}
