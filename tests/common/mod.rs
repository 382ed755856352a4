//! In-memory `SloApi` double shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use slo_binding::api::types::{
    CreateServiceLevelObjectiveInput, ListServiceLevelObjectivesOutput,
    RequestBasedServiceLevelIndicator, ServiceLevelIndicator, ServiceLevelIndicatorConfig,
    ServiceLevelIndicatorMetric, ServiceLevelObjective, ServiceLevelObjectiveSummary,
    UpdateServiceLevelObjectiveInput,
};
use slo_binding::api::SloApi;
use slo_binding::ApiError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub const CREATED_AT: f64 = 1704067200.0;

/// Stores SLOs the way the service echoes them and counts calls
#[derive(Default)]
pub struct FakeSloApi {
    objects: Mutex<BTreeMap<String, ServiceLevelObjective>>,
    pub creates: AtomicUsize,
    pub gets: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    /// Answer create/update/get with success but no SLO
    pub empty_output: AtomicBool,
    /// Error returned by the next mutating call
    pub fail_with: Mutex<Option<ApiError>>,
}

impl FakeSloApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, slo: ServiceLevelObjective) {
        self.objects.lock().unwrap().insert(slo.name.clone(), slo);
    }

    pub fn remove(&self, name: &str) {
        self.objects.lock().unwrap().remove(name);
    }

    pub fn stored(&self, name: &str) -> Option<ServiceLevelObjective> {
        self.objects.lock().unwrap().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn mutating_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
            + self.updates.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> Option<ApiError> {
        self.fail_with.lock().unwrap().take()
    }

    fn not_found(name: &str) -> ApiError {
        ApiError::NotFound {
            message: format!("Slo {} not found", name),
        }
    }
}

fn echo_sli(config: ServiceLevelIndicatorConfig) -> ServiceLevelIndicator {
    ServiceLevelIndicator {
        sli_metric: config.sli_metric_config.map(|m| ServiceLevelIndicatorMetric {
            key_attributes: m.key_attributes,
            operation_name: m.operation_name,
            metric_type: m.metric_type,
            metric_data_queries: m.metric_data_queries,
            dependency_config: m.dependency_config,
        }),
        metric_threshold: config.metric_threshold,
        comparison_operator: config.comparison_operator,
    }
}

/// What the service returns for a created SLO
pub fn echo_create(input: &CreateServiceLevelObjectiveInput) -> ServiceLevelObjective {
    let input = input.clone();
    let evaluation_type = if input.request_based_sli_config.is_some() {
        "RequestBased"
    } else {
        "PeriodBased"
    };

    ServiceLevelObjective {
        arn: format!(
            "arn:aws:application-signals:us-east-1:123456789012:slo/{}",
            input.name
        ),
        name: input.name,
        description: input.description,
        created_time: Some(CREATED_AT),
        last_updated_time: Some(CREATED_AT),
        sli: input.sli_config.map(echo_sli),
        request_based_sli: input
            .request_based_sli_config
            .map(|c| RequestBasedServiceLevelIndicator {
                request_based_sli_metric: c.request_based_sli_metric_config,
                metric_threshold: c.metric_threshold,
                comparison_operator: c.comparison_operator,
            }),
        evaluation_type: Some(evaluation_type.to_string()),
        goal: input.goal,
        burn_rate_configurations: input.burn_rate_configurations,
        metric_source_type: Some("ServiceOperation".to_string()),
    }
}

#[async_trait]
impl SloApi for FakeSloApi {
    async fn create_service_level_objective(
        &self,
        input: &CreateServiceLevelObjectiveInput,
    ) -> Result<Option<ServiceLevelObjective>, ApiError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let slo = echo_create(input);
        self.insert(slo.clone());
        if self.empty_output.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(slo))
    }

    async fn get_service_level_objective(
        &self,
        id: &str,
    ) -> Result<Option<ServiceLevelObjective>, ApiError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        match self.stored(id) {
            Some(_) if self.empty_output.load(Ordering::SeqCst) => Ok(None),
            Some(slo) => Ok(Some(slo)),
            None => Err(Self::not_found(id)),
        }
    }

    async fn update_service_level_objective(
        &self,
        input: &UpdateServiceLevelObjectiveInput,
    ) -> Result<Option<ServiceLevelObjective>, ApiError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let mut objects = self.objects.lock().unwrap();
        let Some(slo) = objects.get_mut(&input.id) else {
            return Err(Self::not_found(&input.id));
        };

        let input = input.clone();
        if input.description.is_some() {
            slo.description = input.description;
        }
        if let Some(config) = input.sli_config {
            slo.sli = Some(echo_sli(config));
            slo.request_based_sli = None;
        }
        if let Some(config) = input.request_based_sli_config {
            slo.request_based_sli = Some(RequestBasedServiceLevelIndicator {
                request_based_sli_metric: config.request_based_sli_metric_config,
                metric_threshold: config.metric_threshold,
                comparison_operator: config.comparison_operator,
            });
            slo.sli = None;
        }
        if input.goal.is_some() {
            slo.goal = input.goal;
        }
        if input.burn_rate_configurations.is_some() {
            slo.burn_rate_configurations = input.burn_rate_configurations;
        }
        slo.last_updated_time = Some(CREATED_AT + 60.0);

        if self.empty_output.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(slo.clone()))
    }

    async fn delete_service_level_objective(&self, id: &str) -> Result<(), ApiError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        match self.objects.lock().unwrap().remove(id) {
            Some(_) => Ok(()),
            None => Err(Self::not_found(id)),
        }
    }

    async fn list_service_level_objectives(
        &self,
        next_token: Option<&str>,
    ) -> Result<ListServiceLevelObjectivesOutput, ApiError> {
        // Two summaries per page, token is the index of the next one
        let start: usize = next_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let objects = self.objects.lock().unwrap();
        let slo_summaries: Vec<_> = objects
            .values()
            .skip(start)
            .take(2)
            .map(|slo| ServiceLevelObjectiveSummary {
                arn: slo.arn.clone(),
                name: slo.name.clone(),
                evaluation_type: slo.evaluation_type.clone(),
                ..Default::default()
            })
            .collect();
        let next = start + slo_summaries.len();
        Ok(ListServiceLevelObjectivesOutput {
            next_token: (next < objects.len()).then(|| next.to_string()),
            slo_summaries,
        })
    }
}
