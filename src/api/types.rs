//! Wire types for the Application Signals SLO API
//!
//! Member names are PascalCase on the wire and timestamps are epoch seconds.
//! Tagged unions are objects that should carry exactly one member. They are
//! decoded as structs of optional members so that an empty or overfull
//! union reaches the mapping layer instead of failing the whole response.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Shared shapes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Metric {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Vec<Dimension>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricStat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// A CloudWatch metric math or metric stat query
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDataQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_stat: Option<MetricStat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_data: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DependencyConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_key_attributes: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_operation_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BurnRateConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub look_back_window_minutes: Option<i32>,
}

// =============================================================================
// Goal
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CalendarInterval {
    /// Epoch seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RollingInterval {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
}

/// Union of `CalendarInterval` and `RollingInterval`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Interval {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_interval: Option<CalendarInterval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolling_interval: Option<RollingInterval>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Goal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<Interval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attainment_goal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_threshold: Option<f64>,
}

// =============================================================================
// Period-based SLI
// =============================================================================

/// Request-side SLI metric configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceLevelIndicatorMetricConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_attributes: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_seconds: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_data_queries: Option<Vec<MetricDataQuery>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_config: Option<DependencyConfig>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceLevelIndicatorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sli_metric_config: Option<ServiceLevelIndicatorMetricConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_operator: Option<String>,
}

/// Response-side SLI metric. The service does not echo the metric name,
/// statistic or period it was configured with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceLevelIndicatorMetric {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_attributes: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_data_queries: Option<Vec<MetricDataQuery>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_config: Option<DependencyConfig>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceLevelIndicator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sli_metric: Option<ServiceLevelIndicatorMetric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_operator: Option<String>,
}

// =============================================================================
// Request-based SLI
// =============================================================================

/// Union of `GoodCountMetric` and `BadCountMetric`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoredRequestCountMetricDataQueries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub good_count_metric: Option<Vec<MetricDataQuery>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bad_count_metric: Option<Vec<MetricDataQuery>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestBasedServiceLevelIndicatorMetricConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_attributes: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_request_count_metric: Option<Vec<MetricDataQuery>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitored_request_count_metric: Option<MonitoredRequestCountMetricDataQueries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_config: Option<DependencyConfig>,
}

/// The response shape carries the same members as the request shape
pub type RequestBasedServiceLevelIndicatorMetric = RequestBasedServiceLevelIndicatorMetricConfig;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestBasedServiceLevelIndicatorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_based_sli_metric_config: Option<RequestBasedServiceLevelIndicatorMetricConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_operator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestBasedServiceLevelIndicator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_based_sli_metric: Option<RequestBasedServiceLevelIndicatorMetric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_operator: Option<String>,
}

// =============================================================================
// Service level objective
// =============================================================================

/// The SLO as returned by the service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceLevelObjective {
    pub arn: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sli: Option<ServiceLevelIndicator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_based_sli: Option<RequestBasedServiceLevelIndicator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burn_rate_configurations: Option<Vec<BurnRateConfiguration>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_source_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateServiceLevelObjectiveInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sli_config: Option<ServiceLevelIndicatorConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_based_sli_config: Option<RequestBasedServiceLevelIndicatorConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burn_rate_configurations: Option<Vec<BurnRateConfiguration>>,
}

/// `id` travels in the request path, never in the body
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateServiceLevelObjectiveInput {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sli_config: Option<ServiceLevelIndicatorConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_based_sli_config: Option<RequestBasedServiceLevelIndicatorConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burn_rate_configurations: Option<Vec<BurnRateConfiguration>>,
}

/// Body of create, get and update responses
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceLevelObjectiveOutput {
    #[serde(default)]
    pub slo: Option<ServiceLevelObjective>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceLevelObjectiveSummary {
    pub arn: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_attributes: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_source_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListServiceLevelObjectivesOutput {
    #[serde(default)]
    pub slo_summaries: Vec<ServiceLevelObjectiveSummary>,
    #[serde(default)]
    pub next_token: Option<String>,
}
