//! Model -> API request mapping

use super::model::{
    BurnRateConfiguration, CalendarInterval, DependencyConfig, Dimension, Goal, Indicator,
    Interval, Metric, MetricDataQuery, MetricStat, MonitoredRequestCount,
    RequestBasedServiceLevelIndicator, RequestBasedSliMetric, RollingInterval,
    ServiceLevelIndicator, ServiceLevelObjectiveModel, SliMetric,
};
use crate::api::types as wire;
use crate::error::MappingError;
use chrono::DateTime;

/// Build the create request
pub fn expand_create_input(
    model: &ServiceLevelObjectiveModel,
) -> Result<wire::CreateServiceLevelObjectiveInput, MappingError> {
    let (sli_config, request_based_sli_config) = expand_indicator(model.indicator.as_ref());

    Ok(wire::CreateServiceLevelObjectiveInput {
        name: model.name.clone(),
        description: model.description.clone(),
        sli_config,
        request_based_sli_config,
        goal: model.goal.as_ref().map(expand_goal).transpose()?,
        burn_rate_configurations: expand_burn_rates(&model.burn_rate_configurations),
    })
}

/// Build the update request; the name travels as the path identifier
pub fn expand_update_input(
    model: &ServiceLevelObjectiveModel,
) -> Result<wire::UpdateServiceLevelObjectiveInput, MappingError> {
    let (sli_config, request_based_sli_config) = expand_indicator(model.indicator.as_ref());

    Ok(wire::UpdateServiceLevelObjectiveInput {
        id: model.name.clone(),
        description: model.description.clone(),
        sli_config,
        request_based_sli_config,
        goal: model.goal.as_ref().map(expand_goal).transpose()?,
        burn_rate_configurations: expand_burn_rates(&model.burn_rate_configurations),
    })
}

fn non_empty<T, U>(items: &[T], f: impl Fn(&T) -> U) -> Option<Vec<U>> {
    (!items.is_empty()).then(|| items.iter().map(f).collect())
}

fn expand_burn_rates(
    items: &[BurnRateConfiguration],
) -> Option<Vec<wire::BurnRateConfiguration>> {
    non_empty(items, |b| wire::BurnRateConfiguration {
        look_back_window_minutes: b.look_back_window_minutes,
    })
}

// =============================================================================
// Goal
// =============================================================================

fn expand_goal(goal: &Goal) -> Result<wire::Goal, MappingError> {
    Ok(wire::Goal {
        interval: Some(expand_interval(&goal.interval)?),
        attainment_goal: Some(goal.attainment_goal),
        warning_threshold: Some(goal.warning_threshold),
    })
}

fn expand_interval(interval: &Interval) -> Result<wire::Interval, MappingError> {
    match interval {
        Interval::Calendar(CalendarInterval {
            duration,
            duration_unit,
            start_time,
        }) => Ok(wire::Interval {
            calendar_interval: Some(wire::CalendarInterval {
                start_time: start_time
                    .as_deref()
                    .map(|s| parse_timestamp("goal.interval.calendar_interval.start_time", s))
                    .transpose()?,
                duration_unit: duration_unit.clone(),
                duration: *duration,
            }),
            rolling_interval: None,
        }),
        Interval::Rolling(RollingInterval {
            duration,
            duration_unit,
        }) => Ok(wire::Interval {
            calendar_interval: None,
            rolling_interval: Some(wire::RollingInterval {
                duration_unit: duration_unit.clone(),
                duration: *duration,
            }),
        }),
    }
}

/// RFC 3339 -> epoch seconds
pub fn parse_timestamp(path: &str, value: &str) -> Result<f64, MappingError> {
    let parsed =
        DateTime::parse_from_rfc3339(value).map_err(|_| MappingError::InvalidTimestamp {
            path: path.to_string(),
            value: value.to_string(),
        })?;
    let millis = parsed.timestamp_millis();
    Ok(millis as f64 / 1000.0)
}

// =============================================================================
// Indicators
// =============================================================================

fn expand_indicator(
    indicator: Option<&Indicator>,
) -> (
    Option<wire::ServiceLevelIndicatorConfig>,
    Option<wire::RequestBasedServiceLevelIndicatorConfig>,
) {
    match indicator {
        Some(Indicator::Period(sli)) => (Some(expand_sli(sli)), None),
        Some(Indicator::RequestBased(sli)) => (None, Some(expand_request_based_sli(sli))),
        None => (None, None),
    }
}

fn expand_sli(sli: &ServiceLevelIndicator) -> wire::ServiceLevelIndicatorConfig {
    wire::ServiceLevelIndicatorConfig {
        sli_metric_config: sli.sli_metric.as_ref().map(expand_sli_metric),
        metric_threshold: sli.metric_threshold,
        comparison_operator: sli.comparison_operator.clone(),
    }
}

fn expand_sli_metric(metric: &SliMetric) -> wire::ServiceLevelIndicatorMetricConfig {
    wire::ServiceLevelIndicatorMetricConfig {
        key_attributes: metric.key_attributes.clone(),
        operation_name: metric.operation_name.clone(),
        metric_type: metric.metric_type.clone(),
        metric_name: metric.metric_name.clone(),
        statistic: metric.statistic.clone(),
        period_seconds: metric.period_seconds,
        metric_data_queries: expand_queries(&metric.metric_data_queries),
        dependency_config: metric.dependency_config.as_ref().map(expand_dependency_config),
    }
}

fn expand_request_based_sli(
    sli: &RequestBasedServiceLevelIndicator,
) -> wire::RequestBasedServiceLevelIndicatorConfig {
    wire::RequestBasedServiceLevelIndicatorConfig {
        request_based_sli_metric_config: sli
            .request_based_sli_metric
            .as_ref()
            .map(expand_request_based_sli_metric),
        metric_threshold: sli.metric_threshold,
        comparison_operator: sli.comparison_operator.clone(),
    }
}

fn expand_request_based_sli_metric(
    metric: &RequestBasedSliMetric,
) -> wire::RequestBasedServiceLevelIndicatorMetricConfig {
    wire::RequestBasedServiceLevelIndicatorMetricConfig {
        key_attributes: metric.key_attributes.clone(),
        operation_name: metric.operation_name.clone(),
        metric_type: metric.metric_type.clone(),
        total_request_count_metric: expand_queries(&metric.total_request_count_metric),
        monitored_request_count_metric: metric
            .monitored_request_count_metric
            .as_ref()
            .map(expand_monitored_request_count),
        dependency_config: metric.dependency_config.as_ref().map(expand_dependency_config),
    }
}

fn expand_monitored_request_count(
    count: &MonitoredRequestCount,
) -> wire::MonitoredRequestCountMetricDataQueries {
    match count {
        MonitoredRequestCount::Good(queries) => wire::MonitoredRequestCountMetricDataQueries {
            good_count_metric: Some(queries.iter().map(expand_query).collect()),
            bad_count_metric: None,
        },
        MonitoredRequestCount::Bad(queries) => wire::MonitoredRequestCountMetricDataQueries {
            good_count_metric: None,
            bad_count_metric: Some(queries.iter().map(expand_query).collect()),
        },
    }
}

fn expand_dependency_config(config: &DependencyConfig) -> wire::DependencyConfig {
    wire::DependencyConfig {
        dependency_key_attributes: config.dependency_key_attributes.clone(),
        dependency_operation_name: config.dependency_operation_name.clone(),
    }
}

// =============================================================================
// Metrics
// =============================================================================

fn expand_queries(queries: &[MetricDataQuery]) -> Option<Vec<wire::MetricDataQuery>> {
    non_empty(queries, expand_query)
}

fn expand_query(query: &MetricDataQuery) -> wire::MetricDataQuery {
    wire::MetricDataQuery {
        id: query.id.clone(),
        metric_stat: query.metric_stat.as_ref().map(expand_metric_stat),
        expression: query.expression.clone(),
        label: query.label.clone(),
        return_data: query.return_data,
        period: query.period,
        account_id: query.account_id.clone(),
    }
}

fn expand_metric_stat(stat: &MetricStat) -> wire::MetricStat {
    wire::MetricStat {
        metric: stat.metric.as_ref().map(expand_metric),
        period: stat.period,
        stat: stat.stat.clone(),
        unit: stat.unit.clone(),
    }
}

fn expand_metric(metric: &Metric) -> wire::Metric {
    wire::Metric {
        namespace: metric.namespace.clone(),
        metric_name: metric.metric_name.clone(),
        dimensions: non_empty(&metric.dimensions, |d: &Dimension| wire::Dimension {
            name: d.name.clone(),
            value: d.value.clone(),
        }),
    }
}
