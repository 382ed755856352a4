//! API response -> model mapping
//!
//! Flattening writes into the prior model: values the service never echoes
//! (the SLI metric's name, statistic and period, the timeouts) keep their
//! prior values, and a calendar start time that is the same instant as the
//! prior one keeps its prior spelling.

use super::expand::parse_timestamp;
use super::model::{
    BurnRateConfiguration, CalendarInterval, DependencyConfig, Dimension, Goal, Indicator,
    Interval, Metric, MetricDataQuery, MetricStat, MonitoredRequestCount,
    RequestBasedServiceLevelIndicator, RequestBasedSliMetric, RollingInterval,
    ServiceLevelIndicator, ServiceLevelObjectiveModel, SliMetric, INDICATOR_PATH,
    INDICATOR_VARIANTS, INTERVAL_PATH, INTERVAL_VARIANTS, MONITORED_COUNT_PATH,
    MONITORED_COUNT_VARIANTS,
};
use crate::api::types as wire;
use crate::error::MappingError;
use chrono::{DateTime, SecondsFormat};

/// Map a service response onto the model, starting from `prior`
pub fn flatten_service_level_objective(
    slo: &wire::ServiceLevelObjective,
    prior: &ServiceLevelObjectiveModel,
) -> Result<ServiceLevelObjectiveModel, MappingError> {
    let goal = match &slo.goal {
        Some(goal) => Some(flatten_goal(goal, prior.goal.as_ref())?),
        None => prior.goal.clone(),
    };

    let indicator = match (&slo.sli, &slo.request_based_sli) {
        (Some(sli), None) => Indicator::Period(flatten_sli(sli, prior.sli())),
        (None, Some(sli)) => Indicator::RequestBased(flatten_request_based_sli(sli)?),
        (None, None) => {
            return Err(MappingError::MissingVariant {
                path: INDICATOR_PATH.to_string(),
                expected: INDICATOR_VARIANTS,
            })
        }
        (Some(_), Some(_)) => {
            return Err(MappingError::ConflictingVariants {
                path: INDICATOR_PATH.to_string(),
                expected: INDICATOR_VARIANTS,
            })
        }
    };

    Ok(ServiceLevelObjectiveModel {
        arn: Some(slo.arn.clone()),
        created_time: slo
            .created_time
            .map(|t| format_timestamp("created_time", t))
            .transpose()?,
        description: slo.description.clone(),
        evaluation_type: slo.evaluation_type.clone(),
        last_updated_time: slo
            .last_updated_time
            .map(|t| format_timestamp("last_updated_time", t))
            .transpose()?,
        metric_source_type: slo.metric_source_type.clone(),
        name: slo.name.clone(),
        goal,
        burn_rate_configurations: slo
            .burn_rate_configurations
            .iter()
            .flatten()
            .map(|b| BurnRateConfiguration {
                look_back_window_minutes: b.look_back_window_minutes,
            })
            .collect(),
        indicator: Some(indicator),
        timeouts: prior.timeouts.clone(),
    })
}

/// Epoch seconds -> RFC 3339 (UTC, seconds precision)
pub fn format_timestamp(path: &str, epoch_seconds: f64) -> Result<String, MappingError> {
    let millis = (epoch_seconds * 1000.0).round() as i64;
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .ok_or_else(|| MappingError::InvalidTimestamp {
            path: path.to_string(),
            value: epoch_seconds.to_string(),
        })
}

// =============================================================================
// Goal
// =============================================================================

fn flatten_goal(goal: &wire::Goal, prior: Option<&Goal>) -> Result<Goal, MappingError> {
    let interval = match &goal.interval {
        Some(interval) => flatten_interval(interval, prior.map(|g| &g.interval))?,
        None => {
            return Err(MappingError::MissingVariant {
                path: INTERVAL_PATH.to_string(),
                expected: INTERVAL_VARIANTS,
            })
        }
    };

    let attainment_goal = goal
        .attainment_goal
        .or(prior.map(|g| g.attainment_goal))
        .ok_or_else(|| MappingError::MissingValue {
            path: "goal.attainment_goal".to_string(),
        })?;
    let warning_threshold = goal
        .warning_threshold
        .or(prior.map(|g| g.warning_threshold))
        .ok_or_else(|| MappingError::MissingValue {
            path: "goal.warning_threshold".to_string(),
        })?;

    Ok(Goal {
        attainment_goal,
        warning_threshold,
        interval,
    })
}

fn flatten_interval(
    interval: &wire::Interval,
    prior: Option<&Interval>,
) -> Result<Interval, MappingError> {
    match (&interval.calendar_interval, &interval.rolling_interval) {
        (Some(calendar), None) => {
            let prior_start = match prior {
                Some(Interval::Calendar(c)) => c.start_time.as_deref(),
                _ => None,
            };
            let start_time = match calendar.start_time {
                Some(epoch) => Some(flatten_start_time(epoch, prior_start)?),
                None => None,
            };
            Ok(Interval::Calendar(CalendarInterval {
                duration: calendar.duration,
                duration_unit: calendar.duration_unit.clone(),
                start_time,
            }))
        }
        (None, Some(rolling)) => Ok(Interval::Rolling(RollingInterval {
            duration: rolling.duration,
            duration_unit: rolling.duration_unit.clone(),
        })),
        (None, None) => Err(MappingError::MissingVariant {
            path: INTERVAL_PATH.to_string(),
            expected: INTERVAL_VARIANTS,
        }),
        (Some(_), Some(_)) => Err(MappingError::ConflictingVariants {
            path: INTERVAL_PATH.to_string(),
            expected: INTERVAL_VARIANTS,
        }),
    }
}

fn flatten_start_time(epoch: f64, prior: Option<&str>) -> Result<String, MappingError> {
    const PATH: &str = "goal.interval.calendar_interval.start_time";

    if let Some(prior) = prior {
        if let Ok(prior_epoch) = parse_timestamp(PATH, prior) {
            if (prior_epoch - epoch).abs() < 0.001 {
                return Ok(prior.to_string());
            }
        }
    }
    format_timestamp(PATH, epoch)
}

// =============================================================================
// Indicators
// =============================================================================

fn flatten_sli(
    sli: &wire::ServiceLevelIndicator,
    prior: Option<&ServiceLevelIndicator>,
) -> ServiceLevelIndicator {
    let prior_metric = prior.and_then(|p| p.sli_metric.as_ref());

    ServiceLevelIndicator {
        comparison_operator: sli.comparison_operator.clone(),
        metric_threshold: sli.metric_threshold,
        sli_metric: sli
            .sli_metric
            .as_ref()
            .map(|metric| flatten_sli_metric(metric, prior_metric)),
    }
}

fn flatten_sli_metric(
    metric: &wire::ServiceLevelIndicatorMetric,
    prior: Option<&SliMetric>,
) -> SliMetric {
    SliMetric {
        key_attributes: metric.key_attributes.clone(),
        metric_type: metric.metric_type.clone(),
        metric_name: prior.and_then(|p| p.metric_name.clone()),
        operation_name: metric.operation_name.clone(),
        period_seconds: prior.and_then(|p| p.period_seconds),
        statistic: prior.and_then(|p| p.statistic.clone()),
        metric_data_queries: flatten_queries(metric.metric_data_queries.as_deref()),
        dependency_config: metric.dependency_config.as_ref().map(flatten_dependency_config),
    }
}

fn flatten_request_based_sli(
    sli: &wire::RequestBasedServiceLevelIndicator,
) -> Result<RequestBasedServiceLevelIndicator, MappingError> {
    Ok(RequestBasedServiceLevelIndicator {
        comparison_operator: sli.comparison_operator.clone(),
        metric_threshold: sli.metric_threshold,
        request_based_sli_metric: sli
            .request_based_sli_metric
            .as_ref()
            .map(flatten_request_based_sli_metric)
            .transpose()?,
    })
}

fn flatten_request_based_sli_metric(
    metric: &wire::RequestBasedServiceLevelIndicatorMetric,
) -> Result<RequestBasedSliMetric, MappingError> {
    let monitored = match &metric.monitored_request_count_metric {
        Some(count) => flatten_monitored_request_count(count)?,
        None => {
            return Err(MappingError::MissingVariant {
                path: MONITORED_COUNT_PATH.to_string(),
                expected: MONITORED_COUNT_VARIANTS,
            })
        }
    };

    Ok(RequestBasedSliMetric {
        key_attributes: metric.key_attributes.clone(),
        metric_type: metric.metric_type.clone(),
        operation_name: metric.operation_name.clone(),
        total_request_count_metric: flatten_queries(metric.total_request_count_metric.as_deref()),
        dependency_config: metric.dependency_config.as_ref().map(flatten_dependency_config),
        monitored_request_count_metric: Some(monitored),
    })
}

fn flatten_monitored_request_count(
    count: &wire::MonitoredRequestCountMetricDataQueries,
) -> Result<MonitoredRequestCount, MappingError> {
    match (&count.good_count_metric, &count.bad_count_metric) {
        (Some(good), None) => Ok(MonitoredRequestCount::Good(flatten_queries(Some(good)))),
        (None, Some(bad)) => Ok(MonitoredRequestCount::Bad(flatten_queries(Some(bad)))),
        (None, None) => Err(MappingError::MissingVariant {
            path: MONITORED_COUNT_PATH.to_string(),
            expected: MONITORED_COUNT_VARIANTS,
        }),
        (Some(_), Some(_)) => Err(MappingError::ConflictingVariants {
            path: MONITORED_COUNT_PATH.to_string(),
            expected: MONITORED_COUNT_VARIANTS,
        }),
    }
}

fn flatten_dependency_config(config: &wire::DependencyConfig) -> DependencyConfig {
    DependencyConfig {
        dependency_key_attributes: config.dependency_key_attributes.clone(),
        dependency_operation_name: config.dependency_operation_name.clone(),
    }
}

// =============================================================================
// Metrics
// =============================================================================

fn flatten_queries(queries: Option<&[wire::MetricDataQuery]>) -> Vec<MetricDataQuery> {
    queries
        .unwrap_or_default()
        .iter()
        .map(|q| MetricDataQuery {
            id: q.id.clone(),
            account_id: q.account_id.clone(),
            expression: q.expression.clone(),
            label: q.label.clone(),
            period: q.period,
            return_data: q.return_data,
            metric_stat: q.metric_stat.as_ref().map(flatten_metric_stat),
        })
        .collect()
}

fn flatten_metric_stat(stat: &wire::MetricStat) -> MetricStat {
    MetricStat {
        period: stat.period,
        stat: stat.stat.clone(),
        unit: stat.unit.clone(),
        metric: stat.metric.as_ref().map(|m| Metric {
            metric_name: m.metric_name.clone(),
            namespace: m.namespace.clone(),
            dimensions: m
                .dimensions
                .iter()
                .flatten()
                .map(|d| Dimension {
                    name: d.name.clone(),
                    value: d.value.clone(),
                })
                .collect(),
        }),
    }
}
