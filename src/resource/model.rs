//! Configuration and state model
//!
//! Typed mirror of the schema. Tagged unions are enums here; on the
//! (de)serialization boundary they become the parallel optional blocks of
//! the configuration format, with the unselected side written as `null`.

use crate::error::{ConfigError, MappingError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default deadline for create, update and delete
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

pub(crate) const INTERVAL_PATH: &str = "goal.interval";
pub(crate) const INTERVAL_VARIANTS: &str = "calendar_interval, rolling_interval";
pub(crate) const INDICATOR_PATH: &str = "sli";
pub(crate) const INDICATOR_VARIANTS: &str = "sli, request_based_sli";
pub(crate) const MONITORED_COUNT_PATH: &str =
    "request_based_sli.request_based_sli_metric.monitored_request_count_metric";
pub(crate) const MONITORED_COUNT_VARIANTS: &str = "good_count_metric, bad_count_metric";

// =============================================================================
// Root
// =============================================================================

/// A service level objective as configured and as persisted in state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SloDocument", into = "SloDocument")]
pub struct ServiceLevelObjectiveModel {
    pub arn: Option<String>,
    pub created_time: Option<String>,
    pub description: Option<String>,
    pub evaluation_type: Option<String>,
    pub last_updated_time: Option<String>,
    pub metric_source_type: Option<String>,
    /// Identifier for lookup, update, delete and import
    pub name: String,
    pub goal: Option<Goal>,
    pub burn_rate_configurations: Vec<BurnRateConfiguration>,
    /// Unset only for a freshly imported skeleton
    pub indicator: Option<Indicator>,
    pub timeouts: Option<Timeouts>,
}

impl ServiceLevelObjectiveModel {
    /// A model carrying only the identifier
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            arn: None,
            created_time: None,
            description: None,
            evaluation_type: None,
            last_updated_time: None,
            metric_source_type: None,
            name: name.into(),
            goal: None,
            burn_rate_configurations: Vec::new(),
            indicator: None,
            timeouts: None,
        }
    }

    /// Copy the service-computed attributes of `prior` onto `self`
    pub fn with_computed_from(mut self, prior: &Self) -> Self {
        self.arn = prior.arn.clone();
        self.created_time = prior.created_time.clone();
        self.evaluation_type = prior.evaluation_type.clone();
        self.last_updated_time = prior.last_updated_time.clone();
        self.metric_source_type = prior.metric_source_type.clone();
        self
    }

    pub fn sli(&self) -> Option<&ServiceLevelIndicator> {
        match &self.indicator {
            Some(Indicator::Period(sli)) => Some(sli),
            _ => None,
        }
    }

    pub fn request_based_sli(&self) -> Option<&RequestBasedServiceLevelIndicator> {
        match &self.indicator {
            Some(Indicator::RequestBased(sli)) => Some(sli),
            _ => None,
        }
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts.clone().unwrap_or_default()
    }
}

/// Exactly one way of evaluating the objective
#[derive(Debug, Clone, PartialEq)]
pub enum Indicator {
    Period(ServiceLevelIndicator),
    RequestBased(RequestBasedServiceLevelIndicator),
}

/// Document shape of [`ServiceLevelObjectiveModel`]
#[derive(Serialize, Deserialize)]
struct SloDocument {
    #[serde(default)]
    arn: Option<String>,
    #[serde(default)]
    created_time: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    evaluation_type: Option<String>,
    #[serde(default)]
    last_updated_time: Option<String>,
    #[serde(default)]
    metric_source_type: Option<String>,
    name: String,
    #[serde(default)]
    goal: Option<Goal>,
    #[serde(default)]
    burn_rate_configurations: Vec<BurnRateConfiguration>,
    #[serde(default)]
    sli: Option<ServiceLevelIndicator>,
    #[serde(default)]
    request_based_sli: Option<RequestBasedServiceLevelIndicator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeouts: Option<Timeouts>,
}

impl TryFrom<SloDocument> for ServiceLevelObjectiveModel {
    type Error = MappingError;

    fn try_from(doc: SloDocument) -> Result<Self, Self::Error> {
        let indicator = match (doc.sli, doc.request_based_sli) {
            (Some(sli), None) => Some(Indicator::Period(sli)),
            (None, Some(sli)) => Some(Indicator::RequestBased(sli)),
            (None, None) => None,
            (Some(_), Some(_)) => {
                return Err(MappingError::ConflictingVariants {
                    path: String::new(),
                    expected: INDICATOR_VARIANTS,
                })
            }
        };

        Ok(Self {
            arn: doc.arn,
            created_time: doc.created_time,
            description: doc.description,
            evaluation_type: doc.evaluation_type,
            last_updated_time: doc.last_updated_time,
            metric_source_type: doc.metric_source_type,
            name: doc.name,
            goal: doc.goal,
            burn_rate_configurations: doc.burn_rate_configurations,
            indicator,
            timeouts: doc.timeouts,
        })
    }
}

impl From<ServiceLevelObjectiveModel> for SloDocument {
    fn from(model: ServiceLevelObjectiveModel) -> Self {
        let (sli, request_based_sli) = match model.indicator {
            Some(Indicator::Period(sli)) => (Some(sli), None),
            Some(Indicator::RequestBased(sli)) => (None, Some(sli)),
            None => (None, None),
        };

        Self {
            arn: model.arn,
            created_time: model.created_time,
            description: model.description,
            evaluation_type: model.evaluation_type,
            last_updated_time: model.last_updated_time,
            metric_source_type: model.metric_source_type,
            name: model.name,
            goal: model.goal,
            burn_rate_configurations: model.burn_rate_configurations,
            sli,
            request_based_sli,
            timeouts: model.timeouts,
        }
    }
}

// =============================================================================
// Goal
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub attainment_goal: f64,
    pub warning_threshold: f64,
    pub interval: Interval,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalendarInterval {
    pub duration: Option<i32>,
    pub duration_unit: Option<String>,
    /// RFC 3339
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RollingInterval {
    pub duration: Option<i32>,
    pub duration_unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IntervalBlock", into = "IntervalBlock")]
pub enum Interval {
    Calendar(CalendarInterval),
    Rolling(RollingInterval),
}

#[derive(Serialize, Deserialize)]
struct IntervalBlock {
    #[serde(default)]
    calendar_interval: Option<CalendarInterval>,
    #[serde(default)]
    rolling_interval: Option<RollingInterval>,
}

impl TryFrom<IntervalBlock> for Interval {
    type Error = MappingError;

    fn try_from(block: IntervalBlock) -> Result<Self, Self::Error> {
        match (block.calendar_interval, block.rolling_interval) {
            (Some(calendar), None) => Ok(Interval::Calendar(calendar)),
            (None, Some(rolling)) => Ok(Interval::Rolling(rolling)),
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
}

impl From<Interval> for IntervalBlock {
    fn from(interval: Interval) -> Self {
        match interval {
            Interval::Calendar(calendar) => Self {
                calendar_interval: Some(calendar),
                rolling_interval: None,
            },
            Interval::Rolling(rolling) => Self {
                calendar_interval: None,
                rolling_interval: Some(rolling),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BurnRateConfiguration {
    pub look_back_window_minutes: Option<i32>,
}

// =============================================================================
// Indicators
// =============================================================================

/// Period-based indicator
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceLevelIndicator {
    pub comparison_operator: Option<String>,
    pub metric_threshold: Option<f64>,
    pub sli_metric: Option<SliMetric>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SliMetric {
    pub key_attributes: Option<BTreeMap<String, String>>,
    pub metric_type: Option<String>,
    /// Not echoed by the service
    pub metric_name: Option<String>,
    pub operation_name: Option<String>,
    /// Not echoed by the service
    pub period_seconds: Option<i32>,
    /// Not echoed by the service
    pub statistic: Option<String>,
    #[serde(default)]
    pub metric_data_queries: Vec<MetricDataQuery>,
    pub dependency_config: Option<DependencyConfig>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestBasedServiceLevelIndicator {
    pub comparison_operator: Option<String>,
    pub metric_threshold: Option<f64>,
    pub request_based_sli_metric: Option<RequestBasedSliMetric>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestBasedSliMetric {
    pub key_attributes: Option<BTreeMap<String, String>>,
    pub metric_type: Option<String>,
    pub operation_name: Option<String>,
    #[serde(default)]
    pub total_request_count_metric: Vec<MetricDataQuery>,
    pub dependency_config: Option<DependencyConfig>,
    pub monitored_request_count_metric: Option<MonitoredRequestCount>,
}

/// Requests counted against the total: the good ones or the bad ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MonitoredRequestCountBlock", into = "MonitoredRequestCountBlock")]
pub enum MonitoredRequestCount {
    Good(Vec<MetricDataQuery>),
    Bad(Vec<MetricDataQuery>),
}

#[derive(Serialize, Deserialize)]
struct MonitoredRequestCountBlock {
    #[serde(default)]
    good_count_metric: Option<Vec<MetricDataQuery>>,
    #[serde(default)]
    bad_count_metric: Option<Vec<MetricDataQuery>>,
}

impl TryFrom<MonitoredRequestCountBlock> for MonitoredRequestCount {
    type Error = MappingError;

    fn try_from(block: MonitoredRequestCountBlock) -> Result<Self, Self::Error> {
        match (block.good_count_metric, block.bad_count_metric) {
            (Some(good), None) => Ok(MonitoredRequestCount::Good(good)),
            (None, Some(bad)) => Ok(MonitoredRequestCount::Bad(bad)),
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
}

impl From<MonitoredRequestCount> for MonitoredRequestCountBlock {
    fn from(count: MonitoredRequestCount) -> Self {
        match count {
            MonitoredRequestCount::Good(queries) => Self {
                good_count_metric: Some(queries),
                bad_count_metric: None,
            },
            MonitoredRequestCount::Bad(queries) => Self {
                good_count_metric: None,
                bad_count_metric: Some(queries),
            },
        }
    }
}

// =============================================================================
// Metrics
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricDataQuery {
    pub id: Option<String>,
    pub account_id: Option<String>,
    pub expression: Option<String>,
    pub label: Option<String>,
    pub period: Option<i32>,
    pub return_data: Option<bool>,
    pub metric_stat: Option<MetricStat>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricStat {
    pub period: Option<i32>,
    pub stat: Option<String>,
    pub unit: Option<String>,
    pub metric: Option<Metric>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metric {
    pub metric_name: Option<String>,
    pub namespace: Option<String>,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimension {
    pub name: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DependencyConfig {
    pub dependency_key_attributes: Option<BTreeMap<String, String>>,
    pub dependency_operation_name: Option<String>,
}

// =============================================================================
// Timeouts
// =============================================================================

/// Per-operation deadlines, as duration strings such as `"30s"` or `"1h30m"`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timeouts {
    pub create: Option<String>,
    pub update: Option<String>,
    pub delete: Option<String>,
}

impl Timeouts {
    pub fn create(&self) -> Result<Duration, ConfigError> {
        resolve_timeout(self.create.as_deref())
    }

    pub fn update(&self) -> Result<Duration, ConfigError> {
        resolve_timeout(self.update.as_deref())
    }

    pub fn delete(&self) -> Result<Duration, ConfigError> {
        resolve_timeout(self.delete.as_deref())
    }
}

fn resolve_timeout(value: Option<&str>) -> Result<Duration, ConfigError> {
    value.map(parse_duration).unwrap_or(Ok(DEFAULT_TIMEOUT))
}

/// Parse a duration such as `"45s"`, `"5m"` or `"1h30m"`
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::Duration(input.to_string());
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in trimmed.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(invalid()),
        };
        let amount: u64 = digits.parse().map_err(|_| invalid())?;
        total = amount
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(invalid)?;
        digits.clear();
    }

    // trailing number without a unit
    if !digits.is_empty() {
        return Err(invalid());
    }
    Ok(Duration::from_secs(total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn period_document() -> serde_json::Value {
        json!({
            "name": "checkout-latency",
            "goal": {
                "attainment_goal": 99.0,
                "warning_threshold": 30.0,
                "interval": {"rolling_interval": {"duration": 7, "duration_unit": "DAY"}}
            },
            "sli": {
                "comparison_operator": "LessThan",
                "metric_threshold": 2.0,
                "sli_metric": {"metric_data_queries": [{"id": "m1", "expression": "m"}]}
            }
        })
    }

    #[test]
    fn test_period_document_deserializes() {
        let model: ServiceLevelObjectiveModel = serde_json::from_value(period_document()).unwrap();
        assert_eq!(model.name, "checkout-latency");
        assert!(model.sli().is_some());
        assert!(model.request_based_sli().is_none());
        let goal = model.goal.unwrap();
        assert_eq!(
            goal.interval,
            Interval::Rolling(RollingInterval {
                duration: Some(7),
                duration_unit: Some("DAY".to_string()),
            })
        );
    }

    #[test]
    fn test_unselected_side_serializes_as_null() {
        let model: ServiceLevelObjectiveModel = serde_json::from_value(period_document()).unwrap();
        let value = serde_json::to_value(&model).unwrap();
        assert!(value["request_based_sli"].is_null());
        assert!(value.as_object().unwrap().contains_key("request_based_sli"));
        assert!(value["goal"]["interval"]["calendar_interval"].is_null());
        assert!(!value.as_object().unwrap().contains_key("timeouts"));
    }

    #[test]
    fn test_both_indicators_is_an_error() {
        let mut doc = period_document();
        doc["request_based_sli"] = json!({"comparison_operator": "GreaterThan"});
        let err = serde_json::from_value::<ServiceLevelObjectiveModel>(doc).unwrap_err();
        assert!(err.to_string().contains("sli, request_based_sli"));
    }

    #[test]
    fn test_empty_interval_is_an_error() {
        let mut doc = period_document();
        doc["goal"]["interval"] = json!({});
        let err = serde_json::from_value::<ServiceLevelObjectiveModel>(doc).unwrap_err();
        assert!(err.to_string().contains("goal.interval"));
    }

    #[test]
    fn test_monitored_count_bad_variant() {
        let block = json!({"good_count_metric": null, "bad_count_metric": [{"id": "bad"}]});
        let count: MonitoredRequestCount = serde_json::from_value(block).unwrap();
        match &count {
            MonitoredRequestCount::Bad(queries) => {
                assert_eq!(queries[0].id.as_deref(), Some("bad"))
            }
            other => panic!("unexpected variant: {:?}", other),
        }
        let back = serde_json::to_value(&count).unwrap();
        assert!(back["good_count_metric"].is_null());
    }

    #[test]
    fn test_with_computed_from_keeps_configuration() {
        let mut prior = ServiceLevelObjectiveModel::new("a");
        prior.arn = Some("arn:a".to_string());
        prior.description = Some("old".to_string());
        let mut plan = ServiceLevelObjectiveModel::new("a");
        plan.description = Some("new".to_string());

        let merged = plan.with_computed_from(&prior);
        assert_eq!(merged.arn.as_deref(), Some("arn:a"));
        assert_eq!(merged.description.as_deref(), Some("new"));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("1d").is_err());
        assert!(parse_duration("m").is_err());
    }

    #[test]
    fn test_timeouts_default() {
        let timeouts = Timeouts {
            update: Some("10m".to_string()),
            ..Default::default()
        };
        assert_eq!(timeouts.create().unwrap(), DEFAULT_TIMEOUT);
        assert_eq!(timeouts.update().unwrap(), Duration::from_secs(600));
    }
}
