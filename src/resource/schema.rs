//! Schema declaration
//!
//! The resource schema as data: attributes with type and mode, nested
//! blocks with their nesting and validators. [`Schema::validate`] checks a
//! configuration document against it and collects every problem.

use super::diag::Diagnostic;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Float64,
    Int32,
    Bool,
    MapOfString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeMode {
    Required,
    Optional,
    Computed,
    OptionalComputed,
}

/// A leaf attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub ty: AttributeType,
    pub mode: AttributeMode,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub requires_replace: bool,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub description: &'static str,
}

impl Attribute {
    pub fn new(ty: AttributeType, mode: AttributeMode) -> Self {
        Self {
            ty,
            mode,
            requires_replace: false,
            description: "",
        }
    }

    pub fn required_string() -> Self {
        Self::new(AttributeType::String, AttributeMode::Required)
    }

    pub fn optional_string() -> Self {
        Self::new(AttributeType::String, AttributeMode::Optional)
    }

    pub fn computed_string() -> Self {
        Self::new(AttributeType::String, AttributeMode::Computed)
    }

    pub fn required_float64() -> Self {
        Self::new(AttributeType::Float64, AttributeMode::Required)
    }

    pub fn optional_float64() -> Self {
        Self::new(AttributeType::Float64, AttributeMode::Optional)
    }

    pub fn optional_int32() -> Self {
        Self::new(AttributeType::Int32, AttributeMode::Optional)
    }

    pub fn optional_bool() -> Self {
        Self::new(AttributeType::Bool, AttributeMode::Optional)
    }

    pub fn optional_string_map() -> Self {
        Self::new(AttributeType::MapOfString, AttributeMode::Optional)
    }

    /// Changing the value forces a new resource
    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn is_computed_only(&self) -> bool {
        self.mode == AttributeMode::Computed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Nesting {
    Single,
    List,
}

/// Cross-field constraints on a nested block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockValidator {
    IsRequired,
    /// Exactly one of this block and the named siblings must be set
    ExactlyOneOf(Vec<&'static str>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Block {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<&'static str, Attribute>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub blocks: BTreeMap<&'static str, NestedBlock>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    pub fn with_block(mut self, name: &'static str, block: NestedBlock) -> Self {
        self.blocks.insert(name, block);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedBlock {
    pub nesting: Nesting,
    pub block: Block,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<BlockValidator>,
}

impl NestedBlock {
    pub fn single(block: Block) -> Self {
        Self {
            nesting: Nesting::Single,
            block,
            validators: Vec::new(),
        }
    }

    pub fn list(block: Block) -> Self {
        Self {
            nesting: Nesting::List,
            block,
            validators: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.validators.push(BlockValidator::IsRequired);
        self
    }

    pub fn exactly_one_of(mut self, siblings: &[&'static str]) -> Self {
        self.validators
            .push(BlockValidator::ExactlyOneOf(siblings.to_vec()));
        self
    }
}

/// Root schema of a resource type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub version: u32,
    pub block: Block,
}

impl Schema {
    pub fn v0(block: Block) -> Self {
        Self { version: 0, block }
    }

    /// Validate a configuration document
    pub fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        validate_block(&self.block, config, "", &mut diags);
        diags
    }

    /// Names of the root attributes that cannot be set by configuration
    pub fn computed_attributes(&self) -> Vec<&'static str> {
        self.block
            .attributes
            .iter()
            .filter(|(_, a)| a.is_computed_only())
            .map(|(name, _)| *name)
            .collect()
    }
}

// =============================================================================
// Service level objective schema
// =============================================================================

/// Schema of `aws_applicationsignals_service_level_objective`
pub fn service_level_objective_schema() -> Schema {
    let calendar_interval = Block::new()
        .with_attribute("duration", Attribute::optional_int32())
        .with_attribute("duration_unit", Attribute::optional_string())
        .with_attribute(
            "start_time",
            Attribute::optional_string().with_description("RFC 3339 timestamp"),
        );
    let rolling_interval = Block::new()
        .with_attribute("duration", Attribute::optional_int32())
        .with_attribute("duration_unit", Attribute::optional_string());

    let interval = Block::new()
        .with_block(
            "calendar_interval",
            NestedBlock::single(calendar_interval).exactly_one_of(&["rolling_interval"]),
        )
        .with_block(
            "rolling_interval",
            NestedBlock::single(rolling_interval).exactly_one_of(&["calendar_interval"]),
        );

    let goal = Block::new()
        .with_attribute("attainment_goal", Attribute::required_float64())
        .with_attribute("warning_threshold", Attribute::required_float64())
        .with_block("interval", NestedBlock::single(interval).required());

    let burn_rate =
        Block::new().with_attribute("look_back_window_minutes", Attribute::optional_int32());

    let sli_metric = Block::new()
        .with_attribute("key_attributes", Attribute::optional_string_map())
        .with_attribute("metric_type", Attribute::optional_string())
        .with_attribute("metric_name", Attribute::optional_string())
        .with_attribute("operation_name", Attribute::optional_string())
        .with_attribute("period_seconds", Attribute::optional_int32())
        .with_attribute("statistic", Attribute::optional_string())
        .with_block("metric_data_queries", metric_data_queries_block())
        .with_block("dependency_config", dependency_config_block());

    let sli = Block::new()
        .with_attribute("metric_threshold", Attribute::optional_float64())
        .with_attribute("comparison_operator", Attribute::optional_string())
        .with_block("sli_metric", NestedBlock::single(sli_metric));

    let monitored_request_count = Block::new()
        .with_block(
            "good_count_metric",
            metric_data_queries_block().exactly_one_of(&["bad_count_metric"]),
        )
        .with_block(
            "bad_count_metric",
            metric_data_queries_block().exactly_one_of(&["good_count_metric"]),
        );

    let request_based_sli_metric = Block::new()
        .with_attribute("key_attributes", Attribute::optional_string_map())
        .with_attribute("metric_type", Attribute::optional_string())
        .with_attribute("operation_name", Attribute::optional_string())
        .with_block("total_request_count_metric", metric_data_queries_block())
        .with_block("dependency_config", dependency_config_block())
        .with_block(
            "monitored_request_count_metric",
            NestedBlock::single(monitored_request_count),
        );

    let request_based_sli = Block::new()
        .with_attribute("metric_threshold", Attribute::optional_float64())
        .with_attribute("comparison_operator", Attribute::optional_string())
        .with_block(
            "request_based_sli_metric",
            NestedBlock::single(request_based_sli_metric),
        );

    let timeouts = Block::new()
        .with_attribute("create", Attribute::optional_string())
        .with_attribute("update", Attribute::optional_string())
        .with_attribute("delete", Attribute::optional_string());

    let root = Block::new()
        .with_attribute("arn", Attribute::computed_string())
        .with_attribute(
            "created_time",
            Attribute::computed_string().with_description("RFC 3339 timestamp"),
        )
        .with_attribute("description", Attribute::optional_string())
        .with_attribute("evaluation_type", Attribute::computed_string())
        .with_attribute(
            "last_updated_time",
            Attribute::computed_string().with_description("RFC 3339 timestamp"),
        )
        .with_attribute("metric_source_type", Attribute::computed_string())
        .with_attribute("name", Attribute::required_string().requires_replace())
        .with_block("goal", NestedBlock::single(goal).required())
        .with_block("burn_rate_configurations", NestedBlock::list(burn_rate))
        .with_block(
            "request_based_sli",
            NestedBlock::single(request_based_sli).exactly_one_of(&["sli"]),
        )
        .with_block(
            "sli",
            NestedBlock::single(sli).exactly_one_of(&["request_based_sli"]),
        )
        .with_block("timeouts", NestedBlock::single(timeouts));

    Schema::v0(root)
}

fn metric_data_queries_block() -> NestedBlock {
    let dimension = Block::new()
        .with_attribute("name", Attribute::optional_string())
        .with_attribute("value", Attribute::optional_string());

    let metric = Block::new()
        .with_attribute("metric_name", Attribute::optional_string())
        .with_attribute("namespace", Attribute::optional_string())
        .with_block("dimensions", NestedBlock::list(dimension));

    let metric_stat = Block::new()
        .with_attribute("period", Attribute::optional_int32())
        .with_attribute("stat", Attribute::optional_string())
        .with_attribute("unit", Attribute::optional_string())
        .with_block("metric", NestedBlock::single(metric));

    let query = Block::new()
        .with_attribute("id", Attribute::optional_string())
        .with_attribute("account_id", Attribute::optional_string())
        .with_attribute("expression", Attribute::optional_string())
        .with_attribute("label", Attribute::optional_string())
        .with_attribute("period", Attribute::optional_int32())
        .with_attribute("return_data", Attribute::optional_bool())
        .with_block("metric_stat", NestedBlock::single(metric_stat));

    NestedBlock::list(query)
}

fn dependency_config_block() -> NestedBlock {
    NestedBlock::single(
        Block::new()
            .with_attribute("dependency_key_attributes", Attribute::optional_string_map())
            .with_attribute("dependency_operation_name", Attribute::optional_string()),
    )
}

// =============================================================================
// Validation
// =============================================================================

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn push_unique(diags: &mut Vec<Diagnostic>, diag: Diagnostic) {
    if !diags.contains(&diag) {
        diags.push(diag);
    }
}

fn is_set(object: &Map<String, Value>, name: &str) -> bool {
    object.get(name).map(|v| !v.is_null()).unwrap_or(false)
}

fn validate_block(block: &Block, value: &Value, path: &str, diags: &mut Vec<Diagnostic>) {
    let Some(object) = value.as_object() else {
        diags.push(
            Diagnostic::error("Invalid block", "expected an object").with_path(path),
        );
        return;
    };

    for key in object.keys() {
        if !block.attributes.contains_key(key.as_str())
            && !block.blocks.contains_key(key.as_str())
        {
            diags.push(
                Diagnostic::error(
                    "Unsupported argument",
                    format!("an argument named {:?} is not expected here", key),
                )
                .with_path(join_path(path, key)),
            );
        }
    }

    for (name, attribute) in &block.attributes {
        let attr_path = join_path(path, name);
        match object.get(*name).filter(|v| !v.is_null()) {
            None if attribute.mode == AttributeMode::Required => diags.push(
                Diagnostic::error(
                    "Missing required argument",
                    format!("the argument {:?} is required, but no definition was found", name),
                )
                .with_path(attr_path),
            ),
            None => {}
            Some(_) if attribute.is_computed_only() => diags.push(
                Diagnostic::error(
                    "Invalid configuration",
                    format!("{:?} is computed by the service and cannot be set", name),
                )
                .with_path(attr_path),
            ),
            Some(v) => {
                if !type_matches(attribute.ty, v) {
                    diags.push(
                        Diagnostic::error(
                            "Incorrect attribute value type",
                            format!("expected {:?}, got {}", attribute.ty, v),
                        )
                        .with_path(attr_path),
                    );
                }
            }
        }
    }

    for (name, nested) in &block.blocks {
        let block_path = join_path(path, name);
        let set = is_set(object, name);

        for validator in &nested.validators {
            match validator {
                BlockValidator::IsRequired if !set => diags.push(
                    Diagnostic::error(
                        "Missing required block",
                        format!("a {:?} block is required", name),
                    )
                    .with_path(block_path.clone()),
                ),
                BlockValidator::IsRequired => {}
                BlockValidator::ExactlyOneOf(siblings) => {
                    let mut group: Vec<&str> = siblings.iter().copied().collect();
                    group.push(name);
                    group.sort_unstable();
                    let count = group.iter().filter(|n| is_set(object, n)).count();
                    if count != 1 {
                        push_unique(
                            diags,
                            Diagnostic::error(
                                "Invalid attribute combination",
                                format!(
                                    "exactly one of [{}] must be specified, found {}",
                                    group.join(", "),
                                    count
                                ),
                            )
                            .with_path(path),
                        );
                    }
                }
            }
        }

        if !set {
            continue;
        }
        let Some(child) = object.get(*name) else {
            continue;
        };
        match nested.nesting {
            Nesting::Single => validate_block(&nested.block, child, &block_path, diags),
            Nesting::List => match child.as_array() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        let item_path = format!("{}[{}]", block_path, i);
                        validate_block(&nested.block, item, &item_path, diags);
                    }
                }
                None => diags.push(
                    Diagnostic::error("Invalid block", "expected a list of blocks")
                        .with_path(block_path),
                ),
            },
        }
    }
}

fn type_matches(ty: AttributeType, value: &Value) -> bool {
    match ty {
        AttributeType::String => value.is_string(),
        AttributeType::Float64 => value.is_number(),
        AttributeType::Int32 => value
            .as_i64()
            .map(|n| i32::try_from(n).is_ok())
            .unwrap_or(false),
        AttributeType::Bool => value.is_boolean(),
        AttributeType::MapOfString => value
            .as_object()
            .map(|m| m.values().all(Value::is_string))
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_config() -> Value {
        json!({
            "name": "checkout-latency",
            "description": "checkout latency objective",
            "goal": {
                "attainment_goal": 99.9,
                "warning_threshold": 50.0,
                "interval": {"rolling_interval": {"duration": 7, "duration_unit": "DAY"}}
            },
            "sli": {
                "comparison_operator": "LessThan",
                "metric_threshold": 2,
                "sli_metric": {
                    "metric_data_queries": [
                        {
                            "id": "m1",
                            "expression": "FILL(METRICS(), 0)",
                            "period": 60,
                            "return_data": true
                        }
                    ]
                }
            }
        })
    }

    #[test]
    fn test_valid_config_has_no_diagnostics() {
        let diags = service_level_objective_schema().validate(&valid_config());
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    }

    #[test]
    fn test_missing_name_and_goal() {
        let mut config = valid_config();
        let object = config.as_object_mut().unwrap();
        object.remove("name");
        object.remove("goal");

        let diags = service_level_objective_schema().validate(&config);
        let paths: Vec<_> = diags.iter().filter_map(|d| d.path.as_deref()).collect();
        assert!(paths.contains(&"name"));
        assert!(paths.contains(&"goal"));
    }

    #[test]
    fn test_both_sli_kinds_reported_once() {
        let mut config = valid_config();
        config["request_based_sli"] = json!({"comparison_operator": "GreaterThan"});

        let diags = service_level_objective_schema().validate(&config);
        let combos: Vec<_> = diags
            .iter()
            .filter(|d| d.summary == "Invalid attribute combination")
            .collect();
        assert_eq!(combos.len(), 1);
        assert!(combos[0].detail.contains("[request_based_sli, sli]"));
    }

    #[test]
    fn test_neither_interval_variant() {
        let mut config = valid_config();
        config["goal"]["interval"] = json!({});

        let diags = service_level_objective_schema().validate(&config);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].path.as_deref(), Some("goal.interval"));
        assert!(diags[0].detail.contains("found 0"));
    }

    #[test]
    fn test_computed_attribute_cannot_be_set() {
        let mut config = valid_config();
        config["arn"] = json!("arn:aws:application-signals:us-east-1:1:slo/x");

        let diags = service_level_objective_schema().validate(&config);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Invalid configuration");
    }

    #[test]
    fn test_unknown_argument_and_bad_type_in_list() {
        let mut config = valid_config();
        config["sli"]["sli_metric"]["metric_data_queries"][0]["period"] = json!("sixty");
        config["sli"]["sli_metric"]["colour"] = json!("blue");

        let diags = service_level_objective_schema().validate(&config);
        let paths: Vec<_> = diags.iter().filter_map(|d| d.path.clone()).collect();
        assert!(paths.contains(&"sli.sli_metric.metric_data_queries[0].period".to_string()));
        assert!(paths.contains(&"sli.sli_metric.colour".to_string()));
    }

    #[test]
    fn test_int32_range_is_enforced() {
        assert!(type_matches(AttributeType::Int32, &json!(90)));
        assert!(!type_matches(AttributeType::Int32, &json!(5_000_000_000i64)));
        assert!(!type_matches(AttributeType::Int32, &json!(1.5)));
    }

    #[test]
    fn test_computed_attributes() {
        let computed = service_level_objective_schema().computed_attributes();
        assert_eq!(
            computed,
            vec![
                "arn",
                "created_time",
                "evaluation_type",
                "last_updated_time",
                "metric_source_type"
            ]
        );
    }
}
