//! Integration tests for the Application Signals REST client using wiremock
//!
//! These tests verify the signed HTTP transport and the `SloApi`
//! implementation against mocked endpoints, covering response codes,
//! empty bodies and pagination.

use aws_credential_types::Credentials;
use serde_json::{json, Value};
use slo_binding::api::types::{CreateServiceLevelObjectiveInput, UpdateServiceLevelObjectiveInput};
use slo_binding::api::{
    find_service_level_objective_by_name, list_all_service_level_objectives, SloApi,
};
use slo_binding::aws::client::AwsClient;
use slo_binding::ApiError;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> AwsClient {
    AwsClient::new(
        Credentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            None,
            None,
            "test",
        ),
        "us-east-1",
        Some(&server.uri()),
    )
    .expect("client should build")
}

fn slo_body(name: &str) -> Value {
    json!({
        "Slo": {
            "Arn": format!("arn:aws:application-signals:us-east-1:123456789012:slo/{}", name),
            "Name": name,
            "CreatedTime": 1704067200,
            "LastUpdatedTime": 1704067200,
            "EvaluationType": "PeriodBased",
            "Goal": {
                "Interval": {"RollingInterval": {"Duration": 7, "DurationUnit": "DAY"}},
                "AttainmentGoal": 99.0,
                "WarningThreshold": 30.0
            },
            "Sli": {
                "ComparisonOperator": "LessThan",
                "MetricThreshold": 2.0,
                "SliMetric": {"MetricDataQueries": [{"Id": "m1", "Expression": "m"}]}
            }
        }
    })
}

/// Test module for REST client integration tests
mod rest_client_tests {
    use super::*;

    /// Test create posts a signed JSON body to /slo
    #[tokio::test]
    async fn test_create_posts_signed_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/slo"))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .and(header_exists("amz-sdk-invocation-id"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(json!({"Name": "checkout-latency"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(slo_body("checkout-latency")))
            .expect(1)
            .mount(&server)
            .await;

        let input = CreateServiceLevelObjectiveInput {
            name: "checkout-latency".to_string(),
            ..Default::default()
        };
        let slo = client_for(&server)
            .create_service_level_objective(&input)
            .await
            .expect("create should succeed")
            .expect("response should carry an SLO");

        assert_eq!(slo.name, "checkout-latency");
        assert_eq!(slo.evaluation_type.as_deref(), Some("PeriodBased"));

        let requests = server.received_requests().await.unwrap();
        let authorization = requests[0]
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
        assert!(authorization.contains("/us-east-1/application-signals/aws4_request"));
    }

    /// Test typed not-found error from the service
    #[tokio::test]
    async fn test_get_resource_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slo/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header("x-amzn-ErrorType", "ResourceNotFoundException")
                    .set_body_json(json!({"Message": "Slo missing not found"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_service_level_objective("missing")
            .await
            .unwrap_err();
        match err {
            ApiError::NotFound { message } => assert_eq!(message, "Slo missing not found"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    /// Test a successful response without a body yields no SLO
    #[tokio::test]
    async fn test_get_empty_body_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slo/hollow"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.get_service_level_objective("hollow").await.unwrap().is_none());

        let err = find_service_level_objective_by_name(&client, "hollow")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    /// Test update sends PATCH to the named SLO without a Name member
    #[tokio::test]
    async fn test_update_patches_by_name() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/slo/checkout-latency"))
            .respond_with(ResponseTemplate::new(200).set_body_json(slo_body("checkout-latency")))
            .expect(1)
            .mount(&server)
            .await;

        let input = UpdateServiceLevelObjectiveInput {
            id: "checkout-latency".to_string(),
            description: Some("tightened".to_string()),
            ..Default::default()
        };
        client_for(&server)
            .update_service_level_objective(&input)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body, json!({"Description": "tightened"}));
    }

    /// Test delete succeeds on an empty object body
    #[tokio::test]
    async fn test_delete_success() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/slo/checkout-latency"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .delete_service_level_objective("checkout-latency")
            .await
            .expect("delete should succeed");
    }

    /// Test 500 response is a service error, not not-found
    #[tokio::test]
    async fn test_500_is_service_error() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/slo/flaky"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"__type": "InternalServerException", "message": "boom"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .delete_service_level_objective("flaky")
            .await
            .unwrap_err();
        match err {
            ApiError::Service {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 500);
                assert_eq!(code, "InternalServerException");
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    /// Test list follows NextToken until exhausted
    #[tokio::test]
    async fn test_list_paginates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/slos"))
            .and(query_param("NextToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "SloSummaries": [{"Arn": "arn:c", "Name": "c"}]
            })))
            .with_priority(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/slos"))
            .and(query_param("MaxResults", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "SloSummaries": [{"Arn": "arn:a", "Name": "a"}, {"Arn": "arn:b", "Name": "b"}],
                "NextToken": "page-2"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let all = list_all_service_level_objectives(&client).await.unwrap();
        let names: Vec<_> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    /// Test session credentials add the security token header
    #[tokio::test]
    async fn test_session_token_header() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slo/a"))
            .and(header("x-amz-security-token", "session-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(slo_body("a")))
            .expect(1)
            .mount(&server)
            .await;

        let client = AwsClient::new(
            Credentials::new("AKID", "secret", Some("session-token".to_string()), None, "test"),
            "eu-west-1",
            Some(&server.uri()),
        )
        .unwrap();
        assert!(client.get_service_level_objective("a").await.unwrap().is_some());
    }
}

/// End-to-end lifecycle through the HTTP transport
mod lifecycle_tests {
    use super::*;
    use slo_binding::resource::{
        ReadOutcome, ServiceLevelObjectiveModel, ServiceLevelObjectiveResource,
    };
    use slo_binding::{MappingError, ResourceError};
    use std::sync::Arc;

    /// Test read removes state when the SLO is gone remotely
    #[tokio::test]
    async fn test_read_not_found_removes() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slo/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let resource = ServiceLevelObjectiveResource::new(Arc::new(client_for(&server)));
        let outcome = resource
            .read(&ServiceLevelObjectiveModel::new("gone"))
            .await
            .expect("not found is not an error");
        assert!(matches!(outcome, ReadOutcome::Removed(_)));
    }

    /// Test import then read fills the state
    #[tokio::test]
    async fn test_import_then_read() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slo/checkout-latency"))
            .respond_with(ResponseTemplate::new(200).set_body_json(slo_body("checkout-latency")))
            .mount(&server)
            .await;

        let resource = ServiceLevelObjectiveResource::new(Arc::new(client_for(&server)));
        let seed = resource.import_state("checkout-latency").unwrap();
        match resource.read(&seed).await.unwrap() {
            ReadOutcome::Found(state) => {
                assert_eq!(state.created_time.as_deref(), Some("2024-01-01T00:00:00Z"));
                assert!(state.sli().is_some());
                assert!(state.goal.is_some());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    /// Test delete of an absent SLO succeeds
    #[tokio::test]
    async fn test_delete_not_found_is_success() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/slo/gone"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(
                    json!({"__type": "ResourceNotFoundException", "message": "gone"}),
                ),
            )
            .mount(&server)
            .await;

        let resource = ServiceLevelObjectiveResource::new(Arc::new(client_for(&server)));
        resource
            .delete(&ServiceLevelObjectiveModel::new("gone"))
            .await
            .expect("already deleted is success");
    }

    /// Test read of an empty monitored request count union is a mapping error
    #[tokio::test]
    async fn test_read_empty_monitored_count_is_mapping_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slo/availability"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Slo": {
                    "Arn": "arn:aws:application-signals:us-east-1:123456789012:slo/availability",
                    "Name": "availability",
                    "Goal": {
                        "Interval": {"RollingInterval": {"Duration": 7, "DurationUnit": "DAY"}},
                        "AttainmentGoal": 99.0,
                        "WarningThreshold": 30.0
                    },
                    "RequestBasedSli": {
                        "RequestBasedSliMetric": {
                            "TotalRequestCountMetric": [{"Id": "total", "Expression": "m"}],
                            "MonitoredRequestCountMetric": {}
                        }
                    }
                }
            })))
            .mount(&server)
            .await;

        let resource = ServiceLevelObjectiveResource::new(Arc::new(client_for(&server)));
        let seed = resource.import_state("availability").unwrap();
        let err = resource.read(&seed).await.unwrap_err();
        match err {
            ResourceError::Mapping {
                source: MappingError::MissingVariant { path, .. },
                ..
            } => assert_eq!(
                path,
                "request_based_sli.request_based_sli_metric.monitored_request_count_metric"
            ),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    /// Test create answered with an empty interval union is a mapping error
    #[tokio::test]
    async fn test_create_empty_interval_is_mapping_error() {
        let server = MockServer::start().await;

        let mut body = slo_body("checkout-latency");
        body["Slo"]["Goal"]["Interval"] = json!({});
        Mock::given(method("POST"))
            .and(path("/slo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let plan: ServiceLevelObjectiveModel = serde_json::from_value(json!({
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
        }))
        .unwrap();

        let resource = ServiceLevelObjectiveResource::new(Arc::new(client_for(&server)));
        let err = resource.create(&plan).await.unwrap_err();
        match err {
            ResourceError::Mapping {
                source: MappingError::MissingVariant { path, .. },
                ..
            } => assert_eq!(path, "goal.interval"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
