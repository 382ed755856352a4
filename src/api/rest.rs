//! REST-JSON implementation of [`SloApi`]
//!
//! Maps each operation to its HTTP method and path.

use super::types::{
    CreateServiceLevelObjectiveInput, ListServiceLevelObjectivesOutput, ServiceLevelObjective,
    ServiceLevelObjectiveOutput, UpdateServiceLevelObjectiveInput,
};
use super::SloApi;
use crate::aws::client::AwsClient;
use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;

/// Decode a create/get/update body; an absent body or `Slo` member is `None`
fn decode_slo(body: Option<Value>) -> Result<Option<ServiceLevelObjective>, ApiError> {
    match body {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let output: ServiceLevelObjectiveOutput = serde_json::from_value(value)?;
            Ok(output.slo)
        }
    }
}

#[async_trait]
impl SloApi for AwsClient {
    async fn create_service_level_objective(
        &self,
        input: &CreateServiceLevelObjectiveInput,
    ) -> Result<Option<ServiceLevelObjective>, ApiError> {
        let url = self.slo_collection_url()?;
        let body = serde_json::to_value(input)?;
        decode_slo(self.post(&url, Some(&body)).await?)
    }

    async fn get_service_level_objective(
        &self,
        id: &str,
    ) -> Result<Option<ServiceLevelObjective>, ApiError> {
        let url = self.slo_url(id)?;
        decode_slo(self.get(&url).await?)
    }

    async fn update_service_level_objective(
        &self,
        input: &UpdateServiceLevelObjectiveInput,
    ) -> Result<Option<ServiceLevelObjective>, ApiError> {
        let url = self.slo_url(&input.id)?;
        let body = serde_json::to_value(input)?;
        decode_slo(self.patch(&url, Some(&body)).await?)
    }

    async fn delete_service_level_objective(&self, id: &str) -> Result<(), ApiError> {
        let url = self.slo_url(id)?;
        self.delete(&url).await?;
        Ok(())
    }

    async fn list_service_level_objectives(
        &self,
        next_token: Option<&str>,
    ) -> Result<ListServiceLevelObjectivesOutput, ApiError> {
        let url = self.slos_url(next_token)?;
        match self.post(&url, None).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(ListServiceLevelObjectivesOutput::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_slo_empty_body() {
        assert!(decode_slo(None).unwrap().is_none());
        assert!(decode_slo(Some(Value::Null)).unwrap().is_none());
        assert!(decode_slo(Some(json!({}))).unwrap().is_none());
    }

    #[test]
    fn test_decode_slo_present() {
        let slo = decode_slo(Some(json!({
            "Slo": {
                "Arn": "arn:aws:application-signals:us-east-1:123456789012:slo/a",
                "Name": "a",
                "CreatedTime": 1700000000,
                "EvaluationType": "PeriodBased"
            }
        })))
        .unwrap()
        .unwrap();
        assert_eq!(slo.name, "a");
        assert_eq!(slo.created_time, Some(1700000000.0));
        assert_eq!(slo.evaluation_type.as_deref(), Some("PeriodBased"));
    }
}
