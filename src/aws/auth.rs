//! AWS Authentication
//!
//! Credentials and region come from the standard AWS provider chain
//! (environment, shared config/credentials files, SSO, container and
//! instance metadata) via `aws-config`.

use crate::error::ConfigError;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};

/// Region used when nothing else is configured
pub const FALLBACK_REGION: &str = "us-east-1";

/// Resolved region and credentials provider
#[derive(Debug, Clone)]
pub struct AwsContext {
    pub region: String,
    pub credentials: SharedCredentialsProvider,
}

/// Resolve region and credentials.
///
/// An explicit region wins over the provider chain; without either the
/// fallback region is used. Credentials are fetched once here so a missing
/// or broken profile fails before any request is built.
pub async fn resolve(explicit_region: Option<String>) -> Result<AwsContext, ConfigError> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = explicit_region {
        loader = loader.region(Region::new(region));
    }
    let sdk_config = loader.load().await;

    let region = sdk_config
        .region()
        .map(|r| r.as_ref().to_string())
        .unwrap_or_else(|| FALLBACK_REGION.to_string());
    // Security: the region ends up in the endpoint host
    if !validate_region(&region) {
        return Err(ConfigError::InvalidRegion(region));
    }

    let credentials = sdk_config.credentials_provider().ok_or_else(|| {
        ConfigError::Credentials("no credentials provider is configured".to_string())
    })?;
    credentials
        .provide_credentials()
        .await
        .map_err(|e| ConfigError::Credentials(e.to_string()))?;
    tracing::debug!("Resolved credentials for region {}", region);

    Ok(AwsContext {
        region,
        credentials,
    })
}

/// Validate an AWS region name, e.g. `eu-west-1` or `us-gov-east-1`
pub fn validate_region(region: &str) -> bool {
    let parts: Vec<&str> = region.split('-').collect();
    if parts.len() < 3 {
        return false;
    }
    let Some(last) = parts.last() else {
        return false;
    };
    !last.is_empty()
        && last.chars().all(|c| c.is_ascii_digit())
        && parts[..parts.len() - 1]
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_lowercase()))
}
