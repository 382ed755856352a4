//! AWS Client
//!
//! Main client for the Application Signals API, combining credentials,
//! region, endpoint and the signed HTTP transport.

use super::http::AwsHttpClient;
use crate::error::ApiError;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use reqwest::Method;
use serde_json::Value;
use url::Url;

/// Page size requested from list operations
pub const LIST_PAGE_SIZE: u32 = 50;

/// Default regional endpoint
pub fn default_endpoint(region: &str) -> String {
    format!("https://application-signals.{}.amazonaws.com", region)
}

/// Main AWS client
#[derive(Clone)]
pub struct AwsClient {
    pub credentials: SharedCredentialsProvider,
    pub http: AwsHttpClient,
    pub region: String,
    endpoint: Url,
}

impl std::fmt::Debug for AwsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsClient")
            .field("credentials", &self.credentials)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

impl AwsClient {
    /// Create a new client. `endpoint` overrides the regional endpoint.
    pub fn new(
        credentials: impl ProvideCredentials + 'static,
        region: &str,
        endpoint: Option<&str>,
    ) -> Result<Self, ApiError> {
        let endpoint = endpoint
            .map(str::to_string)
            .unwrap_or_else(|| default_endpoint(region));
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| ApiError::Request(format!("invalid endpoint {:?}: {}", endpoint, e)))?;

        Ok(Self {
            credentials: SharedCredentialsProvider::new(credentials),
            http: AwsHttpClient::new()?,
            region: region.to_string(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch current credentials (the provider caches and refreshes them)
    /// and send a signed request
    async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
    ) -> Result<Option<Value>, ApiError> {
        let credentials = self
            .credentials
            .provide_credentials()
            .await
            .map_err(|e| ApiError::Credentials(e.to_string()))?;
        self.http
            .send(method, url, body, &credentials, &self.region)
            .await
    }

    /// Make a GET request
    pub async fn get(&self, url: &Url) -> Result<Option<Value>, ApiError> {
        self.send(Method::GET, url, None).await
    }

    /// Make a POST request
    pub async fn post(&self, url: &Url, body: Option<&Value>) -> Result<Option<Value>, ApiError> {
        self.send(Method::POST, url, body).await
    }

    /// Make a PATCH request
    pub async fn patch(&self, url: &Url, body: Option<&Value>) -> Result<Option<Value>, ApiError> {
        self.send(Method::PATCH, url, body).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &Url) -> Result<Option<Value>, ApiError> {
        self.send(Method::DELETE, url, None).await
    }

    // =========================================================================
    // Application Signals API helpers
    // =========================================================================

    /// Build a URL below the endpoint; `path` must already be encoded
    pub fn api_url(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!(
            "{}/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| ApiError::Request(format!("invalid URL {:?}: {}", raw, e)))
    }

    /// Build the collection URL used by create
    pub fn slo_collection_url(&self) -> Result<Url, ApiError> {
        self.api_url("slo")
    }

    /// Build the URL of a single SLO (name or ARN)
    pub fn slo_url(&self, id: &str) -> Result<Url, ApiError> {
        if id.is_empty() {
            return Err(ApiError::Request("empty service level objective id".to_string()));
        }
        self.api_url(&format!("slo/{}", urlencoding::encode(id)))
    }

    /// Build the list URL for one page
    pub fn slos_url(&self, next_token: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.api_url("slos")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("MaxResults", &LIST_PAGE_SIZE.to_string());
            if let Some(token) = next_token {
                query.append_pair("NextToken", token);
            }
        }
        Ok(url)
    }
}
