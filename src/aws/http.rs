//! HTTP utilities for AWS REST-JSON API calls

use crate::error::ApiError;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    sign, SignableBody, SignableRequest, SigningParams, SigningSettings,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::SystemTime;
use url::Url;
use uuid::Uuid;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const USER_AGENT: &str = concat!("slo-binding/", env!("CARGO_PKG_VERSION"));

/// SigV4 signing name of the service
pub const SIGNING_NAME: &str = "application-signals";

/// Error type the service uses for missing objects
const NOT_FOUND_ERROR_TYPE: &str = "ResourceNotFoundException";

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Compute the SigV4 headers (`authorization`, `x-amz-date` and, for session
/// credentials, `x-amz-security-token`) for one request
pub fn sign_headers(
    method: &Method,
    url: &Url,
    headers: &[(&str, &str)],
    payload: &[u8],
    credentials: &Credentials,
    region: &str,
) -> Result<Vec<(String, String)>, ApiError> {
    let identity: Identity = credentials.clone().into();
    let params: SigningParams<'_> = v4::SigningParams::builder()
        .identity(&identity)
        .region(region)
        .name(SIGNING_NAME)
        .time(SystemTime::now())
        .settings(SigningSettings::default())
        .build()
        .map_err(|e| ApiError::Signing(e.to_string()))?
        .into();

    let request = SignableRequest::new(
        method.as_str(),
        url.as_str(),
        headers.iter().copied(),
        SignableBody::Bytes(payload),
    )
    .map_err(|e| ApiError::Signing(e.to_string()))?;

    let (instructions, _signature) = sign(request, &params)
        .map_err(|e| ApiError::Signing(e.to_string()))?
        .into_parts();

    Ok(instructions
        .headers()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect())
}

/// HTTP client wrapper for signed AWS API calls
#[derive(Clone)]
pub struct AwsHttpClient {
    client: Client,
}

impl AwsHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    /// Send a signed request.
    ///
    /// Returns `Ok(None)` for a successful response with an empty body.
    pub async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Value>,
        credentials: &Credentials,
        region: &str,
    ) -> Result<Option<Value>, ApiError> {
        tracing::debug!("{} {}", method, url);

        let payload = match body {
            Some(body) => serde_json::to_vec(body)?,
            None => Vec::new(),
        };

        let unsigned: &[(&str, &str)] = if body.is_some() {
            &[("content-type", "application/json")]
        } else {
            &[]
        };
        let signed = sign_headers(&method, url, unsigned, &payload, credentials, region)?;

        let mut headers = HeaderMap::new();
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        for (name, value) in &signed {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::Signing(format!("invalid header name: {}", e)))?;
            headers.insert(name, header_value(value)?);
        }
        headers.insert(
            "amz-sdk-invocation-id",
            header_value(&Uuid::new_v4().to_string())?,
        );

        let response = self
            .client
            .request(method, url.clone())
            .headers(headers)
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let error_type = response
            .headers()
            .get("x-amzn-errortype")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let response_body = response.text().await?;

        if !status.is_success() {
            let err = classify_error(status, error_type.as_deref(), &response_body);
            // Not-found is expected on refresh and delete
            if err.is_not_found() {
                tracing::debug!("Not found: {}", status);
            } else {
                // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
                tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            }
            return Err(err);
        }

        // Handle empty response
        if response_body.trim().is_empty() {
            return Ok(None);
        }

        tracing::debug!("Response: {}", sanitize_for_log(&response_body));
        Ok(Some(serde_json::from_str(&response_body)?))
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value)
        .map_err(|e| ApiError::Request(format!("invalid header value: {}", e)))
}

/// Turn a non-success response into a typed error.
///
/// The error type comes from the `x-amzn-ErrorType` header, else from the
/// `__type` or `code` body member.
pub fn classify_error(status: StatusCode, error_type: Option<&str>, body: &str) -> ApiError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let body_field = |names: &[&str]| -> Option<String> {
        let object = parsed.as_ref()?.as_object()?;
        names
            .iter()
            .find_map(|name| object.get(*name).and_then(|v| v.as_str()))
            .map(str::to_string)
    };

    let code = error_type
        .map(str::to_string)
        .or_else(|| body_field(&["__type", "code", "Code"]))
        .map(|raw| sanitize_error_code(&raw))
        .filter(|c| !c.is_empty());
    let message = body_field(&["message", "Message"])
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    match code {
        Some(code) if code == NOT_FOUND_ERROR_TYPE => ApiError::NotFound { message },
        None if status == StatusCode::NOT_FOUND => ApiError::NotFound { message },
        code => ApiError::Service {
            status: status.as_u16(),
            code: code.unwrap_or_else(|| status.as_u16().to_string()),
            message,
        },
    }
}

/// `aws.protocoltests#ResourceNotFoundException:http://...` -> `ResourceNotFoundException`
fn sanitize_error_code(raw: &str) -> String {
    let without_suffix = raw.split(':').next().unwrap_or(raw);
    without_suffix
        .rsplit('#')
        .next()
        .unwrap_or(without_suffix)
        .trim()
        .to_string()
}

/// Format an API error for display
/// Security: Generic messages avoid echoing request details back to the user
pub fn format_api_error(error: &ApiError) -> String {
    match error {
        ApiError::NotFound { .. } => "Resource not found.".to_string(),
        ApiError::Service { status: 401, .. } | ApiError::Service { status: 403, .. } => {
            "Permission denied. Check your AWS credentials and IAM permissions.".to_string()
        }
        ApiError::Service { status: 429, .. } => {
            "Rate limit exceeded. Please try again later.".to_string()
        }
        ApiError::Service { status, .. } if *status >= 500 => {
            "Application Signals temporarily unavailable. Please try again.".to_string()
        }
        ApiError::Service { code, message, .. } => {
            let message: String = message
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(120)
                .collect();
            format!("{}: {}", code, message)
        }
        ApiError::Transport(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        }
        ApiError::Decode(_) => "Unexpected response from the service.".to_string(),
        ApiError::Credentials(_) | ApiError::Signing(_) => {
            "Could not sign the request. Check your AWS credentials.".to_string()
        }
        ApiError::Request(message) => message.clone(),
    }
}
