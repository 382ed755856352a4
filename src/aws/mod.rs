//! AWS API interaction module
//!
//! This module provides the transport for talking to the Application Signals
//! API: credential resolution, request signing and the HTTP client.
//!
//! # Module Structure
//!
//! - [`auth`] - credentials and region from the AWS provider chain
//! - [`http`] - SigV4-signed JSON requests and error classification
//! - [`client`] - main client for the Application Signals endpoint
//!
//! # Example
//!
//! ```ignore
//! use slo_binding::aws::{auth, client::AwsClient};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let aws = auth::resolve(None).await?;
//!     let client = AwsClient::new(aws.credentials, &aws.region, None)?;
//!     let slo = client.get(&client.slo_url("checkout-latency")?).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
