//! 🪣📡 S3 Object Store: the real boat, on the real water.
//!
//! INT. LOCALSTACK CONTAINER, NIGHT. A bucket sits on port 4566, holding one CSV.
//! Somewhere a Rust process builds an SDK client, points it at that port, and asks
//! for the whole object. No paging. No streaming. Just "give me everything".
//!
//! 🧠 Knowledge graph:
//! - Client: `aws-config` defaults + static credentials from `EtlConfig` + region `us-east-1`
//!   + `endpoint_url` from the config, then an S3 config with path-style addressing.
//!   Path style because every S3 emulator on earth expects `http://host:port/bucket/key`.
//! - Retries are disabled. One failed call surfaces immediately.
//! - Optional per-operation timeout from `EtlConfig::operation_timeout`.
//! - SDK errors are sorted into the `EtlError` taxonomy by `classify_service_failure`.
//!
//! 🦆 The duck has no clearance for AWS. It watches from the edge of the VPC.

use std::time::Instant;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use tracing::{debug, error, info};

use crate::app_config::EtlConfig;
use crate::backends::ObjectStore;
use crate::error::EtlError;

// 🏷️ Shows up in SDK debug logs as the origin of the credentials.
const CREDENTIALS_PROVIDER_NAME: &str = "csvferry-config";

/// 🪣 An `ObjectStore` backed by a real S3-compatible endpoint.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    endpoint: String,
}

impl S3ObjectStore {
    /// 🚀 Build the SDK client from the resolved configuration.
    ///
    /// No request is sent here. If the endpoint is a lie, we find out on the first GET.
    pub async fn connect(config: &EtlConfig) -> Self {
        info!("📡 Connecting to S3 at {}", config.endpoint);
        let the_credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let mut the_loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint.clone())
            .credentials_provider(the_credentials)
            .retry_config(RetryConfig::disabled());

        if let Some(timeout) = config.operation_timeout {
            the_loader = the_loader.timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(timeout)
                    .operation_timeout(timeout)
                    .build(),
            );
        }

        let the_sdk_config = the_loader.load().await;
        let the_s3_config = aws_sdk_s3::config::Builder::from(&the_sdk_config)
            .force_path_style(true)
            .build();

        debug!(
            "🔧 S3 client ready for {} in {} (path-style, no retries)",
            config.endpoint, config.region
        );

        Self {
            client: Client::from_conf(the_s3_config),
            endpoint: config.endpoint.clone(),
        }
    }

    fn classify<E>(&self, err: SdkError<E, HttpResponse>, bucket: &str, key: &str) -> EtlError
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
    {
        let message = DisplayErrorContext(&err).to_string();
        match &err {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => EtlError::Connection {
                endpoint: self.endpoint.clone(),
                message,
            },
            SdkError::ServiceError(service) => classify_service_failure(
                service.err().code(),
                service.raw().status().as_u16(),
                bucket,
                key,
                message,
            ),
            _ => EtlError::ObjectStore {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message,
            },
        }
    }
}

/// 🗂️ Sort a service-level failure into the taxonomy by error code, then by HTTP status.
pub(crate) fn classify_service_failure(
    code: Option<&str>,
    status: u16,
    bucket: &str,
    key: &str,
    message: String,
) -> EtlError {
    match (code, status) {
        (Some("NoSuchKey" | "NoSuchBucket" | "NotFound"), _) | (_, 404) => {
            EtlError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }
        }
        (
            Some(
                "InvalidAccessKeyId"
                | "SignatureDoesNotMatch"
                | "AccessDenied"
                | "InvalidToken"
                | "ExpiredToken",
            ),
            _,
        )
        | (_, 401 | 403) => EtlError::Authentication {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message,
        },
        _ => EtlError::ObjectStore {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message,
        },
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, EtlError> {
        let started = Instant::now();

        let the_response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let classified = self.classify(e, bucket, key);
                error!(
                    bucket = %bucket,
                    key = %key,
                    error = %classified,
                    "💀 S3 GetObject failed"
                );
                classified
            })?;

        let the_body = the_response.body.collect().await.map_err(|e| {
            EtlError::Connection {
                endpoint: self.endpoint.clone(),
                message: format!("stream broke while reading s3://{bucket}/{key}: {e}"),
            }
        })?;
        let the_bytes = the_body.into_bytes().to_vec();

        debug!(
            bucket = %bucket,
            key = %key,
            size_bytes = the_bytes.len(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "📥 S3 GetObject done"
        );
        Ok(the_bytes)
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), EtlError> {
        let started = Instant::now();
        let size = body.len();

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("text/csv")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                let classified = self.classify(e, bucket, key);
                error!(
                    bucket = %bucket,
                    key = %key,
                    error = %classified,
                    "💀 S3 PutObject failed"
                );
                classified
            })?;

        debug!(
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "📤 S3 PutObject done"
        );
        Ok(())
    }
}
