//! AWS SDK S3 client implementation.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::copy_object::builders::CopyObjectFluentBuilder;
use aws_sdk_s3::operation::head_object::HeadObjectOutput;
use aws_sdk_s3::primitives::{DateTime, DateTimeFormat};
use aws_sdk_s3::types::{MetadataDirective, ServerSideEncryption, StorageClass};
use aws_sdk_s3::Client as S3Client;

use rusty_cache_control_storage::{
    MetadataReplacement, RemoteObjectSnapshot, StorageClient, StorageConfig, StorageError,
    StorageSettings,
};

use crate::error::CrtError;

/// StorageClient implementation using AWS SDK for Rust.
///
/// Works against AWS S3 and S3-compatible stores (custom endpoint plus
/// path-style addressing). Retries and connection pooling are left to the SDK.
pub struct CrtStorageClient {
    /// The underlying S3 client.
    s3_client: S3Client,
    /// Expected bucket owner for security validation.
    expected_bucket_owner: Option<String>,
}

impl CrtStorageClient {
    /// Create a new CRT storage client.
    ///
    /// # Arguments
    /// * `settings` - Region, endpoint and optional static credentials.
    ///   Without credentials the default credential chain is used.
    ///
    /// # Returns
    /// A new CRT storage client.
    pub async fn new(settings: StorageSettings) -> Result<Self, StorageError> {
        validate_settings(&settings)?;

        let mut config_loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(ref region) = settings.region {
            config_loader = config_loader.region(Region::new(region.clone()));
        }

        if let Some(ref creds) = settings.credentials {
            let credentials = Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                creds.session_token.clone(),
                None,
                "rusty-cache-control",
            );
            config_loader = config_loader.credentials_provider(credentials);
        }

        let sdk_config = config_loader.load().await;
        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);

        if let Some(ref endpoint) = settings.endpoint {
            s3_config = s3_config.endpoint_url(endpoint);
        }
        if settings.force_path_style {
            s3_config = s3_config.force_path_style(true);
        }
        if let Some(timeout) = settings.operation_timeout {
            s3_config = s3_config
                .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build());
        }

        Ok(Self {
            s3_client: S3Client::from_conf(s3_config.build()),
            expected_bucket_owner: settings.expected_bucket_owner,
        })
    }

    /// Create a client for one storage's configuration.
    ///
    /// # Arguments
    /// * `config` - Storage configuration
    pub async fn for_storage(config: &StorageConfig) -> Result<Self, StorageError> {
        Self::new(StorageSettings::from(config)).await
    }

    /// Build the in-place COPY that rewrites an object's metadata.
    ///
    /// Everything observed by the HEAD is re-specified, system metadata
    /// included, since REPLACE resets whatever is omitted.
    fn copy_request(
        &self,
        bucket: &str,
        key: &str,
        replacement: &MetadataReplacement,
    ) -> CopyObjectFluentBuilder {
        let mut request = self
            .s3_client
            .copy_object()
            .bucket(bucket)
            .key(key)
            .copy_source(format!("{}/{}", bucket, encode_key(key)))
            .metadata_directive(MetadataDirective::Replace)
            .cache_control(&replacement.cache_control)
            .set_content_type(replacement.content_type.clone())
            .set_content_encoding(replacement.content_encoding.clone())
            .set_content_disposition(replacement.content_disposition.clone())
            .set_content_language(replacement.content_language.clone())
            .set_expires(replacement.expires.as_deref().and_then(parse_expires))
            .set_website_redirect_location(replacement.website_redirect_location.clone())
            .set_storage_class(replacement.storage_class.as_deref().map(StorageClass::from))
            .set_server_side_encryption(
                replacement
                    .server_side_encryption
                    .as_deref()
                    .map(ServerSideEncryption::from),
            )
            .set_ssekms_key_id(replacement.ssekms_key_id.clone())
            .set_bucket_key_enabled(replacement.bucket_key_enabled)
            .set_metadata(Some(replacement.metadata.clone()));

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request
                .expected_bucket_owner(owner)
                .expected_source_bucket_owner(owner);
        }
        request
    }

    /// Create a client from an existing S3Client (for testing).
    ///
    /// # Arguments
    /// * `s3_client` - Pre-configured S3 client
    /// * `expected_bucket_owner` - Optional expected bucket owner
    pub fn from_client(s3_client: S3Client, expected_bucket_owner: Option<String>) -> Self {
        Self {
            s3_client,
            expected_bucket_owner,
        }
    }
}

#[async_trait]
impl StorageClient for CrtStorageClient {
    fn expected_bucket_owner(&self) -> Option<&str> {
        self.expected_bucket_owner.as_deref()
    }

    async fn head_object_with_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<RemoteObjectSnapshot>, StorageError> {
        let mut request = self.s3_client.head_object().bucket(bucket).key(key);

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        match request.send().await {
            Ok(output) => Ok(Some(snapshot_from(&output))),
            Err(err) => {
                let status: Option<u16> = status_of(&err);
                let not_found: bool = status == Some(404)
                    || err.as_service_error().is_some_and(|e| e.is_not_found());
                if not_found {
                    Ok(None)
                } else {
                    Err(classify(status, DisplayErrorContext(&err).to_string(), bucket, key))
                }
            }
        }
    }

    async fn copy_object_metadata(
        &self,
        bucket: &str,
        key: &str,
        replacement: &MetadataReplacement,
    ) -> Result<(), StorageError> {
        self.copy_request(bucket, key, replacement)
            .send()
            .await
            .map_err(|err| {
                classify(status_of(&err), DisplayErrorContext(&err).to_string(), bucket, key)
            })?;

        log::debug!("Replaced metadata of s3://{}/{}", bucket, key);
        Ok(())
    }
}

/// URL-encode an object key for use in a copy source, keeping `/` separators.
///
/// # Arguments
/// * `key` - Object key
///
/// # Example
/// ```
/// use rusty_cache_control_storage_crt::encode_key;
///
/// assert_eq!(encode_key("images/my logo+1.png"), "images/my%20logo%2B1.png");
/// ```
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<String>>()
        .join("/")
}

/// Reject settings the SDK would only fail on at request time.
fn validate_settings(settings: &StorageSettings) -> Result<(), CrtError> {
    if let Some(ref endpoint) = settings.endpoint {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(CrtError::ConfigError(format!(
                "endpoint '{}' must be an http(s) URL",
                endpoint
            )));
        }
    }
    if let Some(ref region) = settings.region {
        if region.trim().is_empty() {
            return Err(CrtError::ConfigError("region must not be blank".to_string()));
        }
    }
    if settings.operation_timeout.is_some_and(|timeout| timeout.is_zero()) {
        return Err(CrtError::ConfigError(
            "operation timeout must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Parse an `Expires` header value. Unparseable values are dropped, as S3
/// itself would not serve them back.
fn parse_expires(value: &str) -> Option<DateTime> {
    match DateTime::from_str(value, DateTimeFormat::HttpDate) {
        Ok(expires) => Some(expires),
        Err(err) => {
            log::warn!("Dropping unparseable Expires header '{}': {}", value, err);
            None
        }
    }
}

fn snapshot_from(output: &HeadObjectOutput) -> RemoteObjectSnapshot {
    RemoteObjectSnapshot {
        cache_control: output.cache_control().map(str::to_string),
        content_type: output.content_type().map(str::to_string),
        content_encoding: output.content_encoding().map(str::to_string),
        content_disposition: output.content_disposition().map(str::to_string),
        content_language: output.content_language().map(str::to_string),
        expires: output.expires_string().map(str::to_string),
        website_redirect_location: output.website_redirect_location().map(str::to_string),
        storage_class: output.storage_class().map(|class| class.as_str().to_string()),
        server_side_encryption: output
            .server_side_encryption()
            .map(|sse| sse.as_str().to_string()),
        ssekms_key_id: output.ssekms_key_id().map(str::to_string),
        bucket_key_enabled: output.bucket_key_enabled(),
        metadata: output.metadata().cloned().unwrap_or_default(),
        last_modified: output.last_modified().map(|dt| dt.secs()),
    }
}

fn status_of<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|response| response.status().as_u16())
}

/// Map an HTTP status (if a response was received) to a storage error.
fn classify(status: Option<u16>, message: String, bucket: &str, key: &str) -> StorageError {
    match status {
        Some(403) => StorageError::AccessDenied {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message,
        },
        Some(404) => StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        Some(429) | Some(503) => StorageError::Throttled { message },
        Some(code) if code >= 500 => StorageError::NetworkError {
            message,
            retryable: true,
        },
        Some(_) => StorageError::Other { message },
        // No response at all: dispatch failure or timeout.
        None => CrtError::SdkError {
            message,
            retryable: true,
        }
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn offline_client(owner: Option<String>) -> CrtStorageClient {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        CrtStorageClient::from_client(S3Client::from_conf(config), owner)
    }

    #[test]
    fn test_crt_client_implements_storage_client() {
        fn assert_storage_client<T: StorageClient>() {}
        assert_storage_client::<CrtStorageClient>();
    }

    #[test]
    fn test_expected_bucket_owner() {
        let client = offline_client(Some("123456789012".to_string()));
        assert_eq!(client.expected_bucket_owner(), Some("123456789012"));
        assert_eq!(offline_client(None).expected_bucket_owner(), None);
    }

    #[test]
    fn test_encode_key_keeps_separators() {
        assert_eq!(encode_key("cdn-assets/images/logo.png"), "cdn-assets/images/logo.png");
        assert_eq!(encode_key("a b/ü.png"), "a%20b/%C3%BC.png");
    }

    #[test]
    fn test_classify_statuses() {
        assert!(matches!(
            classify(Some(403), "denied".into(), "b", "k"),
            StorageError::AccessDenied { .. }
        ));
        assert!(matches!(
            classify(Some(503), "slow down".into(), "b", "k"),
            StorageError::Throttled { .. }
        ));
        assert!(classify(Some(500), "oops".into(), "b", "k").is_retryable());
        assert!(!classify(Some(400), "bad".into(), "b", "k").is_retryable());
        assert!(matches!(
            classify(None, "timeout".into(), "b", "k"),
            StorageError::NetworkError { retryable: true, .. }
        ));
    }

    #[test]
    fn test_validate_settings() {
        let mut settings = StorageSettings {
            endpoint: Some("minio:9000".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(CrtError::ConfigError(_))
        ));

        settings.endpoint = Some("http://minio:9000".to_string());
        assert!(validate_settings(&settings).is_ok());

        settings.region = Some(" ".to_string());
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_zero_operation_timeout_is_rejected() {
        let settings = StorageSettings {
            operation_timeout: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(CrtError::ConfigError(_))
        ));
    }

    #[test]
    fn test_snapshot_reads_system_metadata() {
        let output = HeadObjectOutput::builder()
            .cache_control("no-cache")
            .storage_class(StorageClass::StandardIa)
            .server_side_encryption(ServerSideEncryption::AwsKms)
            .ssekms_key_id("arn:aws:kms:eu-west-1:111122223333:key/logo")
            .bucket_key_enabled(true)
            .expires_string("Thu, 01 Jan 2037 00:00:00 GMT")
            .website_redirect_location("/images/logo-v2.png")
            .build();

        let snapshot = snapshot_from(&output);
        assert_eq!(snapshot.cache_control.as_deref(), Some("no-cache"));
        assert_eq!(snapshot.storage_class.as_deref(), Some("STANDARD_IA"));
        assert_eq!(snapshot.server_side_encryption.as_deref(), Some("aws:kms"));
        assert_eq!(snapshot.bucket_key_enabled, Some(true));
        assert_eq!(
            snapshot.expires.as_deref(),
            Some("Thu, 01 Jan 2037 00:00:00 GMT")
        );
        assert_eq!(
            snapshot.website_redirect_location.as_deref(),
            Some("/images/logo-v2.png")
        );
    }

    #[test]
    fn test_copy_request_keeps_system_metadata() {
        let snapshot = RemoteObjectSnapshot {
            content_type: Some("image/png".to_string()),
            content_language: Some("en-GB".to_string()),
            expires: Some("Thu, 01 Jan 2037 00:00:00 GMT".to_string()),
            website_redirect_location: Some("/images/logo-v2.png".to_string()),
            storage_class: Some("STANDARD_IA".to_string()),
            server_side_encryption: Some("aws:kms".to_string()),
            ssekms_key_id: Some("arn:aws:kms:eu-west-1:111122223333:key/logo".to_string()),
            bucket_key_enabled: Some(true),
            ..Default::default()
        };
        let replacement = MetadataReplacement::from_snapshot(&snapshot, "public, max-age=60");
        let request = offline_client(None).copy_request("my-bucket", "logo.png", &replacement);

        assert_eq!(request.get_metadata_directive(), &Some(MetadataDirective::Replace));
        assert_eq!(request.get_cache_control().as_deref(), Some("public, max-age=60"));
        assert_eq!(request.get_content_language().as_deref(), Some("en-GB"));
        assert_eq!(request.get_storage_class(), &Some(StorageClass::StandardIa));
        assert_eq!(
            request.get_server_side_encryption(),
            &Some(ServerSideEncryption::AwsKms)
        );
        assert_eq!(request.get_ssekms_key_id(), &snapshot.ssekms_key_id);
        assert_eq!(request.get_bucket_key_enabled(), &Some(true));
        assert_eq!(
            request.get_expires().as_ref().map(|expires| expires.secs()),
            Some(2_114_380_800)
        );
        assert_eq!(
            request.get_website_redirect_location().as_deref(),
            Some("/images/logo-v2.png")
        );
    }

    #[test]
    fn test_unparseable_expires_is_dropped() {
        assert!(parse_expires("next tuesday").is_none());
        assert_eq!(
            parse_expires("Thu, 01 Jan 2037 00:00:00 GMT").map(|expires| expires.secs()),
            Some(2_114_380_800)
        );
    }

    #[tokio::test]
    async fn test_invalid_endpoint_is_invalid_config() {
        let settings = StorageSettings {
            endpoint: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            CrtStorageClient::new(settings).await,
            Err(StorageError::InvalidConfig { .. })
        ));
    }
}
