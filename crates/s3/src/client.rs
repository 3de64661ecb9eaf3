//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from fs3-core.

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;

use fs3_core::{Error, ObjectInfo, ObjectStore, Result, StreamedUpload, SyncConfig};

use crate::multipart;

/// S3 client bound to a single bucket
#[derive(Debug, Clone)]
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Client {
    /// Create a new S3 client from the sync configuration
    ///
    /// Static keys from the config are used when both are present; otherwise
    /// the default AWS credential chain (environment, profile, IMDS) applies.
    pub async fn new(config: &SyncConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.bucket_region.clone()));

        if config.has_static_credentials() {
            let credentials = aws_credential_types::Credentials::new(
                config.aws_access_key_id.clone(),
                config.aws_secret_access_key.clone(),
                None, // session token
                None, // expiry
                "fs3-static-credentials",
            );
            loader = loader.credentials_provider(credentials);
        }

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        // Path-style addressing keeps custom endpoints working
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        tracing::debug!(
            bucket = %config.bucket_name,
            region = %config.bucket_region,
            endpoint = ?config.endpoint,
            "Created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket_name.clone(),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Translate an SDK failure into a core error
pub(crate) fn map_sdk_error<E>(err: aws_sdk_s3::error::SdkError<E>, key: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let code = err.code().unwrap_or_default().to_string();
    let message = DisplayErrorContext(&err).to_string();
    classify(&code, key, message)
}

fn classify(code: &str, key: &str, message: String) -> Error {
    match code {
        "NoSuchKey" | "NotFound" => Error::ObjectNotFound(key.to_string()),
        "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" => Error::Auth(message),
        "NoSuchBucket" => Error::Config(format!("Bucket does not exist: {message}")),
        _ => Error::Network(message),
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_all(&self) -> Result<Vec<ObjectInfo>> {
        let mut items = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let response = self
                .inner
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| map_sdk_error(e, &self.bucket))?;

            for object in response.contents() {
                let key = object.key().unwrap_or_default().to_string();
                let size = object.size().unwrap_or(0).max(0) as u64;
                let mut info = ObjectInfo::file(key, size);

                if let Some(modified) = object.last_modified() {
                    info.last_modified = jiff::Timestamp::from_second(modified.secs()).ok();
                }

                if let Some(etag) = object.e_tag() {
                    info.etag = Some(etag.trim_matches('"').to_string());
                }

                items.push(info);
            }

            if response.is_truncated().unwrap_or(false) {
                continuation_token = response.next_continuation_token().map(|s| s.to_string());
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        tracing::debug!(bucket = %self.bucket, objects = items.len(), "Listed bucket");
        Ok(items)
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn put_object(
        &self,
        key: &str,
        file: tokio::fs::File,
        content_type: Option<String>,
    ) -> Result<()> {
        // Body is read from disk as it is sent, never buffered whole
        let body = ByteStream::read_from()
            .file(file)
            .build()
            .await
            .map_err(|e| Error::General(format!("Failed to open upload body for {key}: {e}")))?;

        self.inner
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .set_content_type(content_type)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;

        tracing::debug!(key, "Put object");
        Ok(())
    }

    async fn put_streamed(
        &self,
        key: &str,
        file: tokio::fs::File,
        size: u64,
        options: StreamedUpload,
    ) -> Result<()> {
        multipart::upload(&self.inner, &self.bucket, key, file, size, options).await
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, key))?;

        tracing::debug!(key, "Deleted object");
        Ok(())
    }
}
