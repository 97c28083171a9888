use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::{ByteStream, DateTime as AwsDateTime};
use aws_sdk_s3::types::{ObjectCannedAcl, ServerSideEncryption};
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

use cdn_core::SpacesConfig;

use crate::{
    BlobError, BlobResult, BlobStore, GetResult, ListPage, ObjectAcl, ObjectHead, ObjectSummary,
    PutResult,
};

/// S3-compatible object store (DigitalOcean Spaces, MinIO, AWS S3).
#[derive(Clone)]
pub struct S3CompatibleStore {
    client: Client,
    bucket: String,
}

impl S3CompatibleStore {
    pub async fn new(spaces: &SpacesConfig) -> BlobResult<Self> {
        if spaces.name.is_empty() {
            return Err(BlobError::invalid("bucket name is required"));
        }
        let client = Self::create_client(spaces).await;
        Ok(Self::from_client(client, spaces.name.clone()))
    }

    pub fn from_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    async fn create_client(spaces: &SpacesConfig) -> Client {
        let credentials = Credentials::new(
            spaces.access_key.clone(),
            spaces.secret_key.clone(),
            None,
            None,
            "spaces",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(spaces.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &spaces.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let aws_config = loader.load().await;

        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(true)
                .build(),
        )
    }

    fn map_aws_error(err: impl std::error::Error + Send + Sync + 'static) -> BlobError {
        BlobError::backend(err)
    }

    fn canned_acl(acl: ObjectAcl) -> ObjectCannedAcl {
        match acl {
            ObjectAcl::Private => ObjectCannedAcl::Private,
            ObjectAcl::PublicRead => ObjectCannedAcl::PublicRead,
        }
    }
}

fn to_chrono(dt: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

#[async_trait]
impl BlobStore for S3CompatibleStore {
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        acl: ObjectAcl,
    ) -> BlobResult<PutResult> {
        let size_bytes = body.len() as u64;

        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .content_length(size_bytes as i64)
            .acl(Self::canned_acl(acl))
            .server_side_encryption(ServerSideEncryption::Aes256)
            .send()
            .await
            .map_err(Self::map_aws_error)?;

        debug!(bucket = %self.bucket, key, size_bytes, "object stored");

        Ok(PutResult {
            etag: result.e_tag().map(str::to_string),
            size_bytes,
        })
    }

    async fn get(&self, key: &str) -> BlobResult<GetResult> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|s| s.is_no_such_key()).unwrap_or(false) {
                    BlobError::not_found(key)
                } else {
                    Self::map_aws_error(e)
                }
            })?;

        let head = ObjectHead {
            size_bytes: result.content_length().unwrap_or(0) as u64,
            content_type: result.content_type().map(str::to_string),
            etag: result.e_tag().map(str::to_string),
            last_modified: result.last_modified().and_then(to_chrono),
        };

        let body = result.body.collect().await.map_err(Self::map_aws_error)?;

        Ok(GetResult {
            body: body.into_bytes(),
            head,
        })
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|s| s.is_not_found()).unwrap_or(false) {
                    BlobError::not_found(key)
                } else {
                    Self::map_aws_error(e)
                }
            })?;

        Ok(ObjectHead {
            size_bytes: result.content_length().unwrap_or(0) as u64,
            content_type: result.content_type().map(str::to_string),
            etag: result.e_tag().map(str::to_string),
            last_modified: result.last_modified().and_then(to_chrono),
        })
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(Self::map_aws_error)?;
        Ok(())
    }

    async fn list_page(&self, continuation: Option<&str>) -> BlobResult<ListPage> {
        let result = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_continuation_token(continuation.map(str::to_string))
            .send()
            .await
            .map_err(Self::map_aws_error)?;

        let objects = result
            .contents()
            .iter()
            .filter_map(|object| {
                object.key().map(|key| ObjectSummary {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0).max(0) as u64,
                    last_modified: object.last_modified().and_then(to_chrono),
                })
            })
            .collect();

        Ok(ListPage {
            objects,
            next_token: result.next_continuation_token().map(str::to_string),
            is_truncated: result.is_truncated().unwrap_or(false),
        })
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
