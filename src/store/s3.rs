//! Amazon S3 result store backend.
//!
//! A thin adapter mapping the [`ResultStore`] operations to S3 API calls:
//! `HeadObject`, `GetObject`, `PutObject`, `ListObjectsV2` (cursor = the
//! continuation token), `DeleteObjects`, and the request presigner. The
//! adapter holds no task semantics; compression happens in
//! [`codec`](super::codec) before bytes reach S3, and presigned URLs serve
//! the gzip-encoded artifact as stored.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::info;

use super::codec::{decode_record, encode_record};
use super::{results_key, ObjectMeta, ObjectPage, ResultStore, StoreError};
use crate::constants::{megabytes, DELETE_BATCH_MAX};
use crate::identity::TaskId;
use crate::types::ResultRecord;

/// S3-backed result store.
///
/// # Examples
///
/// ```rust,no_run
/// use taskhub::store::s3::S3Store;
///
/// # async fn example() {
/// // From the standard AWS config chain (env, profile, IMDS):
/// let store = S3Store::from_env("task-hub-results-prod").await;
///
/// // With a pre-built client:
/// let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
/// let client = aws_sdk_s3::Client::new(&config);
/// let store = S3Store::new(client, "task-hub-results-prod");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Creates a store with a pre-built S3 client. The bucket must exist.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Creates a store using the standard AWS SDK config chain.
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), bucket)
    }
}

/// Maps an AWS SDK error to a [`StoreError::Backend`].
fn map_sdk_error(
    err: impl std::error::Error + Send + Sync + 'static,
    key: &str,
) -> StoreError {
    StoreError::backend(format!("S3 error for key {key}: {err}"), err)
}

#[async_trait]
impl ResultStore for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn exists(&self, id: &TaskId) -> Result<bool, StoreError> {
        let key = results_key(id);
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let service = err.into_service_error();
                if service.is_not_found() {
                    Ok(false)
                } else {
                    Err(map_sdk_error(service, &key))
                }
            }
        }
    }

    async fn get(&self, id: &TaskId) -> Result<Option<ResultRecord>, StoreError> {
        let key = results_key(id);
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let service = err.into_service_error();
                if service.is_no_such_key() {
                    return Ok(None);
                }
                return Err(map_sdk_error(service, &key));
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| map_sdk_error(e, &key))?
            .into_bytes();
        decode_record(&bytes).map(Some)
    }

    async fn put(&self, id: &TaskId, record: &ResultRecord) -> Result<(), StoreError> {
        let key = results_key(id);
        let encoded = encode_record(record)?;
        info!(
            bucket = %self.bucket,
            key = %key,
            json_mb = megabytes(encoded.json_len),
            gzip_mb = megabytes(encoded.bytes.len()),
            "stored result record"
        );
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_encoding("gzip")
            .content_type("application/json")
            .body(ByteStream::from(encoded.bytes))
            .send()
            .await
            .map_err(|e| map_sdk_error(e.into_service_error(), &key))?;
        Ok(())
    }

    async fn presigned_url(
        &self,
        id: &TaskId,
        expires_in: Duration,
    ) -> Result<String, StoreError> {
        let key = results_key(id);
        let config = PresigningConfig::expires_in(expires_in).map_err(|e| StoreError::Backend {
            message: format!("invalid presign expiry: {e}"),
            source: None,
        })?;
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .presigned(config)
            .await
            .map_err(|e| map_sdk_error(e.into_service_error(), &key))?;
        Ok(presigned.uri().to_string())
    }

    async fn list(&self, cursor: Option<String>) -> Result<ObjectPage, StoreError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_continuation_token(cursor)
            .send()
            .await
            .map_err(|e| map_sdk_error(e.into_service_error(), "<list>"))?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?.to_string();
                let stamp = obj.last_modified()?;
                let last_modified: DateTime<Utc> =
                    DateTime::from_timestamp(stamp.secs(), stamp.subsec_nanos())?;
                Some(ObjectMeta { key, last_modified })
            })
            .collect();

        Ok(ObjectPage {
            objects,
            next_cursor: output.next_continuation_token().map(str::to_string),
        })
    }

    async fn delete_batch(&self, keys: &[String]) -> Result<usize, StoreError> {
        if keys.len() > DELETE_BATCH_MAX {
            return Err(StoreError::BatchTooLarge {
                len: keys.len(),
                max: DELETE_BATCH_MAX,
            });
        }
        if keys.is_empty() {
            return Ok(0);
        }

        let mut identifiers = Vec::with_capacity(keys.len());
        for key in keys {
            identifiers.push(
                ObjectIdentifier::builder()
                    .key(key)
                    .build()
                    .map_err(|e| map_sdk_error(e, key))?,
            );
        }
        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .build()
            .map_err(|e| map_sdk_error(e, "<delete-batch>"))?;

        let output = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| map_sdk_error(e.into_service_error(), "<delete-batch>"))?;
        Ok(output.deleted().len())
    }
}
