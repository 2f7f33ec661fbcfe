//! [`ObjectStore`] on top of `aws-sdk-s3`.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Bucket, Object};

use super::{
    BucketSummary, ByteRange, DeleteOutcome, ObjectBody, ObjectPage, ObjectStore, ObjectSummary,
    PutOutcome, PutRequest,
};
use crate::core::config::AwsConfig;
use crate::domains::adapters::aws::{classify_sdk_error, load_sdk_config, optional, timestamp};
use crate::domains::adapters::failure::{BackendFailure, FailureClass};
use crate::domains::adapters::session::Connector;

/// S3 error codes with a known meaning.
fn classify(code: &str, _message: &str) -> Option<FailureClass> {
    let class = match code {
        "NoSuchKey" | "NoSuchBucket" | "NotFound" | "NoSuchVersion" => FailureClass::NotFound,
        "SlowDown" | "503 SlowDown" => FailureClass::Throttled,
        "InvalidRange" | "InvalidArgument" | "InvalidBucketName" | "KeyTooLongError" => {
            FailureClass::BadRequest
        }
        "BucketAlreadyExists" | "BucketAlreadyOwnedByYou" | "OperationAborted" => {
            FailureClass::Conflict
        }
        "AllAccessDisabled" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" => {
            FailureClass::AccessDenied
        }
        _ => return None,
    };
    Some(class)
}

pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>, BackendFailure> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|err| classify_sdk_error(err, classify))?;

        let buckets: &[Bucket] = optional(output.buckets()).unwrap_or_default();
        Ok(buckets
            .iter()
            .map(|bucket| BucketSummary {
                name: optional::<&str>(bucket.name()).unwrap_or_default().to_string(),
                creation_date: bucket.creation_date().and_then(timestamp),
            })
            .collect())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        max_keys: i32,
        continuation: Option<String>,
    ) -> Result<ObjectPage, BackendFailure> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(prefix.map(str::to_string))
            .max_keys(max_keys)
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|err| classify_sdk_error(err, classify))?;

        let contents: &[Object] = optional(output.contents()).unwrap_or_default();
        let objects = contents
            .iter()
            .map(|object| ObjectSummary {
                key: optional::<&str>(object.key()).unwrap_or_default().to_string(),
                size: optional::<i64>(object.size()).unwrap_or_default(),
                last_modified: object.last_modified().and_then(timestamp),
                etag: optional::<&str>(object.e_tag()).map(str::to_string),
            })
            .collect();

        let truncated = optional::<bool>(output.is_truncated()).unwrap_or(false);
        let next_token = optional::<&str>(output.next_continuation_token())
            .filter(|_| truncated)
            .map(str::to_string);

        Ok(ObjectPage {
            objects,
            next_token,
        })
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        range: Option<ByteRange>,
    ) -> Result<ObjectBody, BackendFailure> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .set_range(range.map(|range| range.header()))
            .send()
            .await
            .map_err(|err| classify_sdk_error(err, classify))?;

        let content_type = optional::<&str>(output.content_type()).map(str::to_string);
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|err| {
                BackendFailure::new(FailureClass::Unavailable, "BodyReadFailure", err.to_string())
            })?
            .into_bytes()
            .to_vec();

        Ok(ObjectBody {
            content_type,
            bytes,
        })
    }

    async fn put_object(&self, request: PutRequest) -> Result<PutOutcome, BackendFailure> {
        let output = self
            .client
            .put_object()
            .bucket(request.bucket)
            .key(request.key)
            .content_type(request.content_type)
            .body(ByteStream::from(request.body))
            .send()
            .await
            .map_err(|err| classify_sdk_error(err, classify))?;

        Ok(PutOutcome {
            etag: optional::<&str>(output.e_tag()).map(str::to_string),
            version_id: optional::<&str>(output.version_id()).map(str::to_string),
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<DeleteOutcome, BackendFailure> {
        let output = self
            .client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify_sdk_error(err, classify))?;

        Ok(DeleteOutcome {
            delete_marker: optional::<bool>(output.delete_marker()),
            version_id: optional::<&str>(output.version_id()).map(str::to_string),
        })
    }
}

/// Builds [`S3ObjectStore`] clients from the process configuration.
pub struct S3Connector {
    aws: AwsConfig,
}

impl S3Connector {
    pub fn new(aws: AwsConfig) -> Self {
        Self { aws }
    }
}

#[async_trait]
impl Connector<dyn ObjectStore> for S3Connector {
    async fn connect(&self) -> Result<Arc<dyn ObjectStore>, BackendFailure> {
        let sdk_config = load_sdk_config(&self.aws).await;
        Ok(Arc::new(S3ObjectStore::new(Client::new(&sdk_config))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_objects_are_not_found() {
        assert_eq!(classify("NoSuchKey", ""), Some(FailureClass::NotFound));
        assert_eq!(classify("NoSuchBucket", ""), Some(FailureClass::NotFound));
        assert_eq!(classify("NotFound", ""), Some(FailureClass::NotFound));
    }

    #[test]
    fn test_slow_down_is_throttling() {
        assert_eq!(classify("SlowDown", ""), Some(FailureClass::Throttled));
        assert_eq!(classify("InvalidRange", ""), Some(FailureClass::BadRequest));
        assert_eq!(classify("AccessDenied", ""), None);
    }
}
