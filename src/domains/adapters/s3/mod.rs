//! Amazon S3 object storage.

mod aws;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use schemars::JsonSchema;
use serde::Serialize;
use tracing::{debug, instrument};

use super::failure::BackendFailure;
use super::retry::RetryPolicy;
use super::session::AdapterSession;
use crate::domains::tools::ToolError;

pub use aws::{S3Connector, S3ObjectStore};

/// Upper bound on `max_keys` for one listing.
pub const MAX_KEYS_LIMIT: i32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BucketSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    pub key: String,
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// One ListObjectsV2 page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectPage {
    pub objects: Vec<ObjectSummary>,
    pub next_token: Option<String>,
}

/// Inclusive byte range of a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl ByteRange {
    /// Value for the HTTP `Range` header.
    pub fn header(&self) -> String {
        match self.end {
            Some(end) => format!("bytes={}-{}", self.start, end),
            None => format!("bytes={}-", self.start),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectBody {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Object upload.
#[derive(Debug, Clone, PartialEq)]
pub struct PutRequest {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PutOutcome {
    pub etag: Option<String>,
    pub version_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOutcome {
    pub delete_marker: Option<bool>,
    pub version_id: Option<String>,
}

/// The S3 operations used by the S3 server.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>, BackendFailure>;

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        max_keys: i32,
        continuation: Option<String>,
    ) -> Result<ObjectPage, BackendFailure>;

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        range: Option<ByteRange>,
    ) -> Result<ObjectBody, BackendFailure>;

    async fn put_object(&self, request: PutRequest) -> Result<PutOutcome, BackendFailure>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<DeleteOutcome, BackendFailure>;
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BucketList {
    pub buckets: Vec<BucketSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectListing {
    pub bucket: String,
    pub prefix: String,
    pub objects: Vec<ObjectSummary>,
    /// More objects match than were returned.
    pub truncated: bool,
}

/// How object content is carried in a JSON payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub enum ContentEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "base64")]
    Base64,
}

impl ContentEncoding {
    pub fn parse(parameter: &str, value: Option<&str>) -> Result<Self, ToolError> {
        match value.map(str::to_lowercase).as_deref() {
            None | Some("utf-8") | Some("utf8") | Some("text") => Ok(Self::Utf8),
            Some("base64") => Ok(Self::Base64),
            Some(other) => Err(ToolError::parameter_type(
                parameter,
                format!("unsupported encoding '{other}' (expected utf-8 or base64)"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectContent {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub content_length: usize,
    pub encoding: ContentEncoding,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PutResult {
    pub bucket: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub bucket: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_marker: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

/// Upload arguments as given by a tool call.
#[derive(Debug, Clone, Copy)]
pub struct Upload<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub content: &'a str,
    pub content_type: Option<&'a str>,
    pub encoding: Option<&'a str>,
}

pub struct S3Adapter {
    session: AdapterSession<dyn ObjectStore>,
    policy: RetryPolicy,
}

impl S3Adapter {
    pub fn new(session: AdapterSession<dyn ObjectStore>, policy: RetryPolicy) -> Self {
        Self { session, policy }
    }

    #[instrument(skip_all)]
    pub async fn list_buckets(&self) -> Result<BucketList, ToolError> {
        let buckets = self
            .session
            .call(&self.policy, "list_buckets", |store| async move {
                store.list_buckets().await
            })
            .await?;
        Ok(BucketList { buckets })
    }

    /// List up to `max_keys` objects, following continuation tokens.
    #[instrument(skip_all, fields(bucket = %bucket))]
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        max_keys: Option<i64>,
    ) -> Result<ObjectListing, ToolError> {
        let limit = max_keys
            .unwrap_or(MAX_KEYS_LIMIT as i64)
            .clamp(1, MAX_KEYS_LIMIT as i64) as usize;

        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;
        let truncated = loop {
            let remaining = (limit - objects.len()) as i32;
            let token = continuation.take();
            let page = self
                .session
                .call(&self.policy, "list_objects_v2", |store| {
                    let token = token.clone();
                    async move { store.list_objects(bucket, prefix, remaining, token).await }
                })
                .await?;

            let fetched = page.objects.len();
            objects.extend(page.objects);
            debug!(fetched, total = objects.len(), "Listed object page");

            match page.next_token {
                None => break objects.len() > limit,
                Some(_) if objects.len() >= limit => break true,
                // An empty page with a token would loop forever.
                Some(_) if fetched == 0 => break true,
                Some(token) => continuation = Some(token),
            }
        };
        objects.truncate(limit);

        Ok(ObjectListing {
            bucket: bucket.to_string(),
            prefix: prefix.unwrap_or_default().to_string(),
            objects,
            truncated,
        })
    }

    #[instrument(skip_all, fields(bucket = %bucket))]
    pub async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        range_start: Option<i64>,
        range_end: Option<i64>,
    ) -> Result<ObjectContent, ToolError> {
        let range = byte_range(range_start, range_end)?;
        let body = self
            .session
            .call(&self.policy, "get_object", |store| async move {
                store.get_object(bucket, key, range).await
            })
            .await?;

        let content_length = body.bytes.len();
        let (encoding, content) = match String::from_utf8(body.bytes) {
            Ok(text) => (ContentEncoding::Utf8, text),
            Err(err) => (ContentEncoding::Base64, BASE64.encode(err.into_bytes())),
        };

        Ok(ObjectContent {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: body
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            content_length,
            encoding,
            content,
        })
    }

    #[instrument(skip_all, fields(bucket = %upload.bucket))]
    pub async fn put_object(&self, upload: Upload<'_>) -> Result<PutResult, ToolError> {
        let body = match ContentEncoding::parse("encoding", upload.encoding)? {
            ContentEncoding::Utf8 => upload.content.as_bytes().to_vec(),
            ContentEncoding::Base64 => BASE64
                .decode(upload.content)
                .map_err(|_| ToolError::parameter_type("content", "content is not valid base64"))?,
        };
        let request = PutRequest {
            bucket: upload.bucket.to_string(),
            key: upload.key.to_string(),
            body,
            content_type: upload.content_type.unwrap_or("text/plain").to_string(),
        };

        let outcome = self
            .session
            .call(&self.policy, "put_object", |store| {
                let request = request.clone();
                async move { store.put_object(request).await }
            })
            .await?;

        Ok(PutResult {
            bucket: request.bucket,
            key: request.key,
            etag: outcome.etag,
            version_id: outcome.version_id,
        })
    }

    #[instrument(skip_all, fields(bucket = %bucket))]
    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<DeleteResult, ToolError> {
        let outcome = self
            .session
            .call(&self.policy, "delete_object", |store| async move {
                store.delete_object(bucket, key).await
            })
            .await?;
        Ok(DeleteResult {
            bucket: bucket.to_string(),
            key: key.to_string(),
            delete_marker: outcome.delete_marker,
            version_id: outcome.version_id,
        })
    }
}

/// Check a requested byte range before any remote call.
pub fn byte_range(start: Option<i64>, end: Option<i64>) -> Result<Option<ByteRange>, ToolError> {
    match (start, end) {
        (None, None) => Ok(None),
        (None, Some(_)) => Err(ToolError::parameter_type(
            "range_end",
            "range_end requires range_start",
        )),
        (Some(start), _) if start < 0 => Err(ToolError::parameter_type(
            "range_start",
            "range_start must not be negative",
        )),
        (Some(start), Some(end)) if end < start => Err(ToolError::parameter_type(
            "range_end",
            "range_end must not be smaller than range_start",
        )),
        (Some(start), end) => Ok(Some(ByteRange {
            start: start as u64,
            end: end.map(|end| end as u64),
        })),
    }
}
