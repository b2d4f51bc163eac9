//! Object store abstraction
//!
//! Workers talk to the storage service only through the [`ObjectStore`] trait,
//! so the benchmark logic is agnostic to whether it drives a real S3 endpoint
//! or the in-memory store used by tests and `mem://` dry-runs.
//!
//! # Store Types
//!
//! - **[`s3::S3Store`]**: S3-compatible endpoint through the AWS SDK
//! - **[`mock::MemoryStore`]**: in-process buckets with latency and failure injection
//!
//! # Thread Safety
//!
//! One store instance is shared by every worker of a run, so implementations
//! must be `Send + Sync`. Every call is blocking from the caller's point of view.

pub mod mock;
pub mod s3;

use bytes::Bytes;
use thiserror::Error;

/// Error returned by a storage request
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The bucket already exists (owned by us or someone else)
    #[error("bucket {0} already exists")]
    BucketAlreadyExists(String),
    #[error("no such bucket: {0}")]
    NoSuchBucket(String),
    #[error("no such key: {0}")]
    NoSuchKey(String),
    /// Any other failure: transport, throttling, service error
    #[error("request failed: {0}")]
    Request(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One entry of a bucket listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
}

/// One page of a bucket listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub objects: Vec<ObjectEntry>,
    /// Token for the next page, `None` when this was the last page
    pub next_token: Option<String>,
}

impl ListPage {
    pub fn is_last(&self) -> bool {
        self.next_token.is_none()
    }
}

/// Storage operations used by the benchmark phases
pub trait ObjectStore: Send + Sync {
    fn create_bucket(&self, bucket: &str) -> StoreResult<()>;

    fn delete_bucket(&self, bucket: &str) -> StoreResult<()>;

    fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> StoreResult<()>;

    /// Read the whole object body and return the number of bytes received
    fn get_object(&self, bucket: &str, key: &str) -> StoreResult<u64>;

    fn delete_object(&self, bucket: &str, key: &str) -> StoreResult<()>;

    /// List up to `max_keys` objects, continuing from `token` if given
    fn list_objects(&self, bucket: &str, token: Option<&str>, max_keys: i32) -> StoreResult<ListPage>;

    /// Short name for logs
    fn name(&self) -> &str;
}
