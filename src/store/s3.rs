//! S3-compatible object store
//!
//! Drives an S3 endpoint through the AWS SDK. The SDK is async; workers are
//! plain threads, so every call is run to completion with `block_on` on a
//! runtime owned by the store. `Runtime::block_on` may be entered from many
//! threads at once, which lets every worker issue requests concurrently.
//!
//! Path-style addressing is forced so that MinIO, Ceph RGW and similar
//! services work without DNS bucket names.

use super::{ListPage, ObjectEntry, ObjectStore, StoreError, StoreResult};
use crate::config::TargetConfig;
use crate::Result;
use anyhow::Context;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Region, RequestChecksumCalculation, ResponseChecksumValidation};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tokio::runtime::Runtime;
use tracing::debug;

pub struct S3Store {
    client: Client,
    runtime: Runtime,
}

impl S3Store {
    /// Build a client for `target`
    ///
    /// `workers` sizes the runtime so that requests from every worker can be
    /// in flight at the same time.
    pub fn connect(target: &TargetConfig, workers: usize) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(workers.clamp(1, 64))
            .thread_name("objbench-s3")
            .enable_all()
            .build()
            .context("Failed to build async runtime for S3 client")?;

        let credentials = Credentials::new(
            target.access_key.clone(),
            target.secret_key.clone(),
            None,
            None,
            "objbench",
        );

        let sdk_config = runtime.block_on(
            aws_config::defaults(BehaviorVersion::latest())
                .endpoint_url(target.url.clone())
                .region(Region::new(target.region.clone()))
                .credentials_provider(credentials)
                .load(),
        );

        // Checksums only where the operation requires one; they would be
        // computed inside the timed request
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        debug!("S3 client configured for {} ({})", target.url, target.region);

        Ok(Self {
            client: Client::from_conf(s3_config),
            runtime,
        })
    }
}

fn request_error<E: std::error::Error>(err: E) -> StoreError {
    StoreError::Request(DisplayErrorContext(err).to_string())
}

impl ObjectStore for S3Store {
    fn create_bucket(&self, bucket: &str) -> StoreResult<()> {
        let result = self
            .runtime
            .block_on(self.client.create_bucket().bucket(bucket).send());
        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_bucket_already_owned_by_you()
                    || service_error.is_bucket_already_exists()
                {
                    Err(StoreError::BucketAlreadyExists(bucket.to_string()))
                } else {
                    Err(request_error(service_error))
                }
            }
        }
    }

    fn delete_bucket(&self, bucket: &str) -> StoreResult<()> {
        let result = self
            .runtime
            .block_on(self.client.delete_bucket().bucket(bucket).send());
        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.code() == Some("NoSuchBucket") {
                    Err(StoreError::NoSuchBucket(bucket.to_string()))
                } else {
                    Err(request_error(service_error))
                }
            }
        }
    }

    fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> StoreResult<()> {
        self.runtime
            .block_on(
                self.client
                    .put_object()
                    .bucket(bucket)
                    .key(key)
                    .body(ByteStream::from(body))
                    .send(),
            )
            .map(|_| ())
            .map_err(|err| request_error(err.into_service_error()))
    }

    fn get_object(&self, bucket: &str, key: &str) -> StoreResult<u64> {
        self.runtime.block_on(async {
            let resp = match self.client.get_object().bucket(bucket).key(key).send().await {
                Ok(resp) => resp,
                Err(err) => {
                    let service_error = err.into_service_error();
                    return if service_error.is_no_such_key() {
                        Err(StoreError::NoSuchKey(key.to_string()))
                    } else {
                        Err(request_error(service_error))
                    };
                }
            };

            // Drain the body chunk by chunk; only the byte count matters
            let mut body = resp.body;
            let mut received = 0u64;
            while let Some(chunk) = body.try_next().await.map_err(request_error)? {
                received += chunk.len() as u64;
            }
            Ok(received)
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> StoreResult<()> {
        self.runtime
            .block_on(self.client.delete_object().bucket(bucket).key(key).send())
            .map(|_| ())
            .map_err(|err| request_error(err.into_service_error()))
    }

    fn list_objects(&self, bucket: &str, token: Option<&str>, max_keys: i32) -> StoreResult<ListPage> {
        let resp = self
            .runtime
            .block_on(
                self.client
                    .list_objects_v2()
                    .bucket(bucket)
                    .max_keys(max_keys)
                    .set_continuation_token(token.map(str::to_string))
                    .send(),
            )
            .map_err(|err| {
                let service_error = err.into_service_error();
                if service_error.is_no_such_bucket() {
                    StoreError::NoSuchBucket(bucket.to_string())
                } else {
                    request_error(service_error)
                }
            })?;

        let objects = resp
            .contents()
            .iter()
            .filter_map(|obj| {
                obj.key().map(|key| ObjectEntry {
                    key: key.to_string(),
                    size: obj.size().unwrap_or(0).max(0) as u64,
                })
            })
            .collect();

        let next_token = if resp.is_truncated() == Some(false) {
            None
        } else {
            resp.next_continuation_token()
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        };

        Ok(ListPage { objects, next_token })
    }

    fn name(&self) -> &str {
        "s3"
    }
}
