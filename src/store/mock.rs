//! In-memory object store
//!
//! Buckets and objects held in process memory. Used by the test suite and by
//! `--url mem://` to exercise the full benchmark without a storage service.
//!
//! # Features
//!
//! - Configurable per-request latency
//! - Failure injection, either for every request or after N successes
//! - Records every object key read, for coverage checks in tests
//! - Thread-safe; clones share the same state
//!
//! # Example
//!
//! ```
//! use objbench::store::ObjectStore;
//! use objbench::store::mock::MemoryStore;
//! use bytes::Bytes;
//!
//! let store = MemoryStore::new();
//! store.create_bucket("b").unwrap();
//! store.put_object("b", "k", Bytes::from_static(b"hello")).unwrap();
//! assert_eq!(store.get_object("b", "k").unwrap(), 5);
//! ```

use super::{ListPage, ObjectEntry, ObjectStore, StoreError, StoreResult};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Which requests the store fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    Never,
    Always,
    /// Succeed `n` data requests, then fail every one after that
    AfterRequests(u64),
}

/// Kind of request, for the request log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    CreateBucket,
    DeleteBucket,
    Put,
    Get,
    Delete,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub kind: RequestKind,
    pub bucket: String,
    pub key: Option<String>,
}

type Buckets = BTreeMap<String, BTreeMap<String, Bytes>>;

#[derive(Clone)]
pub struct MemoryStore {
    buckets: Arc<Mutex<Buckets>>,
    latency: Arc<Mutex<Duration>>,
    failure: Arc<Mutex<FailureMode>>,
    served: Arc<AtomicU64>,
    requests: Arc<Mutex<Vec<RequestRecord>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with no latency that never fails
    pub fn new() -> Self {
        Self {
            buckets: Arc::new(Mutex::new(BTreeMap::new())),
            latency: Arc::new(Mutex::new(Duration::ZERO)),
            failure: Arc::new(Mutex::new(FailureMode::Never)),
            served: Arc::new(AtomicU64::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_latency(latency: Duration) -> Self {
        let store = Self::new();
        store.set_latency(latency);
        store
    }

    /// Sleep this long in every request
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// Configure failure injection for object and listing requests
    ///
    /// Bucket creation and deletion are never failed by injection.
    pub fn set_failure(&self, mode: FailureMode) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = mode;
        self.served.store(0, Ordering::SeqCst);
    }

    /// Keys of every object read, in request order
    pub fn get_log(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.kind == RequestKind::Get)
            .filter_map(|r| r.key)
            .collect()
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<RequestRecord> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_requests(&self) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn count_requests(&self, kind: RequestKind) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }

    pub fn bucket_names(&self) -> Vec<String> {
        self.lock_buckets().keys().cloned().collect()
    }

    /// Number of objects in `bucket`, `None` if it does not exist
    pub fn object_count(&self, bucket: &str) -> Option<usize> {
        self.lock_buckets().get(bucket).map(BTreeMap::len)
    }

    pub fn contains_object(&self, bucket: &str, key: &str) -> bool {
        self.lock_buckets()
            .get(bucket)
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false)
    }

    fn lock_buckets(&self) -> std::sync::MutexGuard<'_, Buckets> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, kind: RequestKind, bucket: &str, key: Option<&str>) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RequestRecord {
                kind,
                bucket: bucket.to_string(),
                key: key.map(str::to_string),
            });

        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }
    }

    fn check_injected_failure(&self) -> StoreResult<()> {
        let mode = *self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        let fail = match mode {
            FailureMode::Never => false,
            FailureMode::Always => true,
            FailureMode::AfterRequests(n) => self.served.fetch_add(1, Ordering::SeqCst) >= n,
        };
        if fail {
            Err(StoreError::Request("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ObjectStore for MemoryStore {
    fn create_bucket(&self, bucket: &str) -> StoreResult<()> {
        self.begin(RequestKind::CreateBucket, bucket, None);
        let mut buckets = self.lock_buckets();
        if buckets.contains_key(bucket) {
            return Err(StoreError::BucketAlreadyExists(bucket.to_string()));
        }
        buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }

    fn delete_bucket(&self, bucket: &str) -> StoreResult<()> {
        self.begin(RequestKind::DeleteBucket, bucket, None);
        let mut buckets = self.lock_buckets();
        match buckets.get(bucket) {
            None => Err(StoreError::NoSuchBucket(bucket.to_string())),
            Some(objects) if !objects.is_empty() => {
                Err(StoreError::Request(format!("bucket {} is not empty", bucket)))
            }
            Some(_) => {
                buckets.remove(bucket);
                Ok(())
            }
        }
    }

    fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> StoreResult<()> {
        self.begin(RequestKind::Put, bucket, Some(key));
        self.check_injected_failure()?;
        let mut buckets = self.lock_buckets();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?;
        objects.insert(key.to_string(), body);
        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str) -> StoreResult<u64> {
        self.begin(RequestKind::Get, bucket, Some(key));
        self.check_injected_failure()?;
        let buckets = self.lock_buckets();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?;
        objects
            .get(key)
            .map(|body| body.len() as u64)
            .ok_or_else(|| StoreError::NoSuchKey(key.to_string()))
    }

    fn delete_object(&self, bucket: &str, key: &str) -> StoreResult<()> {
        self.begin(RequestKind::Delete, bucket, Some(key));
        self.check_injected_failure()?;
        let mut buckets = self.lock_buckets();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?;
        // Deleting a missing key succeeds, as on S3
        objects.remove(key);
        Ok(())
    }

    fn list_objects(&self, bucket: &str, token: Option<&str>, max_keys: i32) -> StoreResult<ListPage> {
        self.begin(RequestKind::List, bucket, token);
        self.check_injected_failure()?;
        let buckets = self.lock_buckets();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?;

        // The continuation token is the last key returned
        let lower = match token {
            Some(t) => Bound::Excluded(t.to_string()),
            None => Bound::Unbounded,
        };
        let limit = max_keys.max(1) as usize;
        let mut range = objects.range::<String, _>((lower, Bound::Unbounded));

        let page: Vec<ObjectEntry> = range
            .by_ref()
            .take(limit)
            .map(|(key, body)| ObjectEntry {
                key: key.clone(),
                size: body.len() as u64,
            })
            .collect();

        let next_token = match (range.next(), page.last()) {
            (Some(_), Some(last)) => Some(last.key.clone()),
            _ => None,
        };

        Ok(ListPage {
            objects: page,
            next_token,
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}
