//! objbench - Load generator and benchmark for S3-compatible object storage
//!
//! objbench drives a configurable sequence of phases (bucket creation, object
//! put/get/delete, listing, bucket clearing and deletion) against an object
//! store from many concurrent workers, and reports throughput and latency per
//! reporting interval and per phase.
//!
//! # Architecture
//!
//! - **Store backends**: S3 over the AWS SDK, or an in-memory store for testing
//! - **Workers**: one thread per configured worker, sharing an atomic operation counter
//! - **Interval reporting**: per-worker ledgers merged through a lock-light barrier
//! - **Output**: log lines, a results table, CSV and JSON files

pub mod config;
pub mod coordinator;
pub mod output;
pub mod stats;
pub mod store;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::Coordinator;
pub use store::ObjectStore;

/// Result type used throughout objbench
pub type Result<T> = anyhow::Result<T>;
