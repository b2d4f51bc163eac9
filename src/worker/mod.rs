//! Worker thread implementation
//!
//! A worker is one of the `threads` concurrent load generators of a phase. It
//! runs the phase's operation loop until the phase's stop condition is met,
//! recording every request into its private [`WorkerLedger`].
//!
//! # Architecture
//!
//! Workers share only what [`WorkerContext`] hands them:
//! - **RunContext**: the global operation counter used to claim object and
//!   bucket indices, the abort flag and the effective object count
//! - **RunStats**: the phase's interval barrier and finished-worker counter
//! - **ObjectStore**: the storage client
//! - **SuffixGenerator** / **PaginationState**: per-phase shared helpers
//!
//! # Stop conditions
//!
//! - the claimed index is past the object or bucket count
//! - the phase duration elapsed (object phases only, checked before each request)
//! - [`MAX_CONSECUTIVE_FAILURES`] failed requests in a row
//! - another worker aborted the run after a setup failure

use crate::config::workload::Mode;
use crate::config::Config;
use crate::coordinator::pagination::{PageClaim, PaginationState};
use crate::coordinator::RunContext;
use crate::stats::ledger::WorkerLedger;
use crate::stats::RunStats;
use crate::store::{ObjectStore, StoreError};
use crate::util::suffix::SuffixGenerator;
use crate::util::time::nanos_between;
use crate::Result;
use bytes::Bytes;
use std::time::Instant;
use tracing::{debug, warn};

/// Failed requests in a row after which a worker stops for the rest of the phase
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Shared state handed to every worker of a phase
#[derive(Clone, Copy)]
pub struct WorkerContext<'a> {
    pub config: &'a Config,
    pub run: &'a RunContext,
    pub stats: &'a RunStats,
    pub store: &'a dyn ObjectStore,
    pub suffixes: &'a SuffixGenerator,
    pub pagination: &'a PaginationState,
    pub payload: &'a Bytes,
}

/// One load generator of one phase
pub struct Worker<'a> {
    id: usize,
    ctx: WorkerContext<'a>,
    ledger: WorkerLedger,
    strikes: u32,
}

impl<'a> Worker<'a> {
    pub fn new(id: usize, ctx: WorkerContext<'a>) -> Self {
        Self {
            id,
            ledger: ctx.stats.ledger(),
            ctx,
            strikes: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Run the phase's operation loop, then finish the ledger
    ///
    /// The ledger is finished whatever the outcome, so the phase always
    /// completes. An `Err` is a setup failure that must abort the run.
    pub fn run(mut self) -> Result<()> {
        let result = match self.ctx.stats.mode() {
            Mode::Init => self.run_bucket_init(),
            Mode::Put => self.run_put(),
            Mode::Get => self.run_get(),
            Mode::Delete => self.run_delete(),
            Mode::List => self.run_bucket_list(),
            Mode::ClearBucket => self.run_bucket_clear(),
            Mode::DeleteBucket => self.run_bucket_delete(),
        };
        self.ctx.stats.finish(&mut self.ledger);
        debug!("worker {} finished {}", self.id, self.ctx.stats.mode());
        result
    }

    fn object_key(&self, index: u64) -> String {
        let target = &self.ctx.config.target;
        if self.ctx.config.workload.randomize_suffix {
            format!("{}{}", target.object_prefix, self.ctx.suffixes.next_suffix())
        } else {
            target.object_key(index)
        }
    }

    fn bucket_for(&self, index: u64) -> String {
        let count = self.ctx.config.workload.bucket_count.max(1);
        self.ctx.config.target.bucket_name(index % count)
    }

    /// Whether an object phase must stop before its next request
    fn should_stop(&self) -> bool {
        if self.ctx.run.is_aborted() {
            return true;
        }
        match self.ctx.config.workload.duration_limit() {
            Some(limit) => self.ctx.stats.started().elapsed() >= limit,
            None => false,
        }
    }

    /// Claim the next bucket index, `None` when every bucket is taken
    fn claim_bucket(&self) -> Option<u64> {
        if self.ctx.run.is_aborted() {
            return None;
        }
        let index = self.ctx.run.claim();
        if index < 0 || index as u64 >= self.ctx.config.workload.bucket_count {
            self.ctx.run.release();
            return None;
        }
        Some(index as u64)
    }

    /// Account a successful request
    fn succeed(&mut self, bytes: u64, start: Instant, end: Instant) {
        self.ctx.stats.update_intervals_at(&mut self.ledger, end);
        self.ledger.record_op(bytes, nanos_between(start, end));
        self.strikes = 0;
    }

    /// Account a failed request; returns true when the worker must stop
    fn fail(&mut self, end: Instant) -> bool {
        self.ctx.stats.update_intervals_at(&mut self.ledger, end);
        self.ledger.record_slowdown();
        self.strikes += 1;
        if self.strikes >= MAX_CONSECUTIVE_FAILURES {
            warn!(
                "worker {} stopping {} after {} consecutive failures",
                self.id,
                self.ctx.stats.mode(),
                self.strikes
            );
            return true;
        }
        false
    }

    fn run_bucket_init(&mut self) -> Result<()> {
        while let Some(index) = self.claim_bucket() {
            let bucket = self.ctx.config.target.bucket_name(index);
            let start = Instant::now();
            let result = self.ctx.store.create_bucket(&bucket);
            let end = Instant::now();

            match result {
                Ok(()) | Err(StoreError::BucketAlreadyExists(_)) => {
                    self.succeed(0, start, end);
                }
                Err(err) => {
                    self.ctx.run.abort();
                    self.ctx.stats.update_intervals_at(&mut self.ledger, end);
                    anyhow::bail!(
                        "Unable to create bucket {} (is your access and secret correct?): {}",
                        bucket,
                        err
                    );
                }
            }
        }
        Ok(())
    }

    fn run_put(&mut self) -> Result<()> {
        let limit = self.ctx.run.object_limit();
        while !self.should_stop() {
            let index = self.ctx.run.claim();
            if limit.is_some_and(|n| index as u64 >= n) {
                self.ctx.run.release();
                break;
            }
            let index = index as u64;
            let bucket = self.bucket_for(index);
            let key = self.object_key(index);
            let body = self.ctx.payload.clone();
            let size = body.len() as u64;

            let start = Instant::now();
            let result = self.ctx.store.put_object(&bucket, &key, body);
            let end = Instant::now();

            match result {
                Ok(()) => self.succeed(size, start, end),
                Err(err) => {
                    // Give the index back so the carried-over count stays honest
                    self.ctx.run.release();
                    warn!("worker {} put {}/{} failed: {}", self.id, bucket, key, err);
                    if self.fail(end) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn run_get(&mut self) -> Result<()> {
        let limit = self.ctx.run.object_limit();
        let wrap = self.ctx.config.workload.loop_objects
            && self.ctx.config.workload.duration_limit().is_some();

        while !self.should_stop() {
            let claimed = self.ctx.run.claim() as u64;
            let index = match limit {
                Some(n) if claimed >= n => {
                    if wrap && n > 0 {
                        claimed % n
                    } else {
                        self.ctx.run.release();
                        break;
                    }
                }
                _ => claimed,
            };
            let bucket = self.bucket_for(index);
            let key = self.object_key(index);

            let start = Instant::now();
            let result = self.ctx.store.get_object(&bucket, &key);
            let end = Instant::now();

            match result {
                Ok(bytes) => self.succeed(bytes, start, end),
                Err(err) => {
                    warn!("worker {} get {}/{} failed: {}", self.id, bucket, key, err);
                    if self.fail(end) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn run_delete(&mut self) -> Result<()> {
        let limit = self.ctx.run.object_limit();
        let size = self.ctx.config.workload.object_size;

        while !self.should_stop() {
            let index = self.ctx.run.claim();
            if limit.is_some_and(|n| index as u64 >= n) {
                self.ctx.run.release();
                break;
            }
            let index = index as u64;
            let bucket = self.bucket_for(index);
            let key = self.object_key(index);

            let start = Instant::now();
            let result = self.ctx.store.delete_object(&bucket, &key);
            let end = Instant::now();

            match result {
                Ok(()) => self.succeed(size, start, end),
                Err(err) => {
                    warn!("worker {} delete {}/{} failed: {}", self.id, bucket, key, err);
                    if self.fail(end) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn run_bucket_list(&mut self) -> Result<()> {
        let max_keys = self.ctx.config.workload.max_keys;

        while let Some(index) = self.claim_bucket() {
            let bucket = self.ctx.config.target.bucket_name(index);
            let mut token: Option<String> = None;
            let mut start = Instant::now();

            loop {
                let result = self.ctx.store.list_objects(&bucket, token.as_deref(), max_keys);
                let end = Instant::now();
                match result {
                    Ok(page) => {
                        self.succeed(0, start, end);
                        start = Instant::now();
                        match page.next_token {
                            Some(next) => token = Some(next),
                            None => break,
                        }
                    }
                    Err(err) => {
                        warn!("worker {} list {} failed: {}", self.id, bucket, err);
                        self.ctx.stats.update_intervals_at(&mut self.ledger, end);
                        self.ledger.record_slowdown();
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    /// Drain every bucket, starting at the worker's own offset
    ///
    /// Finding a bucket already exhausted when first visiting it ends the
    /// worker's clear phase: the remaining buckets are left to the workers
    /// that started on them.
    fn run_bucket_clear(&mut self) -> Result<()> {
        let buckets = self.ctx.config.workload.bucket_count;
        let max_keys = self.ctx.config.workload.max_keys;

        for offset in 0..buckets {
            let number = (self.id as u64 + offset) % buckets;
            let bucket = self.ctx.config.target.bucket_name(number);
            debug!("worker {} clearing bucket {}", self.id, bucket);
            let mut first_visit = true;

            loop {
                if self.ctx.run.is_aborted() {
                    return Ok(());
                }
                let claim = self.ctx.pagination.next_page(number as usize, |token| {
                    self.ctx.store.list_objects(&bucket, token, max_keys)
                });

                let page = match claim {
                    Ok(PageClaim::Page(page)) => page,
                    Ok(PageClaim::Exhausted) if first_visit => {
                        debug!("worker {} found {} already cleared, stopping", self.id, bucket);
                        return Ok(());
                    }
                    Ok(PageClaim::Exhausted) => break,
                    Err(err) => {
                        warn!("worker {} list {} failed: {}", self.id, bucket, err);
                        self.ctx.stats.update_intervals(&mut self.ledger);
                        self.ledger.record_slowdown();
                        return Ok(());
                    }
                };
                first_visit = false;

                if page.is_last() {
                    debug!("worker {} reached the end of {}", self.id, bucket);
                }
                for object in page.objects {
                    let start = Instant::now();
                    let result = self.ctx.store.delete_object(&bucket, &object.key);
                    let end = Instant::now();
                    match result {
                        Ok(()) => self.succeed(object.size, start, end),
                        Err(err) => {
                            warn!("worker {} delete {}/{} failed: {}", self.id, bucket, object.key, err);
                            self.ctx.stats.update_intervals_at(&mut self.ledger, end);
                            self.ledger.record_slowdown();
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn run_bucket_delete(&mut self) -> Result<()> {
        while let Some(index) = self.claim_bucket() {
            let bucket = self.ctx.config.target.bucket_name(index);
            let start = Instant::now();
            let result = self.ctx.store.delete_bucket(&bucket);
            let end = Instant::now();

            match result {
                Ok(()) => self.succeed(0, start, end),
                Err(err) => {
                    warn!("worker {} delete bucket {} failed: {}", self.id, bucket, err);
                    self.ctx.stats.update_intervals_at(&mut self.ledger, end);
                    self.ledger.record_slowdown();
                    break;
                }
            }
        }
        Ok(())
    }
}
