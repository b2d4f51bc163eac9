//! Coordinator module
//!
//! Orchestrates workers and aggregates results.
//!
//! A run is `loops` repetitions of the configured phase sequence. For each
//! phase the coordinator resets the shared operation counter, spawns one
//! worker thread per configured thread, polls until every worker has finished
//! and then drains the phase's interval summaries and its total.
//!
//! Mutable state that outlives a single phase lives in [`RunContext`]; the
//! configuration itself stays immutable for the whole run.

pub mod pagination;

use crate::config::workload::Mode;
use crate::config::Config;
use crate::output::text::format_summary;
use crate::stats::summary::Summary;
use crate::stats::RunStats;
use crate::store::ObjectStore;
use crate::util::payload::build_payload;
use crate::util::suffix::SuffixGenerator;
use crate::util::time::format_duration;
use crate::worker::{Worker, WorkerContext};
use crate::Result;
use anyhow::{anyhow, Context};
use bytes::Bytes;
use crossbeam::utils::CachePadded;
use pagination::PaginationState;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Interval at which the coordinator checks for phase completion
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Run-wide mutable state shared by the coordinator and its workers
#[derive(Debug)]
pub struct RunContext {
    /// Last claimed object or bucket index of the current phase
    op_counter: CachePadded<AtomicI64>,
    /// Set by a worker hitting a setup failure; stops every worker
    aborted: AtomicBool,
    /// Object count in effect (-1 = unlimited)
    object_count: AtomicI64,
    /// Object count as configured, restored when a pin is cleared
    configured_count: i64,
    /// `object_count` was pinned by a put phase
    pinned: AtomicBool,
}

impl RunContext {
    pub fn new(object_count: i64) -> Self {
        Self {
            op_counter: CachePadded::new(AtomicI64::new(-1)),
            aborted: AtomicBool::new(false),
            object_count: AtomicI64::new(object_count),
            configured_count: object_count,
            pinned: AtomicBool::new(false),
        }
    }

    /// Reset the operation counter so the next claim returns 0
    pub fn reset_counter(&self) {
        self.op_counter.store(-1, Ordering::SeqCst);
    }

    /// Claim the next index
    #[inline]
    pub fn claim(&self) -> i64 {
        self.op_counter.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Give back one claimed index
    #[inline]
    pub fn release(&self) {
        self.op_counter.fetch_sub(1, Ordering::AcqRel);
    }

    /// Last claimed index
    pub fn counter(&self) -> i64 {
        self.op_counter.load(Ordering::Acquire)
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// Object count in effect, `None` when unlimited
    pub fn object_limit(&self) -> Option<u64> {
        let count = self.object_count.load(Ordering::Acquire);
        if count < 0 {
            None
        } else {
            Some(count as u64)
        }
    }

    /// Limit later phases to the objects a put phase actually wrote
    pub fn pin_object_count(&self, count: i64) {
        self.object_count.store(count, Ordering::Release);
        self.pinned.store(true, Ordering::Release);
    }

    /// Drop a pinned count, restoring the configured one
    pub fn clear_pin(&self) {
        if self.pinned.swap(false, Ordering::AcqRel) {
            self.object_count.store(self.configured_count, Ordering::Release);
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.load(Ordering::Acquire)
    }
}

/// Runs the phase sequence and collects every summary produced
pub struct Coordinator {
    config: Arc<Config>,
    store: Arc<dyn ObjectStore>,
    context: RunContext,
    payload: Bytes,
}

impl Coordinator {
    pub fn new(config: Arc<Config>, store: Arc<dyn ObjectStore>) -> Self {
        let payload = build_payload(config.workload.object_size, config.workload.payload);
        let context = RunContext::new(config.workload.object_count);
        Self {
            config,
            store,
            context,
            payload,
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Run every loop of the phase sequence
    ///
    /// Returns all summaries in production order: for each phase its closed
    /// intervals followed by its total.
    pub fn run(&self) -> Result<Vec<Summary>> {
        let mut summaries = Vec::new();
        for loop_index in 0..self.config.workload.loops {
            for &mode in self.config.workload.modes.modes() {
                let phase = self
                    .run_phase(loop_index, mode)
                    .with_context(|| format!("Loop {} {} phase failed", loop_index, mode))?;
                summaries.extend(phase);
            }
        }
        Ok(summaries)
    }

    /// Run one phase to completion
    pub fn run_phase(&self, loop_index: usize, mode: Mode) -> Result<Vec<Summary>> {
        let workload = &self.config.workload;
        let workers = workload.threads.max(1);

        self.context.reset_counter();
        if mode == Mode::Put {
            self.context.clear_pin();
        }

        let suffixes = SuffixGenerator::new(workload.seed);
        let pagination = PaginationState::new(workload.bucket_count as usize);

        info!("Running Loop {} {} TEST", loop_index, mode.description());
        let stats = RunStats::new(loop_index, mode, workers, workload.interval_width());

        let ctx = WorkerContext {
            config: self.config.as_ref(),
            run: &self.context,
            stats: &stats,
            store: self.store.as_ref(),
            suffixes: &suffixes,
            pagination: &pagination,
            payload: &self.payload,
        };

        let outcome: Result<()> = thread::scope(|s| {
            let mut handles = Vec::with_capacity(workers);
            for id in 0..workers {
                let worker = Worker::new(id, ctx);
                let spawned = thread::Builder::new()
                    .name(format!("worker-{}", id))
                    .spawn_scoped(s, move || worker.run());
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        self.context.abort();
                        return Err(anyhow!("Failed to spawn worker {}: {}", id, err));
                    }
                }
            }

            // A panicking worker never reports finished, so also watch the handles
            while !stats.all_finished() && !handles.iter().all(|h| h.is_finished()) {
                thread::sleep(POLL_INTERVAL);
            }

            let mut first_error = None;
            for (id, handle) in handles.into_iter().enumerate() {
                let result = handle
                    .join()
                    .map_err(|_| anyhow!("worker {} panicked", id))
                    .and_then(|r| r);
                if let Err(err) = result {
                    first_error.get_or_insert(err);
                }
            }
            first_error.map_or(Ok(()), Err)
        });

        if mode == Mode::Put && self.context.object_limit().is_none() {
            let written = self.context.counter() + 1;
            self.context.pin_object_count(written);
            debug!("object count pinned to {} for later phases", written);
        }

        let summaries = stats.drain();
        if let Some(total) = summaries.last().filter(|s| s.is_total()) {
            info!("{}", format_summary(total));
        }
        if let Some(elapsed) = stats.elapsed() {
            debug!("{} phase took {}", mode, format_duration(elapsed));
        }

        outcome?;
        Ok(summaries)
    }
}
