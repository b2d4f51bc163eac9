//! Statistics collection
//!
//! Interval-based statistics for one benchmark phase.
//!
//! Recording is split in two levels so the hot path never contends:
//!
//! - **[`ledger::WorkerLedger`]**: private to one worker, records every
//!   operation with a plain push
//! - **[`barrier::IntervalBarrier`]**: shared, touched only when a worker
//!   crosses an interval boundary or finishes
//!
//! [`RunStats`] ties the two together for a phase: it hands out ledgers,
//! moves closed intervals into the barrier, logs each interval the moment the
//! last worker leaves it, and builds the phase total once every worker is done.
//!
//! # Example
//!
//! ```
//! use objbench::config::workload::Mode;
//! use objbench::stats::RunStats;
//! use std::time::Duration;
//!
//! let stats = RunStats::new(0, Mode::Put, 1, Some(Duration::from_secs(1)));
//! let mut ledger = stats.ledger();
//! ledger.record_op(4096, 2_000_000);
//! stats.update_intervals(&mut ledger);
//! stats.finish(&mut ledger);
//!
//! let total = stats.total_summary().unwrap();
//! assert_eq!(total.ops, 1);
//! assert!(total.is_total());
//! ```

pub mod barrier;
pub mod ledger;
pub mod summary;

use crate::config::workload::Mode;
use crate::output::text::format_summary;
use barrier::IntervalBarrier;
use crossbeam::utils::CachePadded;
use ledger::WorkerLedger;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use summary::{Summary, TOTAL_LABEL};
use tracing::info;

/// Shared statistics of one phase of one loop
#[derive(Debug)]
pub struct RunStats {
    loop_index: usize,
    mode: Mode,
    workers: usize,
    width: Option<Duration>,
    started: Instant,
    ended: OnceLock<Instant>,
    finished: CachePadded<AtomicUsize>,
    barrier: IntervalBarrier,
}

impl RunStats {
    /// Start the phase clock for `workers` workers
    ///
    /// `width` is the reporting interval; `None` disables interval reports and
    /// only the total is produced.
    pub fn new(loop_index: usize, mode: Mode, workers: usize, width: Option<Duration>) -> Self {
        Self {
            loop_index,
            mode,
            workers,
            width,
            started: Instant::now(),
            ended: OnceLock::new(),
            finished: CachePadded::new(AtomicUsize::new(0)),
            barrier: IntervalBarrier::new(workers, loop_index, mode, width.unwrap_or_default()),
        }
    }

    pub fn loop_index(&self) -> usize {
        self.loop_index
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// A fresh ledger aligned to the phase start
    pub fn ledger(&self) -> WorkerLedger {
        WorkerLedger::new(self.loop_index, self.mode, self.started, self.width)
    }

    /// Roll `ledger` forward to the current time
    ///
    /// Returns the worker's current interval index, `None` once it is finished.
    pub fn update_intervals(&self, ledger: &mut WorkerLedger) -> Option<usize> {
        self.update_intervals_at(ledger, Instant::now())
    }

    /// Roll `ledger` forward to `now`
    ///
    /// Every interval the worker leaves is handed to the barrier with a vote.
    /// When the vote is the last one for that interval, its summary is logged.
    pub fn update_intervals_at(&self, ledger: &mut WorkerLedger, now: Instant) -> Option<usize> {
        let before = ledger.current()?;
        let after = ledger.advance(now)?;

        for index in before..after {
            let Some(record) = ledger.take_interval(index) else {
                continue;
            };
            if let Some(summary) = self.barrier.arrive(index, record) {
                info!("{}", format_summary(&summary));
            }
        }
        Some(after)
    }

    /// Finish a worker's ledger
    ///
    /// Closes intervals up to now, hands over the still-open interval without
    /// voting on it, and counts the worker as done. The last worker to finish
    /// takes the phase end time and closes the intervals left open, cut at
    /// the phase end. Calling this twice for the same ledger has no further
    /// effect.
    pub fn finish(&self, ledger: &mut WorkerLedger) {
        if ledger.is_finished() {
            return;
        }
        self.update_intervals(ledger);

        if let Some(current) = ledger.current() {
            if let Some(record) = ledger.take_interval(current) {
                self.barrier.deposit(current, record);
            }
        }
        ledger.finish();

        let done = self.finished.fetch_add(1, Ordering::AcqRel) + 1;
        if done == self.workers {
            let end = *self.ended.get_or_init(Instant::now);
            if self.width.is_some() {
                let elapsed = end.saturating_duration_since(self.started);
                for summary in self.barrier.close_remaining(elapsed) {
                    info!("{}", format_summary(&summary));
                }
            }
        }
    }

    /// Number of workers that have finished
    pub fn finished_workers(&self) -> usize {
        self.finished.load(Ordering::Acquire)
    }

    pub fn all_finished(&self) -> bool {
        self.finished_workers() >= self.workers
    }

    /// Elapsed time of the phase, `None` until every worker finished
    pub fn elapsed(&self) -> Option<Duration> {
        self.ended
            .get()
            .map(|end| end.saturating_duration_since(self.started))
    }

    /// Summary of interval `index`, `None` until every worker has left it
    pub fn interval_summary(&self, index: usize) -> Option<Summary> {
        self.barrier.summary(index)
    }

    /// Whole-phase summary, `None` until every worker finished
    pub fn total_summary(&self) -> Option<Summary> {
        if !self.all_finished() {
            return None;
        }
        let elapsed = self.elapsed()?;
        Some(self.barrier.merge_all(TOTAL_LABEL, elapsed).summarize())
    }

    /// Every closed interval in order, followed by the total
    ///
    /// Stops at the first interval that is not closed. Once every worker has
    /// finished all intervals are closed, so the interval rows add up to the
    /// total.
    pub fn drain(&self) -> Vec<Summary> {
        let mut summaries: Vec<Summary> = (0..)
            .map_while(|index| self.interval_summary(index))
            .collect();
        if let Some(total) = self.total_summary() {
            summaries.push(total);
        }
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_total_not_ready_before_all_finish() {
        let stats = RunStats::new(0, Mode::Get, 2, Some(100 * MS));
        let mut a = stats.ledger();
        let _b = stats.ledger();
        a.record_op(1, 1);
        stats.finish(&mut a);
        assert_eq!(stats.finished_workers(), 1);
        assert!(stats.total_summary().is_none());
        assert!(stats.elapsed().is_none());
    }

    #[test]
    fn test_finish_is_idempotent() {
        let stats = RunStats::new(0, Mode::Put, 2, None);
        let mut a = stats.ledger();
        stats.finish(&mut a);
        stats.finish(&mut a);
        assert_eq!(stats.finished_workers(), 1);
        assert!(!stats.all_finished());
    }

    #[test]
    fn test_interval_emitted_when_last_worker_leaves() {
        let stats = RunStats::new(1, Mode::Put, 2, Some(100 * MS));
        let start = stats.started();
        let mut a = stats.ledger();
        let mut b = stats.ledger();

        a.record_op(100, 1_000_000);
        b.record_op(100, 3_000_000);

        assert_eq!(stats.update_intervals_at(&mut a, start + 150 * MS), Some(1));
        assert!(stats.interval_summary(0).is_none());

        assert_eq!(stats.update_intervals_at(&mut b, start + 250 * MS), Some(2));
        let summary = stats.interval_summary(0).unwrap();
        assert_eq!(summary.ops, 2);
        assert_eq!(summary.loop_index, 1);
        assert_eq!(summary.mode, "PUT");
        assert_eq!(summary.seconds, 0.1);
        assert!(stats.interval_summary(1).is_none());
    }

    #[test]
    fn test_open_interval_closed_at_phase_end() {
        let stats = RunStats::new(0, Mode::Get, 2, Some(100 * MS));
        let start = stats.started();
        let mut a = stats.ledger();
        let mut b = stats.ledger();

        a.record_op(10, 1_000_000);
        stats.update_intervals_at(&mut a, start + 120 * MS);
        a.record_op(10, 2_000_000);
        a.record_op(10, 2_000_000);
        b.record_op(10, 3_000_000);

        stats.finish(&mut a);
        // interval 0 still waits for the second worker
        assert!(stats.interval_summary(0).is_none());
        stats.finish(&mut b);

        let rows = stats.drain();
        let closed: Vec<_> = rows.iter().filter(|s| !s.is_total()).collect();
        let total = rows.last().unwrap();
        assert!(total.is_total());
        assert_eq!(total.ops, 4);
        assert_eq!(closed.len(), 2);
        assert_eq!(closed[0].ops, 2);
        assert_eq!(closed[1].ops, 2);
        assert!(closed[1].seconds <= 0.1);
    }

    #[test]
    fn test_disabled_intervals_only_total() {
        let stats = RunStats::new(0, Mode::List, 3, None);
        let mut ledgers: Vec<_> = (0..3).map(|_| stats.ledger()).collect();
        for (i, ledger) in ledgers.iter_mut().enumerate() {
            ledger.record_op(0, (i as u64 + 1) * 1_000_000);
            ledger.record_slowdown();
            stats.update_intervals(ledger);
        }
        for ledger in ledgers.iter_mut() {
            stats.finish(ledger);
        }

        let rows = stats.drain();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_total());
        assert_eq!(rows[0].ops, 3);
        assert_eq!(rows[0].slowdowns, 3);
        assert_eq!(rows[0].mode, "LIST");
    }

    #[test]
    fn test_totals_reconcile_with_intervals_across_threads() {
        let workers = 4;
        let stats = RunStats::new(0, Mode::Put, workers, Some(5 * MS));

        thread::scope(|s| {
            for w in 0..workers {
                let stats = &stats;
                s.spawn(move || {
                    let mut ledger = stats.ledger();
                    for i in 0..200u64 {
                        ledger.record_op(1024, (w as u64 + 1) * 1000 + i);
                        if i % 7 == 0 {
                            ledger.record_slowdown();
                        }
                        stats.update_intervals(&mut ledger);
                        if i % 50 == 0 {
                            thread::sleep(2 * MS);
                        }
                    }
                    stats.finish(&mut ledger);
                });
            }
        });

        assert!(stats.all_finished());
        let rows = stats.drain();
        let total = rows.last().unwrap();
        assert!(total.is_total());
        assert_eq!(total.ops, 800);
        assert_eq!(total.slowdowns, 4 * 29);

        let interval_ops: u64 = rows.iter().filter(|s| !s.is_total()).map(|s| s.ops).sum();
        let interval_slowdowns: u64 = rows.iter().filter(|s| !s.is_total()).map(|s| s.slowdowns).sum();
        assert_eq!(interval_ops, total.ops);
        assert_eq!(interval_slowdowns, total.slowdowns);
        for (i, row) in rows.iter().filter(|s| !s.is_total()).enumerate() {
            assert_eq!(row.interval_name, i.to_string());
        }
    }
}
