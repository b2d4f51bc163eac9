//! Interval barrier
//!
//! Detects the moment every worker has moved past an interval, so that the
//! interval's cross-worker aggregate is computed and reported exactly once.
//!
//! Interval indices are dense and only grow, so slots live in a growable
//! array indexed directly rather than a hash map. Each slot carries an atomic
//! arrival counter and the closed records handed over by the workers. A worker
//! deposits its record *before* voting; only the vote that brings the counter
//! to the worker count aggregates. All other votes are silent, whatever order
//! the workers arrive in.
//!
//! A worker that finishes has left every interval for good. Once the last
//! worker finishes, [`IntervalBarrier::close_remaining`] closes whatever
//! intervals are still open, so every recorded operation lands in exactly one
//! reported interval.
//!
//! The only lock touched per vote is the slot's record list, taken once per
//! worker per interval boundary. Recording individual operations never reaches
//! this module.

use super::summary::{IntervalRecord, Summary};
use crate::config::workload::Mode;
use crossbeam::utils::CachePadded;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use std::time::Duration;

#[derive(Debug, Default)]
struct IntervalSlot {
    arrivals: CachePadded<AtomicUsize>,
    records: Mutex<Vec<IntervalRecord>>,
    summary: OnceLock<Summary>,
}

/// Per-phase barrier over all interval indices
#[derive(Debug)]
pub struct IntervalBarrier {
    workers: usize,
    loop_index: usize,
    mode: Mode,
    width: Duration,
    slots: RwLock<Vec<Arc<IntervalSlot>>>,
}

impl IntervalBarrier {
    pub fn new(workers: usize, loop_index: usize, mode: Mode, width: Duration) -> Self {
        Self {
            workers,
            loop_index,
            mode,
            width,
            slots: RwLock::new(Vec::new()),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of interval slots touched so far
    pub fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, index: usize) -> Arc<IntervalSlot> {
        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get(index) {
                return Arc::clone(slot);
            }
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        while slots.len() <= index {
            slots.push(Arc::new(IntervalSlot::default()));
        }
        Arc::clone(&slots[index])
    }

    fn existing_slot(&self, index: usize) -> Option<Arc<IntervalSlot>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }

    /// Hand over a worker's record for interval `index` without voting
    ///
    /// Used for a worker's last, still-open interval when it finishes: the
    /// samples count toward the phase total, but the interval is not closed.
    pub fn deposit(&self, index: usize, record: IntervalRecord) {
        let slot = self.slot(index);
        slot.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Deposit a closed record and vote that this worker has moved past `index`
    ///
    /// Returns the interval's summary if and only if this vote completed the
    /// interval.
    pub fn arrive(&self, index: usize, record: IntervalRecord) -> Option<Summary> {
        let slot = self.slot(index);
        slot.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);

        let count = slot.arrivals.fetch_add(1, Ordering::AcqRel) + 1;
        if count == self.workers {
            Some(slot.summary.get_or_init(|| self.aggregate(index, &slot)).clone())
        } else {
            None
        }
    }

    /// Number of workers that have moved past `index`
    pub fn arrivals(&self, index: usize) -> usize {
        self.existing_slot(index)
            .map(|slot| slot.arrivals.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    /// Whether every worker has moved past `index`
    pub fn is_closed(&self, index: usize) -> bool {
        self.arrivals(index) >= self.workers
    }

    /// Summary of interval `index`, or `None` if it is not closed yet
    pub fn summary(&self, index: usize) -> Option<Summary> {
        let slot = self.existing_slot(index)?;
        if let Some(summary) = slot.summary.get() {
            return Some(summary.clone());
        }
        if slot.arrivals.load(Ordering::Acquire) < self.workers {
            return None;
        }
        Some(slot.summary.get_or_init(|| self.aggregate(index, &slot)).clone())
    }

    /// Close every interval not every worker voted on, once all workers are done
    ///
    /// Must only be called after the last worker finished, so that no vote
    /// or deposit can still be in flight. Each closed interval's width is cut
    /// at `elapsed`, the end of the phase. Returns the summaries closed here,
    /// in index order.
    pub fn close_remaining(&self, elapsed: Duration) -> Vec<Summary> {
        let slots: Vec<Arc<IntervalSlot>> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut closed = Vec::new();
        for (index, slot) in slots.iter().enumerate() {
            if slot.summary.get().is_some() || slot.arrivals.load(Ordering::Acquire) >= self.workers {
                continue;
            }
            let start = self.width.saturating_mul(index as u32);
            let width = elapsed.saturating_sub(start).min(self.width);
            let summary = slot
                .summary
                .get_or_init(|| self.aggregate_with_width(index, slot, width))
                .clone();
            closed.push(summary);
        }
        closed
    }

    fn aggregate(&self, index: usize, slot: &IntervalSlot) -> Summary {
        self.aggregate_with_width(index, slot, self.width)
    }

    fn aggregate_with_width(&self, index: usize, slot: &IntervalSlot, width: Duration) -> Summary {
        let records = slot.records.lock().unwrap_or_else(PoisonError::into_inner);
        let mut merged = IntervalRecord::new(self.loop_index, self.mode, index.to_string(), width);
        merged.latencies.reserve(records.iter().map(IntervalRecord::ops).sum());
        for record in records.iter() {
            merged.absorb(record);
        }
        merged.summarize()
    }

    /// Merge every record handed over, closed or not, into one record
    pub fn merge_all(&self, label: &str, width: Duration) -> IntervalRecord {
        let slots: Vec<Arc<IntervalSlot>> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut merged = IntervalRecord::new(self.loop_index, self.mode, label, width);
        for slot in slots {
            let records = slot.records.lock().unwrap_or_else(PoisonError::into_inner);
            for record in records.iter() {
                merged.absorb(record);
            }
        }
        merged
    }
}
