//! Per-worker interval ledger
//!
//! Each worker owns exactly one ledger per phase and is the only writer, so
//! recording an operation is a plain push with no synchronization. The ledger
//! rolls over to a fresh [`IntervalRecord`] every time the wall clock crosses
//! an interval boundary `start + width * (k + 1)`.
//!
//! With interval reporting disabled (no width) the ledger keeps a single
//! unbounded interval and [`WorkerLedger::advance`] never moves.

use super::summary::IntervalRecord;
use crate::config::workload::Mode;
use std::time::{Duration, Instant};

/// Interval position of a ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Recording into interval `n`
    Active(usize),
    /// `finish()` was called; nothing more is recorded
    Finished,
}

/// One worker's private record of a phase, organized by interval
#[derive(Debug)]
pub struct WorkerLedger {
    loop_index: usize,
    mode: Mode,
    start: Instant,
    width: Option<Duration>,
    cursor: Cursor,
    intervals: Vec<IntervalRecord>,
}

impl WorkerLedger {
    /// Create a ledger whose interval 0 begins at `start`
    pub fn new(loop_index: usize, mode: Mode, start: Instant, width: Option<Duration>) -> Self {
        Self {
            loop_index,
            mode,
            start,
            width,
            cursor: Cursor::Active(0),
            intervals: vec![IntervalRecord::new(loop_index, mode, "0", width.unwrap_or_default())],
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Index of the interval currently being recorded, `None` once finished
    pub fn current(&self) -> Option<usize> {
        match self.cursor {
            Cursor::Active(i) => Some(i),
            Cursor::Finished => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.cursor == Cursor::Finished
    }

    /// Record a successful operation into the current interval
    #[inline]
    pub fn record_op(&mut self, bytes: u64, latency_nanos: u64) {
        if let Cursor::Active(i) = self.cursor {
            self.intervals[i].record_op(bytes, latency_nanos);
        }
    }

    /// Record a failed operation into the current interval
    #[inline]
    pub fn record_slowdown(&mut self) {
        if let Cursor::Active(i) = self.cursor {
            self.intervals[i].record_slowdown();
        }
    }

    /// Roll forward over every interval boundary already passed at `now`
    ///
    /// Returns the (possibly unchanged) current interval index. Intervals
    /// skipped entirely by a slow operation are created empty. Returns `None`
    /// once the ledger is finished.
    pub fn advance(&mut self, now: Instant) -> Option<usize> {
        let Cursor::Active(mut current) = self.cursor else {
            return None;
        };
        let Some(width) = self.width else {
            return Some(current);
        };

        let elapsed = now.saturating_duration_since(self.start).as_nanos();
        let width_nanos = width.as_nanos().max(1);
        while width_nanos * (current as u128 + 1) < elapsed {
            current += 1;
            self.intervals.push(IntervalRecord::new(
                self.loop_index,
                self.mode,
                current.to_string(),
                width,
            ));
        }
        self.cursor = Cursor::Active(current);
        Some(current)
    }

    /// Stop recording. Idempotent.
    pub fn finish(&mut self) {
        self.cursor = Cursor::Finished;
    }

    /// Number of intervals opened so far
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn interval(&self, index: usize) -> Option<&IntervalRecord> {
        self.intervals.get(index)
    }

    /// Move interval `index` out of the ledger, leaving an empty record in its place
    ///
    /// Used to hand a closed interval to the barrier without copying its samples.
    pub fn take_interval(&mut self, index: usize) -> Option<IntervalRecord> {
        let slot = self.intervals.get_mut(index)?;
        let empty = IntervalRecord::new(slot.loop_index, slot.mode, slot.label.clone(), slot.width);
        Some(std::mem::replace(slot, empty))
    }

    pub fn intervals(&self) -> &[IntervalRecord] {
        &self.intervals
    }
}
