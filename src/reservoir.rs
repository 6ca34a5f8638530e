//! Run-reservoir sampling.
//!
//! Maintains `k` slots, each bound to one [`Sink`] and one run length, and
//! draws a uniformly random *contiguous run* of records per slot from a
//! single-pass stream of unknown length.
//!
//! This generalizes classic reservoir sampling (Vitter's Algorithm R) from
//! single items to fixed-length runs: for the `i`-th record (1-based) a
//! draw `r = randrange(i)` with `r < k` starts a new run on slot `r`,
//! exactly matching the `k/i` replacement probability of `k` parallel
//! reservoirs. A slot that is mid-run when reselected discards its old run
//! in full (the new run must start at the current record), which is where
//! the transactional sink contract comes in: the superseded run is
//! `revert`ed before the new run's first `consume`, and only runs that
//! reach their full length are ever `commit`ted.
//!
//! ## References
//!
//! - Vitter (1985): reservoir sampling “Algorithm R”.
//!
//! Notes:
//! - This module provides `*_with_rng` entrypoints for deterministic
//!   testing, and `*_with` entrypoints taking a bare `randrange` closure.
//! - The sampler performs no I/O of its own; sink errors propagate to the
//!   caller uncaught, with invariants intact up to the failing call.

use rand::prelude::*;
use std::borrow::Borrow;

use crate::error::{Error, Result};
use crate::sink::Sink;

/// One reservoir position: a sink plus its assigned run length.
///
/// Slots are fixed at setup; only their occupancy (whether a run is in
/// flight) changes during sampling.
#[derive(Debug)]
pub struct Slot<S> {
    sink: S,
    run_length: usize,
}

impl<S> Slot<S> {
    /// Bind `sink` to runs of exactly `run_length` records.
    pub fn new(sink: S, run_length: usize) -> Self {
        Self { sink, run_length }
    }

    pub fn run_length(&self) -> usize {
        self.run_length
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Recover the sink, e.g. to finalize it after sampling.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// A push-style run-reservoir sampler over `k` slots.
///
/// Feed records one at a time with [`observe`] (or the deterministic
/// variants), then call [`finish`] once the stream is exhausted to revert
/// any runs still in flight. Results are retrieved by finalizing each
/// slot's sink afterwards.
///
/// [`observe`]: RunReservoir::observe
/// [`finish`]: RunReservoir::finish
#[derive(Debug)]
pub struct RunReservoir<S> {
    slots: Vec<Slot<S>>,
    // Remaining record count per slot; `None` means the slot is idle.
    remaining: Vec<Option<usize>>,
    seen: usize,
    log_every: Option<usize>,
}

impl<S: Sink> RunReservoir<S> {
    /// Create a sampler over `slots`.
    ///
    /// Rejects an empty slot list and run lengths of zero before any record
    /// is processed.
    pub fn new(slots: Vec<Slot<S>>) -> Result<Self> {
        if slots.is_empty() {
            return Err(Error::NoSlots);
        }
        for (index, slot) in slots.iter().enumerate() {
            if slot.run_length == 0 {
                return Err(Error::ZeroRunLength { slot: index });
            }
        }
        let remaining = vec![None; slots.len()];
        Ok(Self {
            slots,
            remaining,
            seen: 0,
            log_every: None,
        })
    }

    /// Emit a `tracing` progress event every `period` records (0 disables).
    ///
    /// Purely observational; has no effect on sampling.
    pub fn log_every(mut self, period: usize) -> Self {
        self.log_every = (period > 0).then_some(period);
        self
    }

    /// Number of records observed so far.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Number of slots currently mid-run.
    pub fn active_runs(&self) -> usize {
        self.remaining.iter().filter(|r| r.is_some()).count()
    }

    /// Observe one record using the thread RNG.
    pub fn observe(&mut self, record: &S::Record) -> Result<()> {
        let mut rng = rand::rng();
        self.observe_with_rng(record, &mut rng)
    }

    /// Observe one record using a caller-supplied RNG.
    ///
    /// This exists primarily for deterministic testing.
    pub fn observe_with_rng<R: Rng + ?Sized>(
        &mut self,
        record: &S::Record,
        rng: &mut R,
    ) -> Result<()> {
        self.observe_with(record, |n| rng.random_range(0..n))
    }

    /// Observe one record using a bare `randrange(n) -> [0, n)` draw.
    ///
    /// A draw outside `[0, n)` is rejected with [`Error::Generator`] before
    /// it can bias slot selection.
    pub fn observe_with<F>(&mut self, record: &S::Record, mut randrange: F) -> Result<()>
    where
        F: FnMut(usize) -> usize,
    {
        self.seen += 1;
        let index = self.seen;
        let k = self.slots.len();

        let drawn = randrange(index);
        if drawn >= index {
            return Err(Error::Generator {
                drawn,
                bound: index,
            });
        }

        // Replacement happens with probability k/index; the replaced slot
        // is uniform over the k slots. A slot reselected mid-run discards
        // its old run in full, since the new run starts at this record.
        if drawn < k {
            if self.remaining[drawn].is_some() {
                self.slots[drawn].sink.revert()?;
            }
            self.remaining[drawn] = Some(self.slots[drawn].run_length);
        }

        // Every active slot, including one activated just above, consumes
        // the current record; a run that reaches its full length commits on
        // the same iteration.
        for slot in 0..k {
            let Some(left) = self.remaining[slot] else {
                continue;
            };
            self.slots[slot].sink.consume(record)?;
            if left == 1 {
                self.slots[slot].sink.commit()?;
                self.remaining[slot] = None;
            } else {
                self.remaining[slot] = Some(left - 1);
            }
        }

        if let Some(period) = self.log_every {
            if index % period == 0 {
                tracing::debug!(
                    seen = index,
                    active = self.active_runs(),
                    "run reservoir progress"
                );
            }
        }

        Ok(())
    }

    /// Revert every run still in flight (stream ended mid-run).
    ///
    /// Runs shorter than their configured length are never committed.
    pub fn finish(&mut self) -> Result<()> {
        for slot in 0..self.slots.len() {
            if self.remaining[slot].take().is_some() {
                self.slots[slot].sink.revert()?;
            }
        }
        Ok(())
    }

    /// Recover the slots, e.g. to finalize their sinks.
    pub fn into_slots(self) -> Vec<Slot<S>> {
        self.slots
    }
}

/// Sample runs from `source` into `slots` using the thread RNG.
///
/// Returns nothing; results are retrieved by finalizing each slot's sink
/// after the call returns.
pub fn sample_runs<S, I>(source: I, slots: &mut [Slot<S>]) -> Result<()>
where
    S: Sink,
    I: IntoIterator,
    I::Item: Borrow<S::Record>,
{
    let mut rng = rand::rng();
    sample_runs_with_rng(source, slots, &mut rng)
}

/// Sample runs using a caller-supplied RNG (for reproducibility).
pub fn sample_runs_with_rng<S, I, R>(source: I, slots: &mut [Slot<S>], rng: &mut R) -> Result<()>
where
    S: Sink,
    I: IntoIterator,
    I::Item: Borrow<S::Record>,
    R: Rng + ?Sized,
{
    sample_runs_with(source, slots, |n| rng.random_range(0..n))
}

/// Sample runs using a bare `randrange(n) -> [0, n)` draw.
pub fn sample_runs_with<S, I, F>(source: I, slots: &mut [Slot<S>], mut randrange: F) -> Result<()>
where
    S: Sink,
    I: IntoIterator,
    I::Item: Borrow<S::Record>,
    F: FnMut(usize) -> usize,
{
    let borrowed = slots
        .iter_mut()
        .map(|slot| Slot::new(&mut slot.sink, slot.run_length))
        .collect();
    let mut reservoir = RunReservoir::new(borrowed)?;
    for record in source {
        reservoir.observe_with(record.borrow(), &mut randrange)?;
    }
    reservoir.finish()
}
