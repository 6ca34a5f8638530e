//! The transactional sink contract.
//!
//! A [`Sink`] is an output destination that builds up one *run* of records
//! at a time and either seals it (`commit`) or discards it (`revert`).
//! It owns whatever resource backs the run (a file, a buffer, an upload);
//! callers only ever touch that resource through these four operations.
//!
//! Per-sink state machine:
//!
//! ```text
//! EMPTY --consume--> BUILDING --commit--> COMMITTED
//!                       \--revert--> (back to EMPTY / COMMITTED)
//!
//! COMMITTED --consume--> BUILDING   (previous result retained until the
//!                                    next commit or finalize replaces it)
//! any state --finalize--> FINALIZED (terminal, at most once)
//! ```
//!
//! Guarantees a conforming implementation must uphold:
//! - at most one in-progress run and one committed result at any time,
//! - `revert` is a no-op when no run is in progress and never disturbs an
//!   earlier committed result,
//! - every resource it creates is released by exactly one pathway: reverted
//!   runs and superseded committed results are cleaned up eagerly, the last
//!   committed result survives `finalize`.

use std::borrow::Borrow;
use std::marker::PhantomData;

use crate::error::{Error, Result};

/// A transactional destination for runs of records.
///
/// `Record` may be unsized (e.g. `[u8]`); records are always passed by
/// reference because one record can be consumed by several sinks in the
/// same iteration.
pub trait Sink {
    /// Record type accepted by [`consume`].
    ///
    /// [`consume`]: Sink::consume
    type Record: ?Sized;

    /// Identifying value of a committed run, returned by [`finalize`].
    ///
    /// [`finalize`]: Sink::finalize
    type Output;

    /// Append a record to the in-progress run, starting one if needed.
    fn consume(&mut self, record: &Self::Record) -> Result<()>;

    /// Abandon the in-progress run and release its resource.
    fn revert(&mut self) -> Result<()>;

    /// Seal the in-progress run as the retained result, releasing any
    /// previously committed resource first.
    fn commit(&mut self) -> Result<()>;

    /// Terminal call: release any dangling in-progress run and return the
    /// committed result, if any. Must be called at most once.
    fn finalize(&mut self) -> Result<Option<Self::Output>>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    type Record = S::Record;
    type Output = S::Output;

    fn consume(&mut self, record: &Self::Record) -> Result<()> {
        (**self).consume(record)
    }

    fn revert(&mut self) -> Result<()> {
        (**self).revert()
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }

    fn finalize(&mut self) -> Result<Option<Self::Output>> {
        (**self).finalize()
    }
}

/// An ordered group of sinks driven as one.
///
/// Consumes slices of records, one per child, and fans every operation out
/// positionally. From the sampler's point of view the group advances
/// atomically; a record slice whose length differs from the child count is
/// rejected before any child sees it.
///
/// `T` is the owned element type of the record slices, e.g.
/// `MultiSink<FilerSink<MemoryFilerFactory>, Vec<u8>>` consumes
/// `&[Vec<u8>]`.
#[derive(Debug)]
pub struct MultiSink<S, T> {
    elements: Vec<S>,
    _record: PhantomData<fn(&T)>,
}

impl<S, T> MultiSink<S, T> {
    /// Group `elements` into a single composite sink.
    pub fn new(elements: Vec<S>) -> Self {
        Self {
            elements,
            _record: PhantomData,
        }
    }

    /// Number of child sinks.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the group has no children.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<S, T> Sink for MultiSink<S, T>
where
    S: Sink,
    T: Borrow<S::Record>,
{
    type Record = [T];
    type Output = Vec<Option<S::Output>>;

    fn consume(&mut self, records: &[T]) -> Result<()> {
        if records.len() != self.elements.len() {
            return Err(Error::Usage("record arity does not match sink count"));
        }
        for (element, record) in self.elements.iter_mut().zip(records) {
            element.consume(record.borrow())?;
        }
        Ok(())
    }

    fn revert(&mut self) -> Result<()> {
        for element in &mut self.elements {
            element.revert()?;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        for element in &mut self.elements {
            element.commit()?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<Option<Self::Output>> {
        let mut results = Vec::with_capacity(self.elements.len());
        for element in &mut self.elements {
            results.push(element.finalize()?);
        }
        Ok(Some(results))
    }
}
