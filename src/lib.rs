//! `renzoku`: contiguous-run reservoir sampling with transactional sinks.
//!
//! Draws a uniformly random sample of `k` contiguous runs of fixed length
//! from a single-pass stream of unknown (possibly unbounded) length, writing
//! each run to an independently replaceable, resource-owning destination.
//!
//! Exposed modules:
//! - `reservoir`: the run-reservoir sampling algorithm (push-style
//!   [`RunReservoir`] plus the [`sample_runs`] drivers).
//! - `sink`: the transactional [`Sink`] contract (consume / revert /
//!   commit / finalize) and the composite [`MultiSink`].
//! - `filer`: resource-owning sink backends (files, in-memory buffers).
//! - `error`: the crate error taxonomy.
//!
//! ```
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use renzoku::{sample_runs_with_rng, FilerSink, MemoryFilerFactory, Sink, Slot};
//!
//! let factory = MemoryFilerFactory::new("sample");
//! let store = factory.store();
//! let mut slots = vec![Slot::new(FilerSink::new(factory), 15)];
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let source = (0..1000u32).map(|i| i.to_be_bytes().to_vec());
//! sample_runs_with_rng(source, &mut slots, &mut rng)?;
//!
//! let name = slots[0].sink_mut().finalize()?.expect("stream was long enough");
//! assert_eq!(store.contents(&name).unwrap().len(), 15 * 4);
//! # Ok::<(), renzoku::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod filer;
pub mod reservoir;
pub mod sink;

pub use error::{Error, Result};
pub use filer::{
    DirFilerFactory, FileFiler, Filer, FilerSink, MemoryFiler, MemoryFilerFactory, MemoryStore,
    NewFiler,
};
pub use reservoir::{sample_runs, sample_runs_with, sample_runs_with_rng, RunReservoir, Slot};
pub use sink::{MultiSink, Sink};
