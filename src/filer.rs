//! Resource-backed sinks.
//!
//! A [`Filer`] is the narrow contract a [`FilerSink`] needs from whatever
//! actually holds run bytes: append, close, identify, delete. Two backends
//! are provided:
//! - [`FileFiler`] / [`DirFilerFactory`]: real files under a directory; the
//!   on-disk layout is the raw concatenation of the run's record bytes in
//!   arrival order.
//! - [`MemoryFiler`] / [`MemoryFilerFactory`]: byte buffers in a shared
//!   in-process store, handy for tests and demos.
//!
//! Filers are created lazily through a [`NewFiler`] factory the first time a
//! run consumes a record, so a sink that never gets selected never touches
//! the backend. Factories are explicit objects carrying their own counter
//! state rather than closures over shared mutable counters.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::sink::Sink;

/// One append-only resource holding the bytes of a single run.
pub trait Filer {
    /// Append bytes. Writing after `close` is a usage error.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Flush and stop accepting writes. The resource itself survives.
    fn close(&mut self) -> Result<()>;

    /// Identifying name of the resource (e.g. a file path).
    fn name(&self) -> &str;

    /// Release the resource entirely (close and delete).
    fn cleanup(&mut self) -> Result<()>;
}

/// Factory handing out a fresh [`Filer`] per run.
pub trait NewFiler {
    type Filer: Filer;

    fn new_filer(&mut self) -> Result<Self::Filer>;
}

/// A sink that stages each run in a [`Filer`] and keeps at most one
/// committed filer alive at a time.
///
/// Consumes byte-slice records; [`Sink::finalize`] returns the committed
/// filer's name.
#[derive(Debug)]
pub struct FilerSink<N: NewFiler> {
    filers: N,
    active: Option<N::Filer>,
    committed: Option<N::Filer>,
    finalized: bool,
}

impl<N: NewFiler> FilerSink<N> {
    pub fn new(filers: N) -> Self {
        Self {
            filers,
            active: None,
            committed: None,
            finalized: false,
        }
    }
}

impl<N: NewFiler> Sink for FilerSink<N> {
    type Record = [u8];
    type Output = String;

    fn consume(&mut self, record: &[u8]) -> Result<()> {
        if self.finalized {
            return Err(Error::Usage("consume after finalize"));
        }
        if let Some(filer) = self.active.as_mut() {
            return filer.write(record);
        }
        let mut filer = self.filers.new_filer()?;
        tracing::trace!(name = filer.name(), "run started");
        filer.write(record)?;
        self.active = Some(filer);
        Ok(())
    }

    fn revert(&mut self) -> Result<()> {
        if self.finalized {
            return Err(Error::Usage("revert after finalize"));
        }
        if let Some(mut filer) = self.active.take() {
            tracing::trace!(name = filer.name(), "run reverted");
            filer.cleanup()?;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.finalized {
            return Err(Error::Usage("commit after finalize"));
        }
        let Some(mut fresh) = self.active.take() else {
            return Err(Error::Usage("commit without a run in progress"));
        };
        fresh.close()?;
        if let Some(mut superseded) = self.committed.take() {
            superseded.cleanup()?;
        }
        tracing::trace!(name = fresh.name(), "run committed");
        self.committed = Some(fresh);
        Ok(())
    }

    fn finalize(&mut self) -> Result<Option<String>> {
        if self.finalized {
            return Err(Error::Usage("finalize called twice"));
        }
        self.finalized = true;
        // A run still in progress here was never committed, so its resource
        // must not survive.
        if let Some(mut dangling) = self.active.take() {
            dangling.cleanup()?;
        }
        match self.committed.take() {
            Some(filer) => Ok(Some(filer.name().to_owned())),
            None => Ok(None),
        }
    }
}

/// A run staged in a real file.
#[derive(Debug)]
pub struct FileFiler {
    name: String,
    path: PathBuf,
    file: Option<File>,
}

impl Filer for FileFiler {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        match self.file.as_mut() {
            Some(file) => Ok(file.write_all(data)?),
            None => Err(Error::Usage("write after close")),
        }
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn cleanup(&mut self) -> Result<()> {
        self.file = None;
        std::fs::remove_file(&self.path)?;
        Ok(())
    }
}

/// Creates numbered files `<stem>_<n>` under a directory.
#[derive(Debug)]
pub struct DirFilerFactory {
    dir: PathBuf,
    stem: String,
    counter: usize,
}

impl DirFilerFactory {
    pub fn new(dir: impl AsRef<Path>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            stem: stem.into(),
            counter: 0,
        }
    }
}

impl NewFiler for DirFilerFactory {
    type Filer = FileFiler;

    fn new_filer(&mut self) -> Result<FileFiler> {
        let path = self.dir.join(format!("{}_{}", self.stem, self.counter));
        self.counter += 1;
        let file = File::create(&path)?;
        Ok(FileFiler {
            name: path.display().to_string(),
            path,
            file: Some(file),
        })
    }
}

/// Shared in-process backend for [`MemoryFiler`]s.
///
/// Cloning is cheap and all clones see the same entries, so a test can keep
/// a handle and inspect what survived after sampling and finalize.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Bytes currently held under `name`, if the resource is still live.
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.entries.borrow().get(name).cloned()
    }

    /// Names of all live resources, in lexicographic order.
    pub fn names(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    /// Number of live resources.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// A run staged in an in-process byte buffer.
#[derive(Debug)]
pub struct MemoryFiler {
    name: String,
    closed: bool,
    store: MemoryStore,
}

impl Filer for MemoryFiler {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(Error::Usage("write after close"));
        }
        self.store
            .entries
            .borrow_mut()
            .entry(self.name.clone())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn cleanup(&mut self) -> Result<()> {
        self.closed = true;
        self.store.entries.borrow_mut().remove(&self.name);
        Ok(())
    }
}

/// Creates numbered in-memory filers `<prefix>_<n>`.
#[derive(Debug)]
pub struct MemoryFilerFactory {
    prefix: String,
    counter: usize,
    store: MemoryStore,
}

impl MemoryFilerFactory {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
            store: MemoryStore::default(),
        }
    }

    /// Handle to the backing store, for inspection after sampling.
    pub fn store(&self) -> MemoryStore {
        self.store.clone()
    }
}

impl NewFiler for MemoryFilerFactory {
    type Filer = MemoryFiler;

    fn new_filer(&mut self) -> Result<MemoryFiler> {
        let name = format!("{}_{}", self.prefix, self.counter);
        self.counter += 1;
        self.store
            .entries
            .borrow_mut()
            .insert(name.clone(), Vec::new());
        Ok(MemoryFiler {
            name,
            closed: false,
            store: self.store.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_filer_rejects_write_after_close() {
        let mut factory = MemoryFilerFactory::new("t");
        let mut filer = factory.new_filer().unwrap();
        filer.write(b"ok").unwrap();
        filer.close().unwrap();
        assert!(matches!(filer.write(b"no"), Err(Error::Usage(_))));
    }

    #[test]
    fn commit_retains_one_result_and_cleans_the_superseded_one() {
        let factory = MemoryFilerFactory::new("t");
        let store = factory.store();
        let mut sink = FilerSink::new(factory);

        sink.consume(b"first").unwrap();
        sink.commit().unwrap();
        assert_eq!(store.names(), vec!["t_0".to_string()]);

        sink.consume(b"second").unwrap();
        sink.commit().unwrap();
        assert_eq!(store.names(), vec!["t_1".to_string()]);
        assert_eq!(store.contents("t_1").unwrap(), b"second");
    }

    #[test]
    fn revert_discards_the_run_but_not_an_earlier_commit() {
        let factory = MemoryFilerFactory::new("t");
        let store = factory.store();
        let mut sink = FilerSink::new(factory);

        sink.consume(b"kept").unwrap();
        sink.commit().unwrap();
        sink.consume(b"doomed").unwrap();
        sink.revert().unwrap();

        assert_eq!(store.names(), vec!["t_0".to_string()]);
        assert_eq!(sink.finalize().unwrap().as_deref(), Some("t_0"));
        assert_eq!(store.contents("t_0").unwrap(), b"kept");
    }

    #[test]
    fn revert_is_a_noop_when_idle() {
        let mut sink = FilerSink::new(MemoryFilerFactory::new("t"));
        sink.revert().unwrap();
        assert_eq!(sink.finalize().unwrap(), None);
    }

    #[test]
    fn finalize_cleans_a_dangling_run() {
        let factory = MemoryFilerFactory::new("t");
        let store = factory.store();
        let mut sink = FilerSink::new(factory);

        sink.consume(b"dangling").unwrap();
        assert_eq!(sink.finalize().unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn operations_after_finalize_are_usage_errors() {
        let mut sink = FilerSink::new(MemoryFilerFactory::new("t"));
        assert_eq!(sink.finalize().unwrap(), None);

        assert!(matches!(sink.consume(b"x"), Err(Error::Usage(_))));
        assert!(matches!(sink.commit(), Err(Error::Usage(_))));
        assert!(matches!(sink.revert(), Err(Error::Usage(_))));
        assert!(matches!(sink.finalize(), Err(Error::Usage(_))));
    }

    #[test]
    fn commit_without_a_run_is_a_usage_error() {
        let mut sink = FilerSink::new(MemoryFilerFactory::new("t"));
        assert!(matches!(sink.commit(), Err(Error::Usage(_))));
    }
}
