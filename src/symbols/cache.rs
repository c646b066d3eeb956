//! Locating, opening and caching the symbol files of modules.
//!
//! [`SymbolReaderCache`] maps a module id to its parsed [`PortablePdb`]. The first lookup of a
//! module tries the candidate paths derived from its [`DebugMeta`] and [`SymbolOptions`]; the
//! outcome, positive or negative, is kept for the lifetime of the cache. One cache is meant to
//! be shared by every trace a process symbolicates.
//!
//! # Search order
//!
//! 1. `{symbols_path}/{module id, 32 hex digits}/{recorded file name with the symbol extension}`
//! 2. `{symbols_path}/{recorded file name with the symbol extension}`
//! 3. the recorded path itself, if [`SymbolOptions::attempt_original_symbol_path`] is set
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotsym::{metadata::cilmodule::CilModule, symbols::{SymbolOptions, SymbolReaderCache}};
//! use std::path::Path;
//!
//! let cache = SymbolReaderCache::new(SymbolOptions::server("/srv/symbols"));
//! let module = CilModule::from_file(Path::new("App.dll"))?;
//!
//! if let Some(meta) = module.debug_meta()? {
//!     if let Some(pdb) = cache.get(&meta)? {
//!         println!("{} documents", pdb.document_count());
//!     }
//! }
//! cache.dispose();
//! # Ok::<(), dotsym::Error>(())
//! ```

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
};

use dashmap::DashMap;
use uguid::Guid;

use crate::{
    metadata::portablepdb::PortablePdb,
    symbols::{DebugMeta, SymbolOptions},
    Error, Result,
};

/// Opens a symbol file at a candidate path.
///
/// The cache goes through this seam for all file access, so alternative stores (or counting
/// stubs in tests) can replace the file system.
pub trait SymbolFileOpener: Send + Sync {
    /// Opens and parses the symbol file at `path`.
    ///
    /// Returns `Ok(None)` when there is no file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file exists but cannot be read or parsed.
    fn open(&self, path: &Path) -> Result<Option<PortablePdb>>;
}

/// Opens symbol files from the local file system, memory-mapped.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSystemOpener;

impl SymbolFileOpener for FileSystemOpener {
    fn open(&self, path: &Path) -> Result<Option<PortablePdb>> {
        if !path.is_file() {
            return Ok(None);
        }

        PortablePdb::from_file(path).map(Some)
    }
}

type Lookup = std::result::Result<Option<Arc<PortablePdb>>, Arc<Error>>;

/// A thread-safe, memoizing map from module id to symbol reader.
///
/// Each module id is resolved at most once, even under concurrent lookups: the first caller
/// searches while later callers for the same id wait for its result. Lookups for different ids do
/// not block each other.
pub struct SymbolReaderCache {
    options: SymbolOptions,
    opener: Box<dyn SymbolFileOpener>,
    readers: DashMap<Guid, Arc<OnceLock<Lookup>>>,
    disposed: AtomicBool,
}

impl SymbolReaderCache {
    /// Creates an empty cache that reads symbol files from disk.
    #[must_use]
    pub fn new(options: SymbolOptions) -> Self {
        Self::with_opener(options, FileSystemOpener)
    }

    /// Creates an empty cache that opens symbol files through `opener`.
    pub fn with_opener(options: SymbolOptions, opener: impl SymbolFileOpener + 'static) -> Self {
        SymbolReaderCache {
            options,
            opener: Box::new(opener),
            readers: DashMap::new(),
            disposed: AtomicBool::new(false),
        }
    }

    /// The options this cache searches with.
    #[must_use]
    pub fn options(&self) -> &SymbolOptions {
        &self.options
    }

    /// Number of module ids resolved so far, negative results included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    /// Returns true if no module id has been resolved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// The paths tried for `meta`, in order.
    #[must_use]
    pub fn candidates(&self, meta: &DebugMeta) -> Vec<PathBuf> {
        let mut candidates = Vec::with_capacity(3);
        let file_name = meta.file_name();

        if let Some(root) = self.options.symbols_path() {
            if !file_name.is_empty() {
                let bucket = meta.module_id.to_string().replace('-', "");
                let renamed = Path::new(file_name).with_extension(&self.options.symbol_extension);
                candidates.push(root.join(bucket).join(&renamed));
                candidates.push(root.join(renamed));
            }
        }

        if self.options.attempt_original_symbol_path && !meta.file.is_empty() {
            candidates.push(PathBuf::from(&meta.file));
        }

        candidates
    }

    /// Returns the symbol reader of the module `meta` describes.
    ///
    /// `Ok(None)` means no candidate yielded a usable symbol file; that result is cached too.
    /// After [`SymbolReaderCache::dispose`] every lookup returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SymbolFile`] when no candidate was usable and at least one of them
    /// existed but failed to parse. The error is cached like any other result.
    pub fn get(&self, meta: &DebugMeta) -> Result<Option<Arc<PortablePdb>>> {
        if self.disposed.load(Ordering::Acquire) {
            return Ok(None);
        }

        let cached = self
            .readers
            .get(&meta.module_id)
            .map(|slot| Arc::clone(slot.value()));

        let slot = match cached {
            Some(slot) => {
                log::debug!("Symbol cache hit for module {}", meta.module_id);
                slot
            }
            None => Arc::clone(
                self.readers
                    .entry(meta.module_id)
                    .or_insert_with(|| Arc::new(OnceLock::new()))
                    .value(),
            ),
        };

        slot.get_or_init(|| self.locate(meta))
            .clone()
            .map_err(|source| Error::SymbolFile {
                module_id: meta.module_id,
                source,
            })
    }

    fn locate(&self, meta: &DebugMeta) -> Lookup {
        if !meta.is_portable() {
            log::debug!(
                "Module {} references a Windows PDB ({}), skipping",
                meta.module_id,
                meta.file
            );
            return Ok(None);
        }

        let mut failure = None;
        for candidate in self.candidates(meta) {
            log::debug!(
                "Probing {} for symbols of module {}",
                candidate.display(),
                meta.module_id
            );

            match self.opener.open(&candidate) {
                Ok(Some(pdb)) => {
                    let (pdb_id, _) = pdb.pdb_id();
                    if self.options.verify_pdb_id && pdb_id != meta.signature {
                        log::warn!(
                            "Symbol file {} has PDB id {}, module {} expects {}",
                            candidate.display(),
                            pdb_id,
                            meta.module_id,
                            meta.signature
                        );
                        continue;
                    }

                    log::info!(
                        "Opened symbol file {} for module {}",
                        candidate.display(),
                        meta.module_id
                    );
                    return Ok(Some(Arc::new(pdb)));
                }
                Ok(None) => {}
                Err(error) => {
                    log::warn!(
                        "Symbol file {} for module {} is unusable: {}",
                        candidate.display(),
                        meta.module_id,
                        error
                    );
                    failure.get_or_insert(error);
                }
            }
        }

        match failure {
            Some(error) => Err(Arc::new(error)),
            None => {
                log::debug!("No symbol file found for module {}", meta.module_id);
                Ok(None)
            }
        }
    }

    /// Releases every cached symbol reader and turns the cache off.
    ///
    /// Readers still held by callers stay valid until those handles are dropped. Returns the
    /// number of readers released; a second call releases nothing.
    pub fn dispose(&self) -> usize {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return 0;
        }

        let released = self
            .readers
            .iter()
            .filter(|slot| matches!(slot.value().get(), Some(Ok(Some(_)))))
            .count();
        self.readers.clear();

        log::debug!("Symbol cache released {} readers", released);
        released
    }

    /// Whether [`SymbolReaderCache::dispose`] has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl Default for SymbolReaderCache {
    fn default() -> Self {
        Self::new(SymbolOptions::default())
    }
}

impl Drop for SymbolReaderCache {
    fn drop(&mut self) {
        self.dispose();
    }
}
