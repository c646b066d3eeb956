//! Finding a module's symbol file and mapping IL offsets to source lines.
//!
//! The pieces, in the order symbolication uses them:
//!
//! - [`extract_debug_meta`] reads a module's [`DebugMeta`] (symbol file path, signature, age,
//!   checksums) from its PE debug directory
//! - [`SymbolReaderCache`] searches for the matching portable PDB as configured by
//!   [`SymbolOptions`] and keeps the opened reader per module id
//! - [`resolve_sequence_point`] picks the sequence point covering an IL offset
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotsym::{
//!     metadata::{cilmodule::CilModule, token::Token},
//!     symbols::{SymbolOptions, SymbolReaderCache},
//! };
//! use std::path::Path;
//!
//! let module = CilModule::from_file(Path::new("App.dll"))?;
//! let cache = SymbolReaderCache::new(SymbolOptions::default());
//!
//! if let Some(meta) = module.debug_meta()? {
//!     if let Some(pdb) = cache.get(&meta)? {
//!         if let Some(location) = pdb.resolve(Token::new(0x0600_0001), 0x12)? {
//!             println!("{}:line {}", location.file, location.line);
//!         }
//!     }
//! }
//! # Ok::<(), dotsym::Error>(())
//! ```

mod cache;
mod debugmeta;
mod options;
mod resolver;

pub use cache::{FileSystemOpener, SymbolFileOpener, SymbolReaderCache};
pub use crate::file::debugdirectory::CodeViewRecord;
pub use debugmeta::{
    extract_debug_meta, read_pdb_checksum, DebugMeta, DebugType, PORTABLE_CODEVIEW_MINOR_VERSION,
};
pub use options::SymbolOptions;
pub use resolver::resolve_sequence_point;
