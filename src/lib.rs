// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # dotsym
//!
//! Symbolication of .NET managed stack traces.
//!
//! A process that crashes in production rarely has its symbol files at hand. What it can
//! record cheaply is, per frame, the module's MVID, the method's metadata token and the IL
//! offset, plus the debug metadata of each module involved. `dotsym` takes such a trace on
//! another machine, finds the matching portable PDBs and fills in file, line and column. Given
//! the modules themselves, it also turns compiler-generated methods (`async` state machines,
//! iterators, lambdas, local functions) back into the methods the user wrote.
//!
//! ## Features
//!
//! - **Debug directory decoding** - CodeView and `PdbChecksum` records into a [`symbols::DebugMeta`]
//! - **Symbol lookup** - probing a symbol store, with at-most-once caching per module
//! - **Portable PDB reading** - documents and sequence points, memory-mapped
//! - **Demystification** - readable C# signatures for generated methods
//! - **Rendering** - the familiar `   at ... in file:line N` text, or JSON
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dotsym::prelude::*;
//! use std::{path::Path, sync::Arc};
//!
//! let module = Arc::new(CilModule::from_file(Path::new("App.dll"))?);
//! let mvid = module.mvid()?;
//!
//! // What the crashing process captured
//! let mut trace = StackTraceInformation::empty();
//! trace.push(
//!     StackFrameInformation::new(mvid, 0x0600_0004, 0x2C, true),
//!     module.debug_meta()?.as_ref(),
//! );
//!
//! // Later, next to the symbol store
//! let symbolicator = Symbolicator::new(SymbolOptions::server("/srv/symbols"))
//!     .with_module(mvid, module);
//! for failure in symbolicator.symbolicate(&mut trace) {
//!     eprintln!("{failure}");
//! }
//!
//! print!("{}", trace.render(TraceFormat::Default)?);
//! # Ok::<(), dotsym::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`symbols`] - Debug metadata, symbol file lookup and caching, sequence point resolution
//! - [`demystify`] - Generated-name resolution over a [`demystify::MetadataProvider`]
//! - [`stacktrace`] - Frames, traces, rendering and the [`stacktrace::Symbolicator`]
//! - [`metadata`] - ECMA-335 readers for modules and portable PDBs
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! `dotsym` logs through the [`log`] facade and never installs a logger. Probing is logged at
//! `debug`, opened symbol files at `info`, unusable or mismatched symbol files at `warn`.
//!
//! ## Error Handling
//!
//! Symbolication is best effort: a symbol file that does not exist is `Ok(None)`, and a method
//! that cannot be demystified keeps a weaker display form. Errors are reserved for broken input.
//!
//! ```rust,no_run
//! use dotsym::{Error, metadata::cilmodule::CilModule};
//!
//! match CilModule::from_file(std::path::Path::new("native.dll")) {
//!     Ok(module) => println!("loaded {:?}", module.name()),
//!     Err(Error::NotSupported) => println!("not a .NET module"),
//!     Err(Error::Malformed { message, .. }) => println!("Malformed file: {}", message),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Development and Testing
//!
//! ```bash
//! cargo test
//! cargo bench
//! cargo +nightly fuzz run portablepdb --release
//! ```

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use dotsym::prelude::*;
///
/// let cache = SymbolReaderCache::new(SymbolOptions::default());
/// let module = CilModule::from_file("App.dll".as_ref())?;
/// if let Some(meta) = module.debug_meta()? {
///     println!("{meta}: {}", cache.get(&meta)?.is_some());
/// }
/// # Ok::<(), dotsym::Error>(())
/// ```
pub mod prelude;

/// ECMA-335 metadata readers for .NET modules and portable PDBs.
pub mod metadata;

/// Readable names for compiler-generated methods and the frame visibility filter.
pub mod demystify;

/// Debug metadata, symbol file lookup and sequence point resolution.
pub mod symbols;

/// Stack traces, their rendering and symbolication.
pub mod stacktrace;

/// `dotsym` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
///
/// # Examples
///
/// ```rust,no_run
/// use dotsym::{metadata::portablepdb::PortablePdb, Result};
///
/// fn load_pdb(path: &str) -> Result<PortablePdb> {
///     PortablePdb::from_file(std::path::Path::new(path))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `dotsym` Error type
///
/// Parse failures of modules and symbol files; lookups that find nothing are not errors.
pub use error::Error;

/// Low-level PE file access and parsing utilities.
///
/// [`File`] owns a loaded PE image (memory-mapped or in memory) and exposes its CLR header and
/// debug directory; [`Parser`] reads little-endian and ECMA-335 compressed values.
pub use file::{debugdirectory::DebugDirectoryEntry, parser::Parser, File};
