//! ECMA-335 metadata, as far as symbolication needs it.
//!
//! Two kinds of metadata images are read here: the one embedded in a .NET module (found
//! through the CLR header) and standalone portable PDBs. Both share the same physical layout,
//! a `BSJB` root followed by streams, so they share the readers in [`root`], [`streams`] and
//! [`tables`].
//!
//! # Key Components
//!
//! - [`cilmodule::CilModule`] - A loaded module, answering the demystifier's questions
//! - [`portablepdb::PortablePdb`] - A portable PDB, mapping IL offsets to source lines
//! - [`image::MetadataImage`] - Root, heaps and table stream of one metadata image
//! - [`signatures`] - Method, field, local and type signature decoding
//! - [`method`] - Method body headers and IL instruction walking
//! - [`customattributes`] - Custom attribute value decoding
//! - [`sequencepoints`] - The sequence point blob format of portable PDBs
//! - [`token`] - Metadata tokens
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotsym::metadata::{cilmodule::CilModule, portablepdb::PortablePdb};
//! use std::path::Path;
//!
//! let module = CilModule::from_file(Path::new("App.dll"))?;
//! let pdb = PortablePdb::from_file(Path::new("App.pdb"))?;
//!
//! println!("module {} / pdb {}", module.mvid()?, pdb.pdb_id().0);
//! # Ok::<(), dotsym::Error>(())
//! ```

/// A loaded module exposed as a metadata provider
pub mod cilmodule;
/// Implementation of the Header of CIL
pub mod cor20header;
/// Implementation of custom attribute parsing and representation
pub mod customattributes;
/// Root, heaps and tables of one metadata image
pub mod image;
/// Method bodies and IL instructions
pub mod method;
/// Standalone portable PDB reader
pub mod portablepdb;
/// Implementation of the root metadata structure
pub mod root;
/// Sequence point blobs of portable PDBs
pub mod sequencepoints;
/// Implementation of method and type signatures
pub mod signatures;
/// Implementation of all metadata streams (tables, heaps, etc.)
pub mod streams;
/// Implementation of the .NET metadata tables
pub mod tables;
/// Commonly used metadata token type
pub mod token;
