//! Metadata streams: the stream directory of the metadata root and the heaps and table stream
//! it points to.
//!
//! # Key Components
//!
//! - [`StreamHeader`] - one entry of the stream directory
//! - [`Strings`], [`Blob`], [`Guid`] - the `#Strings`, `#Blob` and `#GUID` heaps
//! - [`TablesHeader`] - the `#~` table stream
//! - [`PdbStream`] - the `#Pdb` stream of portable PDBs

mod blob;
mod guid;
mod pdb;
mod streamheader;
mod strings;
mod tablesheader;

pub use blob::Blob;
pub use guid::Guid;
pub use pdb::PdbStream;
pub use streamheader::{StreamHeader, STREAM_NAMES};
pub use strings::Strings;
pub use tablesheader::TablesHeader;
