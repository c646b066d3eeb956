//! The portable PDB `Document` table (0x30): one row per source file.

mod reader;

use crate::metadata::token::Token;

/// A row of the `Document` table.
///
/// The `name` blob is not a string but a separator byte followed by `#Blob` indexes of the
/// path parts, see [`crate::metadata::portablepdb`].
#[derive(Clone, Debug)]
pub struct DocumentRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// Index into `#Blob`: the encoded document name
    pub name: u32,
    /// Index into `#GUID`: hash algorithm id
    pub hash_algorithm: u32,
    /// Index into `#Blob`: the content hash
    pub hash: u32,
    /// Index into `#GUID`: source language id
    pub language: u32,
}
