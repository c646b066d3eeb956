//! The `TypeSpec` table (0x1B): constructed types such as generic instantiations.

mod reader;

use crate::metadata::token::Token;

/// A row of the `TypeSpec` table.
#[derive(Clone, Debug)]
pub struct TypeSpecRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// Index into `#Blob`: the type signature
    pub signature: u32,
}
