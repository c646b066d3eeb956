//! The `Field` table (0x04).

mod reader;

use crate::metadata::token::Token;

/// A row of the `Field` table.
#[derive(Clone, Debug)]
pub struct FieldRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// `FieldAttributes` bitmask
    pub flags: u32,
    /// Index into `#Strings`: field name
    pub name: u32,
    /// Index into `#Blob`: field signature
    pub signature: u32,
}
