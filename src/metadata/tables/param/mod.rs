//! The `Param` table (0x08). Sequence 0 describes the return value.

mod reader;

use crate::metadata::token::Token;

/// A row of the `Param` table.
#[derive(Clone, Debug)]
pub struct ParamRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// `ParamAttributes` bitmask
    pub flags: u32,
    /// 1-based parameter position, 0 for the return value
    pub sequence: u32,
    /// Index into `#Strings`: parameter name
    pub name: u32,
}
