//! The `GenericParam` table (0x2A).

mod reader;

use crate::metadata::{tables::CodedIndex, token::Token};

/// A row of the `GenericParam` table.
#[derive(Clone, Debug)]
pub struct GenericParamRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// 0-based position in the owner's parameter list
    pub number: u32,
    /// `GenericParamAttributes` bitmask
    pub flags: u32,
    /// The generic type or method
    pub owner: CodedIndex,
    /// Index into `#Strings`: parameter name
    pub name: u32,
}
