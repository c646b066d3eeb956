//! The `InterfaceImpl` table (0x09): which interfaces a type implements.

mod reader;

use crate::metadata::{tables::CodedIndex, token::Token};

/// A row of the `InterfaceImpl` table.
#[derive(Clone, Debug)]
pub struct InterfaceImplRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// The implementing type
    pub class: u32,
    /// The implemented interface
    pub interface: CodedIndex,
}
