//! The `NestedClass` table (0x29): the nesting relation between type definitions.

mod reader;

use crate::metadata::token::Token;

/// A row of the `NestedClass` table.
#[derive(Clone, Debug)]
pub struct NestedClassRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// The nested type
    pub nested_class: u32,
    /// The type it is nested in
    pub enclosing_class: u32,
}
