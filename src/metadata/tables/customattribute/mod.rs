//! The `CustomAttribute` table (0x0C).

mod reader;

use crate::metadata::{tables::CodedIndex, token::Token};

/// A row of the `CustomAttribute` table.
#[derive(Clone, Debug)]
pub struct CustomAttributeRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// The annotated entity
    pub parent: CodedIndex,
    /// The attribute constructor
    pub constructor: CodedIndex,
    /// Index into `#Blob`: the serialized arguments
    pub value: u32,
}
