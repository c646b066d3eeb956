//! The `MethodSpec` table (0x2B): instantiations of generic methods.

mod reader;

use crate::metadata::{tables::CodedIndex, token::Token};

/// A row of the `MethodSpec` table.
#[derive(Clone, Debug)]
pub struct MethodSpecRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// The generic method
    pub method: CodedIndex,
    /// Index into `#Blob`: the type arguments
    pub instantiation: u32,
}
