//! The `TypeRef` table (0x01): references to types defined in other modules.

mod reader;

use crate::metadata::{tables::CodedIndex, token::Token};

/// A row of the `TypeRef` table.
#[derive(Clone, Debug)]
pub struct TypeRefRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// Where the type lives; a `TypeRef` scope means a nested type
    pub resolution_scope: CodedIndex,
    /// Index into `#Strings`: simple type name
    pub type_name: u32,
    /// Index into `#Strings`: namespace
    pub type_namespace: u32,
}
