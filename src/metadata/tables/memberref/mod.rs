//! The `MemberRef` table (0x0A): references to fields and methods of other types, including
//! members of generic instantiations of local types.

mod reader;

use crate::metadata::{tables::CodedIndex, token::Token};

/// A row of the `MemberRef` table.
#[derive(Clone, Debug)]
pub struct MemberRefRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// The type (or module, or vararg method) the member belongs to
    pub class: CodedIndex,
    /// Index into `#Strings`: member name
    pub name: u32,
    /// Index into `#Blob`: member signature
    pub signature: u32,
}
