//! The `MethodDef` table (0x06): methods defined in this module.
//!
//! Captured frames name their method by a token into this table.

mod reader;

use crate::metadata::token::Token;

/// A row of the `MethodDef` table.
#[derive(Clone, Debug)]
pub struct MethodDefRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// RVA of the method body, 0 for abstract and runtime-provided methods
    pub rva: u32,
    /// `MethodImplAttributes` bitmask
    pub impl_flags: u32,
    /// `MethodAttributes` bitmask
    pub flags: u32,
    /// Index into `#Strings`: method name
    pub name: u32,
    /// Index into `#Blob`: method signature
    pub signature: u32,
    /// First row of the owned run in the `Param` table
    pub param_list: u32,
}
