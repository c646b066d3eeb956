//! The `TypeDef` table (0x02): types defined in this module.
//!
//! Field and method ownership is expressed as runs: a type owns the rows from its `field_list`
//! (`method_list`) up to the next type's, or to the end of the table for the last type.

mod reader;

use crate::metadata::{tables::CodedIndex, token::Token};

/// A row of the `TypeDef` table.
#[derive(Clone, Debug)]
pub struct TypeDefRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// `TypeAttributes` bitmask
    pub flags: u32,
    /// Index into `#Strings`: simple type name
    pub type_name: u32,
    /// Index into `#Strings`: namespace
    pub type_namespace: u32,
    /// Base type, null for interfaces and `System.Object`
    pub extends: CodedIndex,
    /// First row of the owned run in the `Field` table
    pub field_list: u32,
    /// First row of the owned run in the `MethodDef` table
    pub method_list: u32,
}
