//! The `Module` table (0x00): the single row naming the module and carrying its MVID.

mod reader;

use crate::metadata::token::Token;

/// A row of the `Module` table.
///
/// The `mvid` column is the module version id that a symbol file for this build must echo.
#[derive(Clone, Debug)]
pub struct ModuleRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// Reserved, always 0
    pub generation: u32,
    /// Index into `#Strings`: module name
    pub name: u32,
    /// Index into `#GUID`: the module version id
    pub mvid: u32,
    /// Index into `#GUID`: edit-and-continue id
    pub encid: u32,
    /// Index into `#GUID`: edit-and-continue base id
    pub encbaseid: u32,
}
