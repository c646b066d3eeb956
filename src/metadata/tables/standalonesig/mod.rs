//! The `StandAloneSig` table (0x11); method bodies reference their locals signature through it.

mod reader;

use crate::metadata::token::Token;

/// A row of the `StandAloneSig` table.
#[derive(Clone, Debug)]
pub struct StandAloneSigRaw {
    /// Row id, 1-based
    pub rid: u32,
    /// Token of this row
    pub token: Token,
    /// Offset of the row inside the table data
    pub offset: usize,
    /// Index into `#Blob`: the signature
    pub signature: u32,
}
