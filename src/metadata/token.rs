//! Metadata tokens.
//!
//! A token is the 32-bit handle the runtime hands out for a metadata row: the high byte names
//! the table, the low 24 bits are the 1-based row id. Captured stack frames identify their method
//! by MethodDef token, and every lookup in this crate (method bodies, sequence points, custom
//! attributes) is keyed by one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A metadata token: table id in the high byte, 1-based row id in the lower 24 bits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(pub u32);

impl Token {
    /// Creates a token from its raw value.
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token from a table id and a row id.
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Returns the table id (high byte).
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Returns the 1-based row id.
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// A token whose row id is 0 references nothing.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.row() == 0
    }

    /// Returns `true` if the token addresses the given table.
    #[must_use]
    pub fn is_table(&self, table: u8) -> bool {
        self.table() == table
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts() {
        let token = Token::from_parts(0x06, 5);
        assert_eq!(token.value(), 0x0600_0005);
        assert_eq!(token.table(), 0x06);
        assert_eq!(token.row(), 5);
        assert!(token.is_table(0x06));
        assert!(!token.is_null());
    }

    #[test]
    fn null_rows() {
        assert!(Token(0).is_null());
        assert!(Token(0x0200_0000).is_null());
        assert!(!Token(0x0200_0001).is_null());
    }

    #[test]
    fn formatting() {
        let token = Token(0x0600_0001);
        assert_eq!(format!("{}", token), "0x06000001");

        let debug = format!("{:?}", token);
        assert!(debug.contains("table: 0x06"));
        assert!(debug.contains("row: 1"));
    }

    #[test]
    fn serde_transparent() {
        let token = Token(0x0600_002A);
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "100663338");
        assert_eq!(serde_json::from_str::<Token>(&json).unwrap(), token);
    }
}
