//! Cursor-based binary parser for metadata blobs.
//!
//! [`Parser`] walks a byte slice with bounds checking and understands the variable-length
//! encodings used throughout ECMA-335 metadata and portable PDBs: compressed unsigned and
//! signed integers (II.23.2), compressed `TypeDefOrRef` tokens, NUL-terminated UTF-8 strings and
//! the `SerString` form used inside custom attribute blobs.
//!
//! # Examples
//!
//! ```rust
//! use dotsym::Parser;
//!
//! let data = [0x03, 0x80, 0x80, 0x7F];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_compressed_uint()?, 3);
//! assert_eq!(parser.read_compressed_uint()?, 128);
//! assert_eq!(parser.read_compressed_int()?, -1);
//! assert!(!parser.has_more_data());
//! # Ok::<(), dotsym::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, CilIO},
    metadata::token::Token,
    Result,
};

/// A generic binary data parser for reading .NET metadata structures.
///
/// The parser maintains an internal position cursor and provides bounds checking to prevent
/// buffer overruns when reading malformed or truncated data.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`Parser`] from a byte slice.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there are bytes left to read.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the cursor to an absolute position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` is past the end of the data.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the cursor forward by `step` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if this would move past the end of the data.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        let end = self.calc_end_position(step)?;
        self.position = end;
        Ok(())
    }

    /// Returns the current cursor position.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Returns the complete underlying buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the byte at the cursor without consuming it.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] at the end of the data.
    pub fn peek_byte(&self) -> Result<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or(out_of_bounds_error!())
    }

    /// Read a little-endian value of type `T`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if not enough data remains.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a compressed unsigned integer as defined in ECMA-335 II.23.2.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length or
    /// [`crate::Error::Malformed`] for an invalid lead byte.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let first_byte = self.read_le::<u8>()?;

        // 1-byte encoding: 0xxxxxxx
        if (first_byte & 0x80) == 0 {
            return Ok(u32::from(first_byte));
        }

        // 2-byte encoding: 10xxxxxx xxxxxxxx
        if (first_byte & 0xC0) == 0x80 {
            let second_byte = self.read_le::<u8>()?;
            let value = ((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte);
            return Ok(value);
        }

        // 4-byte encoding: 110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx
        if (first_byte & 0xE0) == 0xC0 {
            let b1 = u32::from(self.read_le::<u8>()?);
            let b2 = u32::from(self.read_le::<u8>()?);
            let b3 = u32::from(self.read_le::<u8>()?);
            let value = ((u32::from(first_byte) & 0x1F) << 24) | (b1 << 16) | (b2 << 8) | b3;
            return Ok(value);
        }

        Err(malformed_error!("Invalid compressed uint - {}", first_byte))
    }

    /// Read a compressed signed integer as defined in ECMA-335 II.23.2.
    ///
    /// The value is rotated left by one bit so the sign lands in the least significant bit, and
    /// negative values are truncated to the width of the chosen encoding (6, 13 or 28 bits).
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length or
    /// [`crate::Error::Malformed`] for invalid encoding.
    pub fn read_compressed_int(&mut self) -> Result<i32> {
        let first_byte = self.peek_byte()?;
        let unsigned = self.read_compressed_uint()?;

        let sign_adjust: i32 = if (first_byte & 0x80) == 0 {
            0x40
        } else if (first_byte & 0xC0) == 0x80 {
            0x2000
        } else {
            0x1000_0000
        };

        #[allow(clippy::cast_possible_wrap)]
        let magnitude = (unsigned >> 1) as i32;
        if unsigned & 1 == 0 {
            Ok(magnitude)
        } else {
            Ok(magnitude - sign_adjust)
        }
    }

    /// Read a compressed `TypeDefOrRefOrSpecEncoded` token (ECMA-335 II.23.2.8).
    ///
    /// | Tag | Table |
    /// |-----|-------|
    /// | 0x0 | TypeDef |
    /// | 0x1 | TypeRef |
    /// | 0x2 | TypeSpec |
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the reserved tag 0x3 is encountered.
    pub fn read_compressed_token(&mut self) -> Result<Token> {
        let compressed_token = self.read_compressed_uint()?;

        let table: u32 = match compressed_token & 0x3 {
            0x0 => 0x0200_0000,
            0x1 => 0x0100_0000,
            0x2 => 0x1B00_0000,
            _ => {
                return Err(malformed_error!(
                    "Invalid compressed token - {}",
                    compressed_token
                ))
            }
        };

        Ok(Token::new(table + (compressed_token >> 2)))
    }

    /// Read a NUL-terminated UTF-8 string. A missing terminator at the end of the data is
    /// accepted.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for invalid UTF-8.
    pub fn read_string_utf8(&mut self) -> Result<String> {
        let start = self.position;
        let end = self.data[start..]
            .iter()
            .position(|byte| *byte == 0)
            .map_or(self.data.len(), |len| start + len);

        let string_data = &self.data[start..end];
        self.position = if end < self.data.len() { end + 1 } else { end };

        String::from_utf8(string_data.to_vec()).map_err(|e| {
            malformed_error!(
                "Invalid UTF-8 string at offset {}-{}: {}",
                start,
                end,
                e.utf8_error()
            )
        })
    }

    /// Read a `SerString` as used in custom attribute blobs (ECMA-335 II.23.3): a compressed
    /// length followed by UTF-8 bytes, or the single byte `0xFF` for a null string.
    ///
    /// # Errors
    /// Returns an error if the length runs past the data or the bytes are not UTF-8.
    pub fn read_ser_string(&mut self) -> Result<Option<String>> {
        if self.peek_byte()? == 0xFF {
            self.position += 1;
            return Ok(None);
        }

        let length = self.read_compressed_uint()? as usize;
        let string_data = self.read_bytes(length)?;

        String::from_utf8(string_data.to_vec())
            .map(Some)
            .map_err(|e| malformed_error!("Invalid UTF-8 SerString: {}", e.utf8_error()))
    }

    /// Returns the number of bytes left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Calculate the end position of a read of `length` bytes from the cursor.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] on overflow or if the end is past the data.
    pub fn calc_end_position(&self, length: usize) -> Result<usize> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(out_of_bounds_error!())?;

        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(end)
    }

    /// Read `length` raw bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if not enough data remains.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }
}
