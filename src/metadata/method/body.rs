//! Method body headers (ECMA-335 II.25.4).
//!
//! A method body starts with either a one-byte tiny header or a twelve-byte fat header. The
//! symbolicator only needs the IL stream and the local variable signature, so extra data
//! sections (exception handling clauses) after the code are not decoded.
//!
//! # Examples
//!
//! ```rust
//! use dotsym::metadata::method::MethodBody;
//!
//! // Tiny header for 2 bytes of IL: ldnull; ret
//! let data = [0x0A, 0x14, 0x2A];
//! let body = MethodBody::from(&data)?;
//! assert!(!body.is_fat);
//! assert_eq!(body.code(&data)?, &[0x14, 0x2A]);
//! # Ok::<(), dotsym::Error>(())
//! ```

use bitflags::bitflags;

use crate::{file::io::read_le, Result};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Flags of a method body header
    pub struct MethodBodyFlags: u16 {
        /// Tiny method header format
        const TINY_FORMAT = 0x2;
        /// Fat method header format
        const FAT_FORMAT = 0x3;
        /// More data sections follow the code
        const MORE_SECTS = 0x8;
        /// Locals are zero-initialized
        const INIT_LOCALS = 0x10;
    }
}

/// The header of one method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    /// Size of the IL code in bytes, without the header
    pub size_code: usize,
    /// Size of the method header in bytes
    pub size_header: usize,
    /// `StandAloneSig` token of the local variable signature, 0 if the method has no locals
    pub local_var_sig_token: u32,
    /// Maximum number of items on the operand stack
    pub max_stack: usize,
    /// Fat header
    pub is_fat: bool,
    /// Locals are zero-initialized
    pub is_init_local: bool,
    /// Data sections (exception clauses) follow the code
    pub has_sections: bool,
}

impl MethodBody {
    /// Parses the method header at the start of `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is empty, too short for the declared code size, or the
    /// header format is neither tiny nor fat.
    pub fn from(data: &[u8]) -> Result<MethodBody> {
        if data.is_empty() {
            return Err(malformed_error!("Provided data for body parsing is empty"));
        }

        let first_byte = read_le::<u8>(data)?;
        match MethodBodyFlags::from_bits_truncate(u16::from(first_byte & 0b_0000_0011)) {
            MethodBodyFlags::TINY_FORMAT => {
                let size_code = (first_byte >> 2) as usize;
                if size_code + 1 > data.len() {
                    return Err(out_of_bounds_error!());
                }

                Ok(MethodBody {
                    size_code,
                    size_header: 1,
                    local_var_sig_token: 0,
                    max_stack: 8,
                    is_fat: false,
                    is_init_local: false,
                    has_sections: false,
                })
            }
            MethodBodyFlags::FAT_FORMAT => {
                if data.len() < 12 {
                    return Err(out_of_bounds_error!());
                }

                let first_duo = read_le::<u16>(data)?;
                let size_header = usize::from(first_duo >> 12) * 4;
                if size_header < 12 {
                    return Err(malformed_error!("Fat method header size {} is too small", size_header));
                }

                let size_code = read_le::<u32>(&data[4..])? as usize;
                if data.len() < size_header + size_code {
                    return Err(out_of_bounds_error!());
                }

                let flags = MethodBodyFlags::from_bits_truncate(first_duo & 0x0FFF);

                Ok(MethodBody {
                    size_code,
                    size_header,
                    local_var_sig_token: read_le::<u32>(&data[8..])?,
                    max_stack: usize::from(read_le::<u16>(&data[2..])?),
                    is_fat: true,
                    is_init_local: flags.contains(MethodBodyFlags::INIT_LOCALS),
                    has_sections: flags.contains(MethodBodyFlags::MORE_SECTS),
                })
            }
            _ => Err(malformed_error!(
                "MethodHeader is neither FAT nor TINY - {}",
                first_byte
            )),
        }
    }

    /// Full size of the header and the code.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size_code + self.size_header
    }

    /// Returns the IL code of this body from the same buffer it was parsed from.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is shorter than the header and code.
    pub fn code<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        data.get(self.size_header..self.size())
            .ok_or_else(|| out_of_bounds_error!())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{fat_body, tiny_body};

    #[test]
    fn tiny() {
        let data = tiny_body(&[0x00, 0x02, 0x28, 0x01, 0x00, 0x00, 0x06, 0x2A]);
        let body = MethodBody::from(&data).unwrap();

        assert!(!body.is_fat);
        assert!(!body.is_init_local);
        assert_eq!(body.size_code, 8);
        assert_eq!(body.size_header, 1);
        assert_eq!(body.size(), 9);
        assert_eq!(body.local_var_sig_token, 0);
        assert_eq!(body.code(&data).unwrap()[2], 0x28);
    }

    #[test]
    fn fat() {
        let il = vec![0x00; 0x9B];
        let data = fat_body(&il, 5, 0x1100_0059);
        let body = MethodBody::from(&data).unwrap();

        assert!(body.is_fat);
        assert!(body.is_init_local);
        assert!(!body.has_sections);
        assert_eq!(body.max_stack, 5);
        assert_eq!(body.size_code, 0x9B);
        assert_eq!(body.size_header, 12);
        assert_eq!(body.size(), 167);
        assert_eq!(body.local_var_sig_token, 0x1100_0059);
        assert_eq!(body.code(&data).unwrap().len(), 0x9B);
    }

    #[test]
    fn fat_with_sections() {
        #[rustfmt::skip]
        let data = [
            0x1B, 0x30, 0x01, 0x00, // flags MORE_SECTS | INIT_LOCALS | FAT, size 3, max stack 1
            0x01, 0x00, 0x00, 0x00, // code size
            0x03, 0x00, 0x00, 0x11, // local sig
            0x2A,
        ];
        let body = MethodBody::from(&data).unwrap();
        assert!(body.has_sections);
        assert_eq!(body.local_var_sig_token, 0x1100_0003);
    }

    #[test]
    fn invalid() {
        assert!(MethodBody::from(&[]).is_err());
        // Tiny header claiming 4 bytes of code with only one present
        assert!(MethodBody::from(&[0x12, 0x2A]).is_err());
        // Fat header with a truncated code section
        assert!(MethodBody::from(&[0x13, 0x30, 0x01, 0x00, 0x10, 0, 0, 0, 0, 0, 0, 0]).is_err());
        // Neither format
        assert!(MethodBody::from(&[0x01]).is_err());
    }
}
