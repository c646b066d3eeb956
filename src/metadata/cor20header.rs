//! The CLR runtime header (ECMA-335 II.25.3.3), the entry point to an assembly's metadata.

use crate::{file::parser::Parser, Result};

/// The parsed CLR runtime header.
///
/// Only the fields needed to locate the metadata are validated; the remaining directories are
/// kept for completeness.
#[allow(missing_docs)]
pub struct Cor20Header {
    pub cb: u32,
    pub major_runtime_version: u16,
    pub minor_runtime_version: u16,
    pub meta_data_rva: u32,
    pub meta_data_size: u32,
    pub flags: u32,
    pub entry_point_token: u32,
    pub resource_rva: u32,
    pub resource_size: u32,
    pub strong_name_signature_rva: u32,
    pub strong_name_signature_size: u32,
}

impl Cor20Header {
    /// Parses the header from the 72 bytes the CLR data directory points to.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is too short, the header size is not 72 or the metadata
    /// directory is empty.
    pub fn read(data: &[u8]) -> Result<Cor20Header> {
        if data.len() < 72 {
            return Err(out_of_bounds_error!());
        }

        let mut parser = Parser::new(data);

        let cb = parser.read_le::<u32>()?;
        if cb != 72 {
            return Err(malformed_error!(
                "Invalid CLR header size: expected 72, got {}",
                cb
            ));
        }

        let major_runtime_version = parser.read_le::<u16>()?;
        let minor_runtime_version = parser.read_le::<u16>()?;

        let meta_data_rva = parser.read_le::<u32>()?;
        let meta_data_size = parser.read_le::<u32>()?;
        if meta_data_rva == 0 || meta_data_size == 0 {
            return Err(malformed_error!("CLR header has no metadata directory"));
        }

        Ok(Cor20Header {
            cb,
            major_runtime_version,
            minor_runtime_version,
            meta_data_rva,
            meta_data_size,
            flags: parser.read_le::<u32>()?,
            entry_point_token: parser.read_le::<u32>()?,
            resource_rva: parser.read_le::<u32>()?,
            resource_size: parser.read_le::<u32>()?,
            strong_name_signature_rva: parser.read_le::<u32>()?,
            strong_name_signature_size: parser.read_le::<u32>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x48, 0x00, 0x00, 0x00,
            0x02, 0x00,
            0x05, 0x00,
            0x00, 0x21, 0x00, 0x00,
            0x30, 0x04, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x06,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];

        let header = Cor20Header::read(&header_bytes).unwrap();

        assert_eq!(header.cb, 72);
        assert_eq!(header.major_runtime_version, 2);
        assert_eq!(header.minor_runtime_version, 5);
        assert_eq!(header.meta_data_rva, 0x2100);
        assert_eq!(header.meta_data_size, 0x430);
        assert_eq!(header.flags, 1);
        assert_eq!(header.entry_point_token, 0x0600_0001);
    }

    #[test]
    fn invalid() {
        let mut header_bytes = [0u8; 72];
        assert!(Cor20Header::read(&header_bytes).is_err());

        header_bytes[0] = 72;
        assert!(Cor20Header::read(&header_bytes).is_err());
        assert!(Cor20Header::read(&header_bytes[..40]).is_err());
    }
}
