use crate::{file::io::read_le, Result};

/// Names of the streams a metadata root may list.
///
/// `#Pdb` only appears in portable PDBs. `#-` marks the uncompressed table layout, which is
/// recognized here and rejected when the tables are loaded.
pub const STREAM_NAMES: [&str; 7] = ["#Strings", "#US", "#Blob", "#GUID", "#~", "#-", "#Pdb"];

/// A stream header of the metadata root: where a stream starts and how large it is.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamHeader {
    /// Offset of the stream from the start of the metadata root
    pub offset: u32,
    /// Size of the stream in bytes
    pub size: u32,
    /// Name of the stream
    pub name: String,
}

impl StreamHeader {
    /// Reads a stream header from the start of `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is too short, the name is not NUL-terminated within 32
    /// bytes or names an unknown stream.
    pub fn from(data: &[u8]) -> Result<StreamHeader> {
        if data.len() < 9 {
            return Err(out_of_bounds_error!());
        }

        let name_area = &data[8..data.len().min(8 + 32)];
        let Some(name_len) = name_area.iter().position(|byte| *byte == 0) else {
            return Err(malformed_error!("Stream header name is not terminated"));
        };

        let name = String::from_utf8_lossy(&name_area[..name_len]).into_owned();
        if !STREAM_NAMES.contains(&name.as_str()) {
            return Err(malformed_error!("Invalid stream header name - {}", name));
        }

        Ok(StreamHeader {
            offset: read_le::<u32>(data)?,
            size: read_le::<u32>(&data[4..])?,
            name,
        })
    }

    /// Size this header occupies in the root, the name padded to a 4-byte boundary.
    #[must_use]
    pub fn header_size(&self) -> usize {
        8 + ((self.name.len() + 1 + 3) & !3)
    }
}
