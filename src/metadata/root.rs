//! The metadata root (ECMA-335 II.24.2.1).
//!
//! Both assemblies and portable PDBs start their metadata with the `BSJB` root: a version
//! string followed by the directory of streams.

use crate::{
    file::io::{read_le, read_le_at},
    metadata::streams::StreamHeader,
    Result,
};

/// Magic value of the metadata root, `BSJB`.
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// The parsed metadata root.
pub struct Root {
    /// Magic signature, always [`CIL_HEADER_MAGIC`]
    pub signature: u32,
    /// Major version, 1
    pub major_version: u16,
    /// Minor version, 1
    pub minor_version: u16,
    /// Length of the version string area, including padding
    pub length: u32,
    /// The version string, e.g. `v4.0.30319` or `PDB v1.0`
    pub version: String,
    /// Reserved flags
    pub flags: u16,
    /// The stream directory
    pub stream_headers: Vec<StreamHeader>,
}

impl Root {
    /// Parses the metadata root at the start of `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the magic does not match, the version string or the stream
    /// directory are truncated, or a stream extends past `data`.
    pub fn read(data: &[u8]) -> Result<Root> {
        if data.len() < 20 {
            return Err(out_of_bounds_error!());
        }

        let signature = read_le::<u32>(data)?;
        if signature != CIL_HEADER_MAGIC {
            return Err(malformed_error!(
                "CIL_HEADER_MAGIC does not match - {}",
                signature
            ));
        }

        let length = read_le::<u32>(&data[12..])?;
        let Some(version_end) = (length as usize).checked_add(16) else {
            return Err(malformed_error!(
                "Version string length causing integer overflow - {}",
                length
            ));
        };

        if version_end + 4 > data.len() {
            return Err(out_of_bounds_error!());
        }

        let version_bytes = &data[16..version_end];
        let version_len = version_bytes
            .iter()
            .position(|byte| *byte == 0)
            .unwrap_or(version_bytes.len());
        let version = String::from_utf8_lossy(&version_bytes[..version_len]).into_owned();

        let mut offset = version_end;
        let flags = read_le_at::<u16>(data, &mut offset)?;
        let stream_count = read_le_at::<u16>(data, &mut offset)?;
        if stream_count == 0 || stream_count as usize > 6 {
            return Err(malformed_error!("Invalid stream count - {}", stream_count));
        }

        let mut stream_headers: Vec<StreamHeader> = Vec::with_capacity(stream_count as usize);
        for _ in 0..stream_count {
            if offset >= data.len() {
                return Err(out_of_bounds_error!());
            }

            let stream = StreamHeader::from(&data[offset..])?;
            match stream.offset.checked_add(stream.size) {
                Some(end) if end as usize <= data.len() => {}
                Some(_) => return Err(out_of_bounds_error!()),
                None => {
                    return Err(malformed_error!(
                        "Stream offset and size cause integer overflow - {} + {}",
                        stream.offset,
                        stream.size
                    ))
                }
            }

            if stream_headers.iter().any(|known| known.name == stream.name) {
                return Err(malformed_error!("Duplicate stream - {}", stream.name));
            }

            offset += stream.header_size();
            stream_headers.push(stream);
        }

        Ok(Root {
            signature,
            major_version: read_le::<u16>(&data[4..])?,
            minor_version: read_le::<u16>(&data[6..])?,
            length,
            version,
            flags,
            stream_headers,
        })
    }

    /// Returns the header of the named stream, if present.
    #[must_use]
    pub fn stream(&self, name: &str) -> Option<&StreamHeader> {
        self.stream_headers.iter().find(|stream| stream.name == name)
    }
}
