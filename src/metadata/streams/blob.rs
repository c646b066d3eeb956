use crate::{file::parser::Parser, Result};

/// The `#Blob` heap: length-prefixed byte sequences addressed by byte offset.
///
/// Each blob starts with its length as an ECMA-335 compressed unsigned integer.
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Wraps the `#Blob` stream data.
    ///
    /// # Errors
    ///
    /// Returns an error if the heap does not start with the mandatory empty blob.
    pub fn from(data: &'a [u8]) -> Result<Blob<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #Blob heap"));
        }

        Ok(Blob { data })
    }

    /// Returns the blob starting at `index`, without its length prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` or the blob's extent lie outside the heap.
    pub fn get(&self, index: usize) -> Result<&'a [u8]> {
        if index >= self.data.len() {
            return Err(out_of_bounds_error!());
        }

        let mut parser = Parser::new(&self.data[index..]);
        let len = parser.read_compressed_uint()? as usize;
        parser.read_bytes(len)
    }
}
