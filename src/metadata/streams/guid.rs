use crate::Result;

/// The `#GUID` heap: an array of 16-byte GUIDs addressed by 1-based index.
pub struct Guid<'a> {
    data: &'a [u8],
}

impl<'a> Guid<'a> {
    /// Wraps the `#GUID` stream data.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is not a multiple of 16.
    pub fn from(data: &'a [u8]) -> Result<Guid<'a>> {
        if data.len() % 16 != 0 {
            return Err(malformed_error!(
                "Size of #GUID heap is not a multiple of 16 - {}",
                data.len()
            ));
        }

        Ok(Guid { data })
    }

    /// Number of GUIDs in the heap.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / 16
    }

    /// Returns `true` if the heap holds no GUIDs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the GUID at the 1-based `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is 0 or past the end of the heap.
    pub fn get(&self, index: usize) -> Result<uguid::Guid> {
        if index < 1 || index > self.len() {
            return Err(out_of_bounds_error!());
        }

        let start = (index - 1) * 16;
        let mut buffer = [0u8; 16];
        buffer.copy_from_slice(&self.data[start..start + 16]);

        Ok(uguid::Guid::from_bytes(buffer))
    }
}
