use std::ffi::CStr;

use crate::Result;

/// The `#Strings` heap: NUL-terminated UTF-8 identifiers addressed by byte offset.
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Wraps the `#Strings` stream data.
    ///
    /// # Errors
    ///
    /// Returns an error if the heap does not start with the mandatory empty string.
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.is_empty() || data[0] != 0 {
            return Err(malformed_error!("Invalid memory for #Strings heap"));
        }

        Ok(Strings { data })
    }

    /// Returns the string starting at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` lies outside the heap or the string is not valid UTF-8.
    pub fn get(&self, index: usize) -> Result<&'a str> {
        if index >= self.data.len() {
            return Err(out_of_bounds_error!());
        }

        CStr::from_bytes_until_nul(&self.data[index..])
            .ok()
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| malformed_error!("Invalid string at index - {}", index))
    }
}
