//! Encoder for `MethodDebugInformation.SequencePoints` blobs.

use super::metadata::{compress_int, compress_uint};

/// Builds a sequence points blob record by record.
pub struct SequencePointsBlob {
    data: Vec<u8>,
    records: usize,
    previous_offset: u32,
    previous_start: Option<(u32, u32)>,
}

impl SequencePointsBlob {
    /// Starts a blob; `initial_document` is written only when the method's `Document` column is
    /// null.
    pub fn new(local_signature: u32, initial_document: Option<u32>) -> Self {
        let mut data = Vec::new();
        compress_uint(local_signature, &mut data);
        if let Some(document) = initial_document {
            compress_uint(document, &mut data);
        }

        SequencePointsBlob {
            data,
            records: 0,
            previous_offset: 0,
            previous_start: None,
        }
    }

    fn offset(&mut self, il_offset: u32) {
        let delta = if self.records == 0 {
            il_offset
        } else {
            il_offset - self.previous_offset
        };
        compress_uint(delta, &mut self.data);
        self.previous_offset = il_offset;
        self.records += 1;
    }

    /// A visible sequence point.
    pub fn point(
        mut self,
        il_offset: u32,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        self.offset(il_offset);

        let delta_lines = end_line - start_line;
        compress_uint(delta_lines, &mut self.data);
        if delta_lines == 0 {
            compress_uint(end_column - start_column, &mut self.data);
        } else {
            compress_int(end_column as i32 - start_column as i32, &mut self.data);
        }

        match self.previous_start {
            None => {
                compress_uint(start_line, &mut self.data);
                compress_uint(start_column, &mut self.data);
            }
            Some((line, column)) => {
                compress_int(start_line as i32 - line as i32, &mut self.data);
                compress_int(start_column as i32 - column as i32, &mut self.data);
            }
        }
        self.previous_start = Some((start_line, start_column));
        self
    }

    /// A hidden sequence point.
    pub fn hidden(mut self, il_offset: u32) -> Self {
        self.offset(il_offset);
        compress_uint(0, &mut self.data);
        compress_uint(0, &mut self.data);
        self
    }

    /// Switches the document of the following points.
    pub fn document(mut self, document: u32) -> Self {
        assert!(self.records > 0, "a blob cannot start with a document record");
        compress_uint(0, &mut self.data);
        compress_uint(document, &mut self.data);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}
