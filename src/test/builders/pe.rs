//! Minimal PE32 builder for managed images.
//!
//! Layout: headers in the first 0x200 bytes, then a single `.text` section mapped at
//! [`PeBuilder::SECTION_RVA`] holding, in order, the CLR header, method bodies, the metadata,
//! the debug directory and the debug payloads.

const FILE_ALIGNMENT: usize = 0x200;
const SECTION_ALIGNMENT: usize = 0x2000;
const CLR_HEADER_SIZE: usize = 72;

fn align(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

fn pad4(data: &mut Vec<u8>) {
    while data.len() % 4 != 0 {
        data.push(0);
    }
}

struct DebugEntry {
    data_type: u32,
    major_version: u16,
    minor_version: u16,
    data: Vec<u8>,
}

/// Builds a PE32 DLL carrying a CLR header.
pub struct PeBuilder {
    bodies: Vec<u8>,
    metadata: Vec<u8>,
    debug_entries: Vec<DebugEntry>,
}

impl Default for PeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PeBuilder {
    /// RVA of the `.text` section.
    pub const SECTION_RVA: usize = 0x2000;

    pub fn new() -> Self {
        PeBuilder {
            bodies: Vec::new(),
            metadata: Vec::new(),
            debug_entries: Vec::new(),
        }
    }

    /// Places a method body (header included) into the image and returns its RVA.
    pub fn add_method_body(&mut self, body: &[u8]) -> u32 {
        pad4(&mut self.bodies);
        let rva = Self::SECTION_RVA + CLR_HEADER_SIZE + self.bodies.len();
        self.bodies.extend_from_slice(body);
        rva as u32
    }

    /// Sets the metadata image the CLR header points to.
    pub fn metadata(mut self, metadata: Vec<u8>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Appends a debug directory record with its payload.
    pub fn debug_entry(
        mut self,
        data_type: u32,
        major_version: u16,
        minor_version: u16,
        data: Vec<u8>,
    ) -> Self {
        self.debug_entries.push(DebugEntry {
            data_type,
            major_version,
            minor_version,
            data,
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut section = vec![0_u8; CLR_HEADER_SIZE];
        section.extend_from_slice(&self.bodies);
        pad4(&mut section);

        let metadata_offset = section.len();
        section.extend_from_slice(&self.metadata);
        pad4(&mut section);

        let debug_offset = section.len();
        let debug_size = self.debug_entries.len() * 28;
        section.resize(debug_offset + debug_size, 0);

        for (index, entry) in self.debug_entries.iter().enumerate() {
            pad4(&mut section);
            let payload_offset = section.len();
            section.extend_from_slice(&entry.data);

            let (rva, pointer) = if entry.data.is_empty() {
                (0, 0)
            } else {
                (
                    (Self::SECTION_RVA + payload_offset) as u32,
                    (FILE_ALIGNMENT + payload_offset) as u32,
                )
            };

            let mut record = Vec::with_capacity(28);
            record.extend_from_slice(&0_u32.to_le_bytes());
            record.extend_from_slice(&0_u32.to_le_bytes());
            record.extend_from_slice(&entry.major_version.to_le_bytes());
            record.extend_from_slice(&entry.minor_version.to_le_bytes());
            record.extend_from_slice(&entry.data_type.to_le_bytes());
            record.extend_from_slice(&(entry.data.len() as u32).to_le_bytes());
            record.extend_from_slice(&rva.to_le_bytes());
            record.extend_from_slice(&pointer.to_le_bytes());

            let start = debug_offset + index * 28;
            section[start..start + 28].copy_from_slice(&record);
        }

        // CLR header
        let metadata_rva = (Self::SECTION_RVA + metadata_offset) as u32;
        let mut clr = Vec::with_capacity(CLR_HEADER_SIZE);
        clr.extend_from_slice(&(CLR_HEADER_SIZE as u32).to_le_bytes());
        clr.extend_from_slice(&2_u16.to_le_bytes());
        clr.extend_from_slice(&5_u16.to_le_bytes());
        clr.extend_from_slice(&metadata_rva.to_le_bytes());
        clr.extend_from_slice(&(self.metadata.len() as u32).to_le_bytes());
        clr.extend_from_slice(&1_u32.to_le_bytes());
        clr.resize(CLR_HEADER_SIZE, 0);
        section[..CLR_HEADER_SIZE].copy_from_slice(&clr);

        let virtual_size = section.len();
        let raw_size = align(virtual_size, FILE_ALIGNMENT);
        section.resize(raw_size, 0);

        let mut image = vec![0_u8; FILE_ALIGNMENT];

        // DOS header
        image[0] = b'M';
        image[1] = b'Z';
        image[0x3C..0x40].copy_from_slice(&0x80_u32.to_le_bytes());

        let mut headers = Vec::new();
        headers.extend_from_slice(b"PE\0\0");

        // COFF header
        headers.extend_from_slice(&0x014C_u16.to_le_bytes());
        headers.extend_from_slice(&1_u16.to_le_bytes());
        headers.extend_from_slice(&0_u32.to_le_bytes());
        headers.extend_from_slice(&0_u32.to_le_bytes());
        headers.extend_from_slice(&0_u32.to_le_bytes());
        headers.extend_from_slice(&0xE0_u16.to_le_bytes());
        headers.extend_from_slice(&0x2102_u16.to_le_bytes());

        // Optional header, standard fields
        headers.extend_from_slice(&0x010B_u16.to_le_bytes());
        headers.push(11);
        headers.push(0);
        headers.extend_from_slice(&(raw_size as u32).to_le_bytes());
        headers.extend_from_slice(&0_u32.to_le_bytes());
        headers.extend_from_slice(&0_u32.to_le_bytes());
        headers.extend_from_slice(&0_u32.to_le_bytes());
        headers.extend_from_slice(&(Self::SECTION_RVA as u32).to_le_bytes());
        headers.extend_from_slice(&0_u32.to_le_bytes());

        // Optional header, Windows fields
        let size_of_image = Self::SECTION_RVA + align(virtual_size, SECTION_ALIGNMENT);
        headers.extend_from_slice(&0x1000_0000_u32.to_le_bytes());
        headers.extend_from_slice(&(SECTION_ALIGNMENT as u32).to_le_bytes());
        headers.extend_from_slice(&(FILE_ALIGNMENT as u32).to_le_bytes());
        headers.extend_from_slice(&4_u16.to_le_bytes());
        headers.extend_from_slice(&0_u16.to_le_bytes());
        headers.extend_from_slice(&0_u16.to_le_bytes());
        headers.extend_from_slice(&0_u16.to_le_bytes());
        headers.extend_from_slice(&4_u16.to_le_bytes());
        headers.extend_from_slice(&0_u16.to_le_bytes());
        headers.extend_from_slice(&0_u32.to_le_bytes());
        headers.extend_from_slice(&(size_of_image as u32).to_le_bytes());
        headers.extend_from_slice(&(FILE_ALIGNMENT as u32).to_le_bytes());
        headers.extend_from_slice(&0_u32.to_le_bytes());
        headers.extend_from_slice(&3_u16.to_le_bytes());
        headers.extend_from_slice(&0x8540_u16.to_le_bytes());
        headers.extend_from_slice(&0x0010_0000_u32.to_le_bytes());
        headers.extend_from_slice(&0x1000_u32.to_le_bytes());
        headers.extend_from_slice(&0x0010_0000_u32.to_le_bytes());
        headers.extend_from_slice(&0x1000_u32.to_le_bytes());
        headers.extend_from_slice(&0_u32.to_le_bytes());
        headers.extend_from_slice(&16_u32.to_le_bytes());

        // Data directories
        for index in 0..16 {
            let (rva, size) = match index {
                6 if debug_size > 0 => (Self::SECTION_RVA + debug_offset, debug_size),
                14 => (Self::SECTION_RVA, CLR_HEADER_SIZE),
                _ => (0, 0),
            };
            headers.extend_from_slice(&(rva as u32).to_le_bytes());
            headers.extend_from_slice(&(size as u32).to_le_bytes());
        }

        // Section table
        headers.extend_from_slice(b".text\0\0\0");
        headers.extend_from_slice(&(virtual_size as u32).to_le_bytes());
        headers.extend_from_slice(&(Self::SECTION_RVA as u32).to_le_bytes());
        headers.extend_from_slice(&(raw_size as u32).to_le_bytes());
        headers.extend_from_slice(&(FILE_ALIGNMENT as u32).to_le_bytes());
        headers.extend_from_slice(&0_u32.to_le_bytes());
        headers.extend_from_slice(&0_u32.to_le_bytes());
        headers.extend_from_slice(&0_u16.to_le_bytes());
        headers.extend_from_slice(&0_u16.to_le_bytes());
        headers.extend_from_slice(&0x6000_0020_u32.to_le_bytes());

        image[0x80..0x80 + headers.len()].copy_from_slice(&headers);
        image.extend_from_slice(&section);
        image
    }
}

/// Wraps IL in a tiny method body header.
pub fn tiny_body(il: &[u8]) -> Vec<u8> {
    assert!(il.len() < 64);
    let mut body = vec![((il.len() as u8) << 2) | 0x02];
    body.extend_from_slice(il);
    body
}

/// Wraps IL in a fat method body header with the given local variable signature token.
pub fn fat_body(il: &[u8], max_stack: u16, local_var_sig_token: u32) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&0x3013_u16.to_le_bytes());
    body.extend_from_slice(&max_stack.to_le_bytes());
    body.extend_from_slice(&(il.len() as u32).to_le_bytes());
    body.extend_from_slice(&local_var_sig_token.to_le_bytes());
    body.extend_from_slice(il);
    body
}
