//! Byte-level builder for ECMA-335 metadata images.

use std::collections::BTreeMap;

use crate::metadata::tables::{
    types::{columns, TableInfo},
    TableId,
};

/// Appends `value` as an ECMA-335 compressed unsigned integer.
pub fn compress_uint(value: u32, out: &mut Vec<u8>) {
    if value < 0x80 {
        out.push(value as u8);
    } else if value < 0x4000 {
        out.push(0x80 | (value >> 8) as u8);
        out.push(value as u8);
    } else {
        out.push(0xC0 | (value >> 24) as u8);
        out.push((value >> 16) as u8);
        out.push((value >> 8) as u8);
        out.push(value as u8);
    }
}

/// Appends `value` as an ECMA-335 compressed signed integer.
pub fn compress_int(value: i32, out: &mut Vec<u8>) {
    let mask = if (-0x40..0x40).contains(&value) {
        0x7F
    } else if (-0x2000..0x2000).contains(&value) {
        0x3FFF
    } else {
        0x1FFF_FFFF
    };

    let rotated = (((value as u32) << 1) & mask) | u32::from(value < 0);
    compress_uint(rotated, out);
}

/// The metadata of a module `App.dll` with the given MVID and no types.
pub fn module_metadata(mvid: [u8; 16]) -> Vec<u8> {
    let mut builder = MetadataBuilder::new();
    let name = builder.string("App.dll");
    let mvid = builder.guid(mvid);
    builder.row(TableId::Module, &[0, name, mvid, 0, 0]);
    builder.build()
}

fn pad4(data: &mut Vec<u8>) {
    while data.len() % 4 != 0 {
        data.push(0);
    }
}

struct PdbHeader {
    id: [u8; 16],
    stamp: u32,
    entry_point: u32,
    referenced: Vec<(TableId, u32)>,
}

/// Builds a `BSJB` metadata image: heaps, tables and optionally a `#Pdb` stream.
///
/// Rows are given as raw column values in schema order; heap columns take the indexes returned
/// by [`MetadataBuilder::string`], [`MetadataBuilder::blob`] and [`MetadataBuilder::guid`], and
/// coded columns take values produced by [`crate::metadata::tables::CodedIndexType::encode`].
pub struct MetadataBuilder {
    strings: Vec<u8>,
    blobs: Vec<u8>,
    guids: Vec<u8>,
    rows: BTreeMap<u8, (TableId, Vec<Vec<u32>>)>,
    pdb: Option<PdbHeader>,
}

impl Default for MetadataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataBuilder {
    pub fn new() -> Self {
        MetadataBuilder {
            strings: vec![0],
            blobs: vec![0],
            guids: Vec::new(),
            rows: BTreeMap::new(),
            pdb: None,
        }
    }

    /// Interns a string, returning its `#Strings` index.
    pub fn string(&mut self, value: &str) -> u32 {
        if value.is_empty() {
            return 0;
        }

        let needle: Vec<u8> = value.bytes().chain(std::iter::once(0)).collect();
        if let Some(pos) = self
            .strings
            .windows(needle.len())
            .position(|window| window == needle.as_slice())
        {
            if pos > 0 && self.strings[pos - 1] == 0 {
                return pos as u32;
            }
        }

        let index = self.strings.len() as u32;
        self.strings.extend_from_slice(&needle);
        index
    }

    /// Appends a blob, returning its `#Blob` index.
    pub fn blob(&mut self, value: &[u8]) -> u32 {
        if value.is_empty() {
            return 0;
        }

        let index = self.blobs.len() as u32;
        compress_uint(value.len() as u32, &mut self.blobs);
        self.blobs.extend_from_slice(value);
        index
    }

    /// Appends a GUID, returning its 1-based `#GUID` index.
    pub fn guid(&mut self, value: [u8; 16]) -> u32 {
        self.guids.extend_from_slice(&value);
        (self.guids.len() / 16) as u32
    }

    /// Appends a row, returning its row id.
    pub fn row(&mut self, table: TableId, values: &[u32]) -> u32 {
        assert_eq!(
            values.len(),
            columns(table).len(),
            "column count mismatch for {:?}",
            table
        );

        let entry = self
            .rows
            .entry(table.id())
            .or_insert_with(|| (table, Vec::new()));
        entry.1.push(values.to_vec());
        entry.1.len() as u32
    }

    /// Turns the image into a portable PDB by adding a `#Pdb` stream.
    pub fn pdb(&mut self, id: [u8; 16], stamp: u32, referenced: &[(TableId, u32)]) -> &mut Self {
        self.pdb = Some(PdbHeader {
            id,
            stamp,
            entry_point: 0,
            referenced: referenced.to_vec(),
        });
        self
    }

    fn tables_stream(&self) -> Vec<u8> {
        let mut counts = [0_u32; TableInfo::SLOTS];
        if let Some(pdb) = &self.pdb {
            for (table, rows) in &pdb.referenced {
                counts[table.id() as usize] = *rows;
            }
        }

        let mut valid = 0_u64;
        for (id, (_, rows)) in &self.rows {
            counts[*id as usize] = rows.len() as u32;
            valid |= 1 << id;
        }

        let info = TableInfo::new(&counts, 0);

        let mut data = Vec::new();
        data.extend_from_slice(&0_u32.to_le_bytes());
        data.push(2);
        data.push(0);
        data.push(0);
        data.push(1);
        data.extend_from_slice(&valid.to_le_bytes());
        data.extend_from_slice(&0_u64.to_le_bytes());
        for (_, rows) in self.rows.values() {
            data.extend_from_slice(&(rows.len() as u32).to_le_bytes());
        }

        for (table, rows) in self.rows.values() {
            for row in rows {
                for (column, value) in columns(*table).iter().zip(row) {
                    match info.column_bytes(*column) {
                        1 => data.push(*value as u8),
                        2 => data.extend_from_slice(&(*value as u16).to_le_bytes()),
                        _ => data.extend_from_slice(&value.to_le_bytes()),
                    }
                }
            }
        }

        data
    }

    fn pdb_stream(pdb: &PdbHeader) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&pdb.id);
        data.extend_from_slice(&pdb.stamp.to_le_bytes());
        data.extend_from_slice(&pdb.entry_point.to_le_bytes());

        let mut referenced = pdb.referenced.clone();
        referenced.sort_by_key(|(table, _)| table.id());
        let mask = referenced
            .iter()
            .fold(0_u64, |mask, (table, _)| mask | (1 << table.id()));
        data.extend_from_slice(&mask.to_le_bytes());
        for (_, rows) in &referenced {
            data.extend_from_slice(&rows.to_le_bytes());
        }

        data
    }

    /// Serializes the image, starting with the `BSJB` root.
    pub fn build(&self) -> Vec<u8> {
        let mut streams: Vec<(&str, Vec<u8>)> = Vec::new();
        if let Some(pdb) = &self.pdb {
            streams.push(("#Pdb", Self::pdb_stream(pdb)));
        }
        streams.push(("#~", self.tables_stream()));
        streams.push(("#Strings", self.strings.clone()));
        streams.push(("#US", vec![0]));
        streams.push(("#GUID", self.guids.clone()));
        streams.push(("#Blob", self.blobs.clone()));

        for (_, data) in &mut streams {
            pad4(data);
        }

        let mut version = if self.pdb.is_some() {
            b"PDB v1.0".to_vec()
        } else {
            b"v4.0.30319".to_vec()
        };
        version.push(0);
        pad4(&mut version);

        let headers_size: usize = streams
            .iter()
            .map(|(name, _)| {
                let mut size = name.len() + 1;
                size += (4 - size % 4) % 4;
                8 + size
            })
            .sum();

        let mut out = Vec::new();
        out.extend_from_slice(&0x424A_5342_u32.to_le_bytes());
        out.extend_from_slice(&1_u16.to_le_bytes());
        out.extend_from_slice(&1_u16.to_le_bytes());
        out.extend_from_slice(&0_u32.to_le_bytes());
        out.extend_from_slice(&(version.len() as u32).to_le_bytes());
        out.extend_from_slice(&version);
        out.extend_from_slice(&0_u16.to_le_bytes());
        out.extend_from_slice(&(streams.len() as u16).to_le_bytes());

        let mut offset = out.len() + headers_size;
        for (name, data) in &streams {
            out.extend_from_slice(&(offset as u32).to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.push(0);
            pad4(&mut out);
            offset += data.len();
        }

        for (_, data) in &streams {
            out.extend_from_slice(data);
        }

        out
    }
}
