use crate::{
    file::io::read_le_at,
    metadata::{tables::TableInfo, token::Token},
    Result,
};

/// The `#Pdb` stream of a portable PDB.
///
/// Besides the PDB id it carries the row counts of the type-system tables of the assembly the
/// PDB describes. Debug tables index into those tables (e.g. `LocalScope.Method`), so the counts
/// are needed to size those columns even though the tables themselves are not in the PDB.
#[derive(Clone, Debug)]
pub struct PdbStream {
    /// The GUID part of the PDB id; it matches the CodeView signature of the assembly
    pub guid: uguid::Guid,
    /// The stamp part of the PDB id
    pub stamp: u32,
    /// Entry point method of the assembly, null if there is none
    pub entry_point: Token,
    /// Bit mask of the type-system tables that `referenced_rows` lists
    pub referenced_tables: u64,
    /// Row counts of the referenced type-system tables, indexed by table number
    pub referenced_rows: [u32; TableInfo::SLOTS],
}

impl PdbStream {
    /// Parses the `#Pdb` stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is truncated or references debug tables.
    pub fn from(data: &[u8]) -> Result<PdbStream> {
        if data.len() < 32 {
            return Err(malformed_error!("#Pdb stream is too small - {}", data.len()));
        }

        let mut guid = [0u8; 16];
        guid.copy_from_slice(&data[..16]);

        let mut offset = 16;
        let stamp = read_le_at::<u32>(data, &mut offset)?;
        let entry_point = Token::new(read_le_at::<u32>(data, &mut offset)?);
        let referenced_tables = read_le_at::<u64>(data, &mut offset)?;

        if referenced_tables >> 0x30 != 0 {
            return Err(malformed_error!(
                "#Pdb stream references debug tables - 0x{:016x}",
                referenced_tables
            ));
        }

        let mut referenced_rows = [0_u32; TableInfo::SLOTS];
        for (table, rows) in referenced_rows.iter_mut().enumerate() {
            if referenced_tables & (1 << table) != 0 {
                *rows = read_le_at::<u32>(data, &mut offset)?;
            }
        }

        Ok(PdbStream {
            guid: uguid::Guid::from_bytes(guid),
            stamp,
            entry_point,
            referenced_tables,
            referenced_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let data = [
            0x8e, 0x90, 0x37, 0xd4, 0xe6, 0x65, 0x7c, 0x48, 0x97, 0x35, 0x7b, 0xdf, 0xf6, 0x99, 0xbe, 0xa5,
            0x78, 0x56, 0x34, 0x12,
            0x03, 0x00, 0x00, 0x06,
            0x44, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x05, 0x00, 0x00, 0x00,
            0x20, 0x00, 0x00, 0x00,
        ];

        let stream = PdbStream::from(&data).unwrap();

        assert_eq!(stream.guid, uguid::guid!("d437908e-65e6-487c-9735-7bdff699bea5"));
        assert_eq!(stream.stamp, 0x1234_5678);
        assert_eq!(stream.entry_point, Token(0x0600_0003));
        assert_eq!(stream.referenced_rows[0x02], 5);
        assert_eq!(stream.referenced_rows[0x06], 0x20);
        assert_eq!(stream.referenced_rows[0x04], 0);
    }

    #[test]
    fn truncated_rows() {
        let mut data = vec![0u8; 24];
        data.extend_from_slice(&0x44_u64.to_le_bytes());
        data.extend_from_slice(&5_u32.to_le_bytes());

        assert!(PdbStream::from(&data).is_err());
        assert!(PdbStream::from(&data[..20]).is_err());
    }
}
