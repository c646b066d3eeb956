use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        tables::{ModuleRaw, RowReadable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

impl RowReadable for ModuleRaw {
    const TABLE: TableId = TableId::Module;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(ModuleRaw {
            rid,
            token: Token::from_parts(TableId::Module.id(), rid),
            offset: *offset,
            generation: u32::from(read_le_at::<u16>(data, offset)?),
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            mvid: read_le_at_dyn(data, offset, sizes.is_large_guid())?,
            encid: read_le_at_dyn(data, offset, sizes.is_large_guid())?,
            encbaseid: read_le_at_dyn(data, offset, sizes.is_large_guid())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metadata::tables::{MetadataTable, TableInfo};

    #[test]
    fn crafted_short() {
        #[rustfmt::skip]
        let data = vec![
            0x01, 0x01, // generation
            0x02, 0x02, // name
            0x03, 0x03, // mvid
            0x04, 0x04, // encid
            0x05, 0x05, // encbaseid
            0x01, 0x01, // generation
            0x02, 0x02, // name
            0x03, 0x03, // mvid
            0x04, 0x04, // encid
            0x05, 0x05, // encbaseid
        ];

        let sizes = Arc::new(TableInfo::with_tables(&[(TableId::Module, 2)], false, false, false));
        let table = MetadataTable::<ModuleRaw>::new(&data, 2, sizes).unwrap();
        assert_eq!(table.row_count(), 2);

        let row = table.get(2).unwrap();
        assert_eq!(row.rid, 2);
        assert_eq!(row.token, Token::from_parts(0x00, 2));
        assert_eq!(row.generation, 0x101);
        assert_eq!(row.name, 0x202);
        assert_eq!(row.mvid, 0x303);
        assert_eq!(row.encid, 0x404);
        assert_eq!(row.encbaseid, 0x505);
        assert!(table.get(3).is_none());
        assert_eq!(table.iter().count(), 2);
    }

    #[test]
    fn crafted_long() {
        #[rustfmt::skip]
        let data = vec![
            0x01, 0x01, // generation
            0x02, 0x02, 0x02, 0x02, // name
            0x03, 0x03, 0x03, 0x03, // mvid
            0x04, 0x04, 0x04, 0x04, // encid
            0x05, 0x05, 0x05, 0x05, // encbaseid
        ];

        let sizes = Arc::new(TableInfo::new(&[0x1_0000; TableInfo::SLOTS], 0x07));
        let table = MetadataTable::<ModuleRaw>::new(&data, 1, sizes).unwrap();
        assert_eq!(table.row_count(), 1);

        let row = table.get(1).unwrap();
        assert_eq!(row.rid, 1);
        assert_eq!(row.token, Token::from_parts(0x00, 1));
        assert_eq!(row.generation, 0x101);
        assert_eq!(row.name, 0x2020202);
        assert_eq!(row.mvid, 0x3030303);
        assert_eq!(row.encid, 0x4040404);
        assert_eq!(row.encbaseid, 0x5050505);
    }
}
