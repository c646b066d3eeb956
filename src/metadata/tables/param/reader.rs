use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        tables::{ParamRaw, RowReadable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

impl RowReadable for ParamRaw {
    const TABLE: TableId = TableId::Param;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(ParamRaw {
            rid,
            token: Token::from_parts(TableId::Param.id(), rid),
            offset: *offset,
            flags: u32::from(read_le_at::<u16>(data, offset)?),
            sequence: u32::from(read_le_at::<u16>(data, offset)?),
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
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
            0x01, 0x01, // flags
            0x02, 0x02, // sequence
            0x03, 0x03, // name
            0x01, 0x01, // flags
            0x02, 0x02, // sequence
            0x03, 0x03, // name
        ];

        let sizes = Arc::new(TableInfo::with_tables(&[(TableId::Param, 2)], false, false, false));
        let table = MetadataTable::<ParamRaw>::new(&data, 2, sizes).unwrap();
        assert_eq!(table.row_count(), 2);

        let row = table.get(2).unwrap();
        assert_eq!(row.rid, 2);
        assert_eq!(row.token, Token::from_parts(0x08, 2));
        assert_eq!(row.flags, 0x101);
        assert_eq!(row.sequence, 0x202);
        assert_eq!(row.name, 0x303);
        assert!(table.get(3).is_none());
        assert_eq!(table.iter().count(), 2);
    }

    #[test]
    fn crafted_long() {
        #[rustfmt::skip]
        let data = vec![
            0x01, 0x01, // flags
            0x02, 0x02, // sequence
            0x03, 0x03, 0x03, 0x03, // name
        ];

        let sizes = Arc::new(TableInfo::new(&[0x1_0000; TableInfo::SLOTS], 0x07));
        let table = MetadataTable::<ParamRaw>::new(&data, 1, sizes).unwrap();
        assert_eq!(table.row_count(), 1);

        let row = table.get(1).unwrap();
        assert_eq!(row.rid, 1);
        assert_eq!(row.token, Token::from_parts(0x08, 1));
        assert_eq!(row.flags, 0x101);
        assert_eq!(row.sequence, 0x202);
        assert_eq!(row.name, 0x3030303);
    }
}
