use crate::{
    file::io::{read_le_at, read_le_at_dyn},
    metadata::{
        tables::{CodedIndex, CodedIndexType, GenericParamRaw, RowReadable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

impl RowReadable for GenericParamRaw {
    const TABLE: TableId = TableId::GenericParam;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(GenericParamRaw {
            rid,
            token: Token::from_parts(TableId::GenericParam.id(), rid),
            offset: *offset,
            number: u32::from(read_le_at::<u16>(data, offset)?),
            flags: u32::from(read_le_at::<u16>(data, offset)?),
            owner: CodedIndex::read(data, offset, sizes, CodedIndexType::TypeOrMethodDef)?,
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
            0x01, 0x01, // number
            0x02, 0x02, // flags
            0x09, 0x00, // owner
            0x04, 0x04, // name
            0x01, 0x01, // number
            0x02, 0x02, // flags
            0x09, 0x00, // owner
            0x04, 0x04, // name
        ];

        let sizes = Arc::new(TableInfo::with_tables(&[(TableId::GenericParam, 2)], false, false, false));
        let table = MetadataTable::<GenericParamRaw>::new(&data, 2, sizes).unwrap();
        assert_eq!(table.row_count(), 2);

        let row = table.get(2).unwrap();
        assert_eq!(row.rid, 2);
        assert_eq!(row.token, Token::from_parts(0x2A, 2));
        assert_eq!(row.number, 0x101);
        assert_eq!(row.flags, 0x202);
        assert_eq!(row.owner.tag, TableId::MethodDef);
        assert_eq!(row.owner.row, 4);
        assert_eq!(row.name, 0x404);
        assert!(table.get(3).is_none());
        assert_eq!(table.iter().count(), 2);
    }

    #[test]
    fn crafted_long() {
        #[rustfmt::skip]
        let data = vec![
            0x01, 0x01, // number
            0x02, 0x02, // flags
            0x25, 0x00, 0x00, 0x00, // owner
            0x04, 0x04, 0x04, 0x04, // name
        ];

        let sizes = Arc::new(TableInfo::new(&[0x1_0000; TableInfo::SLOTS], 0x07));
        let table = MetadataTable::<GenericParamRaw>::new(&data, 1, sizes).unwrap();
        assert_eq!(table.row_count(), 1);

        let row = table.get(1).unwrap();
        assert_eq!(row.rid, 1);
        assert_eq!(row.token, Token::from_parts(0x2A, 1));
        assert_eq!(row.number, 0x101);
        assert_eq!(row.flags, 0x202);
        assert_eq!(row.owner.tag, TableId::MethodDef);
        assert_eq!(row.owner.row, 18);
        assert_eq!(row.name, 0x4040404);
    }
}
