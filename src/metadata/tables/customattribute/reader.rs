use crate::{
    file::io::read_le_at_dyn,
    metadata::{
        tables::{CodedIndex, CodedIndexType, CustomAttributeRaw, RowReadable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

impl RowReadable for CustomAttributeRaw {
    const TABLE: TableId = TableId::CustomAttribute;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(CustomAttributeRaw {
            rid,
            token: Token::from_parts(TableId::CustomAttribute.id(), rid),
            offset: *offset,
            parent: CodedIndex::read(data, offset, sizes, CodedIndexType::HasCustomAttribute)?,
            constructor: CodedIndex::read(data, offset, sizes, CodedIndexType::CustomAttributeType)?,
            value: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
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
            0x40, 0x00, // parent
            0x1B, 0x00, // constructor
            0x03, 0x03, // value
            0x40, 0x00, // parent
            0x1B, 0x00, // constructor
            0x03, 0x03, // value
        ];

        let sizes = Arc::new(TableInfo::with_tables(&[(TableId::CustomAttribute, 2)], false, false, false));
        let table = MetadataTable::<CustomAttributeRaw>::new(&data, 2, sizes).unwrap();
        assert_eq!(table.row_count(), 2);

        let row = table.get(2).unwrap();
        assert_eq!(row.rid, 2);
        assert_eq!(row.token, Token::from_parts(0x0C, 2));
        assert_eq!(row.parent.tag, TableId::MethodDef);
        assert_eq!(row.parent.row, 2);
        assert_eq!(row.constructor.tag, TableId::MemberRef);
        assert_eq!(row.constructor.row, 3);
        assert_eq!(row.value, 0x303);
        assert!(table.get(3).is_none());
        assert_eq!(table.iter().count(), 2);
    }

    #[test]
    fn crafted_long() {
        #[rustfmt::skip]
        let data = vec![
            0x00, 0x02, 0x00, 0x00, // parent
            0x8B, 0x00, 0x00, 0x00, // constructor
            0x03, 0x03, 0x03, 0x03, // value
        ];

        let sizes = Arc::new(TableInfo::new(&[0x1_0000; TableInfo::SLOTS], 0x07));
        let table = MetadataTable::<CustomAttributeRaw>::new(&data, 1, sizes).unwrap();
        assert_eq!(table.row_count(), 1);

        let row = table.get(1).unwrap();
        assert_eq!(row.rid, 1);
        assert_eq!(row.token, Token::from_parts(0x0C, 1));
        assert_eq!(row.parent.tag, TableId::MethodDef);
        assert_eq!(row.parent.row, 16);
        assert_eq!(row.constructor.tag, TableId::MemberRef);
        assert_eq!(row.constructor.row, 17);
        assert_eq!(row.value, 0x3030303);
    }
}
