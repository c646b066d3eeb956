use crate::{
    file::io::read_le_at_dyn,
    metadata::{
        tables::{CodedIndex, CodedIndexType, MemberRefRaw, RowReadable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

impl RowReadable for MemberRefRaw {
    const TABLE: TableId = TableId::MemberRef;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(MemberRefRaw {
            rid,
            token: Token::from_parts(TableId::MemberRef.id(), rid),
            offset: *offset,
            class: CodedIndex::read(data, offset, sizes, CodedIndexType::MemberRefParent)?,
            name: read_le_at_dyn(data, offset, sizes.is_large_str())?,
            signature: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
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
            0x11, 0x00, // class
            0x02, 0x02, // name
            0x03, 0x03, // signature
            0x11, 0x00, // class
            0x02, 0x02, // name
            0x03, 0x03, // signature
        ];

        let sizes = Arc::new(TableInfo::with_tables(&[(TableId::MemberRef, 2)], false, false, false));
        let table = MetadataTable::<MemberRefRaw>::new(&data, 2, sizes).unwrap();
        assert_eq!(table.row_count(), 2);

        let row = table.get(2).unwrap();
        assert_eq!(row.rid, 2);
        assert_eq!(row.token, Token::from_parts(0x0A, 2));
        assert_eq!(row.class.tag, TableId::TypeRef);
        assert_eq!(row.class.row, 2);
        assert_eq!(row.name, 0x202);
        assert_eq!(row.signature, 0x303);
        assert!(table.get(3).is_none());
        assert_eq!(table.iter().count(), 2);
    }

    #[test]
    fn crafted_long() {
        #[rustfmt::skip]
        let data = vec![
            0x81, 0x00, 0x00, 0x00, // class
            0x02, 0x02, 0x02, 0x02, // name
            0x03, 0x03, 0x03, 0x03, // signature
        ];

        let sizes = Arc::new(TableInfo::new(&[0x1_0000; TableInfo::SLOTS], 0x07));
        let table = MetadataTable::<MemberRefRaw>::new(&data, 1, sizes).unwrap();
        assert_eq!(table.row_count(), 1);

        let row = table.get(1).unwrap();
        assert_eq!(row.rid, 1);
        assert_eq!(row.token, Token::from_parts(0x0A, 1));
        assert_eq!(row.class.tag, TableId::TypeRef);
        assert_eq!(row.class.row, 16);
        assert_eq!(row.name, 0x2020202);
        assert_eq!(row.signature, 0x3030303);
    }
}
