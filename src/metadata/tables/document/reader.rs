use crate::{
    file::io::read_le_at_dyn,
    metadata::{
        tables::{DocumentRaw, RowReadable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

impl RowReadable for DocumentRaw {
    const TABLE: TableId = TableId::Document;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(DocumentRaw {
            rid,
            token: Token::from_parts(TableId::Document.id(), rid),
            offset: *offset,
            name: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
            hash_algorithm: read_le_at_dyn(data, offset, sizes.is_large_guid())?,
            hash: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
            language: read_le_at_dyn(data, offset, sizes.is_large_guid())?,
        })
    }
}
