use crate::{
    file::io::read_le_at_dyn,
    metadata::{
        tables::{MethodDebugInformationRaw, RowReadable, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

impl RowReadable for MethodDebugInformationRaw {
    const TABLE: TableId = TableId::MethodDebugInformation;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(MethodDebugInformationRaw {
            rid,
            token: Token::from_parts(TableId::MethodDebugInformation.id(), rid),
            offset: *offset,
            document: read_le_at_dyn(data, offset, sizes.is_large(TableId::Document))?,
            sequence_points: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
        })
    }
}
