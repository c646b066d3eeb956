use crate::{
    file::io::read_le_at_dyn,
    metadata::{
        tables::{RowReadable, StandAloneSigRaw, TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

impl RowReadable for StandAloneSigRaw {
    const TABLE: TableId = TableId::StandAloneSig;

    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self> {
        Ok(StandAloneSigRaw {
            rid,
            token: Token::from_parts(TableId::StandAloneSig.id(), rid),
            offset: *offset,
            signature: read_le_at_dyn(data, offset, sizes.is_large_blob())?,
        })
    }
}
