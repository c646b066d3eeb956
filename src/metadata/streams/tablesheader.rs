use std::sync::Arc;

use strum::IntoEnumIterator;

use crate::{
    file::io::{read_le, read_le_at},
    metadata::tables::{MetadataTable, RowReadable, TableId, TableInfo, TableInfoRef},
    Result,
};

/// The compressed metadata tables stream, `#~`.
///
/// Parses the stream header (heap size flags, the `valid` and `sorted` masks and the row counts)
/// and computes where each present table starts. Typed access to a table goes through
/// [`TablesHeader::table`].
pub struct TablesHeader<'a> {
    /// Major version of the table schema, 2
    pub major_version: u8,
    /// Minor version of the table schema, 0
    pub minor_version: u8,
    /// Bit mask of the tables present in this stream
    pub valid: u64,
    /// Bit mask of the tables that are sorted
    pub sorted: u64,
    /// Index widths and row sizes for this image
    pub info: TableInfoRef,
    data: &'a [u8],
    table_offsets: Vec<Option<usize>>,
}

impl<'a> TablesHeader<'a> {
    /// Parses the `#~` stream.
    ///
    /// `referenced_rows` carries row counts of tables that are indexed but live in another
    /// image, which is how a portable PDB's `#Pdb` stream sizes its references into the
    /// assembly's type-system tables.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is truncated, the `valid` mask names unknown tables or the
    /// tables do not fit into the stream.
    pub fn from(
        data: &'a [u8],
        referenced_rows: Option<&[u32; TableInfo::SLOTS]>,
    ) -> Result<TablesHeader<'a>> {
        if data.len() < 24 {
            return Err(out_of_bounds_error!());
        }

        let valid = read_le::<u64>(&data[8..])?;
        let sorted = read_le::<u64>(&data[16..])?;
        let heap_size_flags = data[6];

        let known = TableId::iter().fold(0_u64, |mask, table| mask | (1 << table.id()));
        if valid & !known != 0 {
            return Err(malformed_error!(
                "Tables stream references unknown tables - 0x{:016x}",
                valid & !known
            ));
        }

        let mut rows = referenced_rows.copied().unwrap_or([0; TableInfo::SLOTS]);
        let mut offset = 24;
        for table in TableId::iter() {
            if valid & (1 << table.id()) != 0 {
                rows[table.id() as usize] = read_le_at::<u32>(data, &mut offset)?;
            }
        }

        if heap_size_flags & 0x40 != 0 {
            offset += 4;
        }

        let info = Arc::new(TableInfo::new(&rows, heap_size_flags));

        let mut table_offsets = vec![None; TableInfo::SLOTS];
        for table in TableId::iter() {
            if valid & (1 << table.id()) == 0 {
                continue;
            }

            let size = (info.rows(table) as usize)
                .checked_mul(info.row_size(table) as usize)
                .ok_or_else(|| malformed_error!("Table {:?} size overflows", table))?;

            table_offsets[table.id() as usize] = Some(offset);
            offset = offset
                .checked_add(size)
                .ok_or_else(|| malformed_error!("Table {:?} size overflows", table))?;
        }

        if offset > data.len() {
            return Err(malformed_error!(
                "Tables exceed the #~ stream - {} > {}",
                offset,
                data.len()
            ));
        }

        Ok(TablesHeader {
            major_version: data[4],
            minor_version: data[5],
            valid,
            sorted,
            info,
            data,
            table_offsets,
        })
    }

    /// Returns `true` if the table is present in this stream.
    #[must_use]
    pub fn has_table(&self, table: TableId) -> bool {
        self.valid & (1 << table.id()) != 0
    }

    /// Number of rows of a table present in this stream, 0 if it is absent.
    #[must_use]
    pub fn table_row_count(&self, table: TableId) -> u32 {
        if self.has_table(table) {
            self.info.rows(table)
        } else {
            0
        }
    }

    /// Returns a typed view of a table, or `None` if the stream does not contain it.
    #[must_use]
    pub fn table<T: RowReadable>(&self) -> Option<MetadataTable<'a, T>> {
        let start = self.table_offsets[T::TABLE.id() as usize]?;
        let rows = self.info.rows(T::TABLE);

        MetadataTable::new(&self.data[start..], rows, self.info.clone()).ok()
    }
}
