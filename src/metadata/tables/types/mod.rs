//! Table layout primitives shared by every metadata table.
//!
//! - [`TableId`] names the tables
//! - [`CodedIndexType`] and [`CodedIndex`] decode the packed multi-table references
//! - [`TableInfo`] derives index widths and row sizes from the row counts of an image
//! - [`MetadataTable`] is a lazily decoded, typed view over the rows of one table

mod codedindex;
mod tableid;
mod tableinfo;

use std::marker::PhantomData;

use crate::Result;

pub use codedindex::{CodedIndex, CodedIndexType};
pub use tableid::TableId;
pub use tableinfo::{columns, Column, TableInfo, TableInfoRef, TableRowInfo};

/// A row type that can be decoded from the raw bytes of its table.
pub trait RowReadable: Sized {
    /// The table this row type belongs to.
    const TABLE: TableId;

    /// Reads one row at `offset`, advancing it past the row.
    ///
    /// `rid` is the 1-based row id of the row being read.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is too short for a complete row.
    fn row_read(data: &[u8], offset: &mut usize, rid: u32, sizes: &TableInfoRef) -> Result<Self>;
}

/// A typed view over the rows of one metadata table. Rows are decoded on access.
pub struct MetadataTable<'a, T> {
    data: &'a [u8],
    row_count: u32,
    row_size: u32,
    sizes: TableInfoRef,
    _phantom: PhantomData<T>,
}

impl<'a, T: RowReadable> MetadataTable<'a, T> {
    /// Creates a view over `data`, which must hold the complete table.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is shorter than `row_count` rows.
    pub fn new(data: &'a [u8], row_count: u32, sizes: TableInfoRef) -> Result<Self> {
        let row_size = sizes.row_size(T::TABLE);
        if (row_count as usize).saturating_mul(row_size as usize) > data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(MetadataTable {
            data,
            row_count,
            row_size,
            sizes,
            _phantom: PhantomData,
        })
    }

    /// Total size of the table in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::from(self.row_count) * u64::from(self.row_size)
    }

    /// Size of one row in bytes.
    #[must_use]
    pub fn row_size(&self) -> u32 {
        self.row_size
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    /// Returns the row with the 1-based id `rid`, or `None` if it does not exist.
    #[must_use]
    pub fn get(&self, rid: u32) -> Option<T> {
        if rid == 0 || self.row_count < rid {
            return None;
        }

        T::row_read(
            self.data,
            &mut ((rid as usize - 1) * self.row_size as usize),
            rid,
            &self.sizes,
        )
        .ok()
    }

    /// Iterates over all rows in order.
    #[must_use]
    pub fn iter(&self) -> TableIterator<'_, 'a, T> {
        TableIterator {
            table: self,
            current_row: 0,
        }
    }
}

impl<'t, 'a, T: RowReadable> IntoIterator for &'t MetadataTable<'a, T> {
    type Item = T;
    type IntoIter = TableIterator<'t, 'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the rows of a [`MetadataTable`].
pub struct TableIterator<'t, 'a, T> {
    table: &'t MetadataTable<'a, T>,
    current_row: u32,
}

impl<T: RowReadable> Iterator for TableIterator<'_, '_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.table.row_count {
            return None;
        }

        self.current_row += 1;
        self.table.get(self.current_row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.table.row_count - self.current_row) as usize;
        (0, Some(remaining))
    }
}
