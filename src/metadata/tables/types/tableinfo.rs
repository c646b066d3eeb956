use std::sync::Arc;

use strum::{EnumCount, IntoEnumIterator};

use crate::metadata::tables::types::{CodedIndexType, TableId};

/// Row count of one table, and whether indexes into it need 4 bytes.
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct TableRowInfo {
    /// Number of rows
    pub rows: u32,
    /// Bits needed to represent the row count
    pub bits: u8,
    /// `true` if a plain index into this table is 4 bytes wide
    pub is_large: bool,
}

impl TableRowInfo {
    /// Creates the sizing information for a table with `rows` rows.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(rows: u32) -> Self {
        let bits = if rows == 0 {
            1
        } else {
            (32 - rows.leading_zeros()) as u8
        };

        Self {
            rows,
            bits,
            is_large: rows > u32::from(u16::MAX),
        }
    }
}

/// One column of a metadata table row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Column {
    /// A fixed-width constant of the given byte size
    Fixed(u8),
    /// An index into `#Strings`
    Str,
    /// An index into `#GUID`
    Guid,
    /// An index into `#Blob`
    Blob,
    /// A simple index into another table
    Table(TableId),
    /// A coded index
    Coded(CodedIndexType),
}

/// The column layout of every table.
#[must_use]
#[rustfmt::skip]
pub fn columns(table: TableId) -> &'static [Column] {
    use Column::{Blob, Coded, Fixed, Guid, Str, Table};
    use CodedIndexType as C;

    match table {
        TableId::Module =>                 &[Fixed(2), Str, Guid, Guid, Guid],
        TableId::TypeRef =>                &[Coded(C::ResolutionScope), Str, Str],
        TableId::TypeDef =>                &[Fixed(4), Str, Str, Coded(C::TypeDefOrRef), Table(TableId::Field), Table(TableId::MethodDef)],
        TableId::FieldPtr =>               &[Table(TableId::Field)],
        TableId::Field =>                  &[Fixed(2), Str, Blob],
        TableId::MethodPtr =>              &[Table(TableId::MethodDef)],
        TableId::MethodDef =>              &[Fixed(4), Fixed(2), Fixed(2), Str, Blob, Table(TableId::Param)],
        TableId::ParamPtr =>               &[Table(TableId::Param)],
        TableId::Param =>                  &[Fixed(2), Fixed(2), Str],
        TableId::InterfaceImpl =>          &[Table(TableId::TypeDef), Coded(C::TypeDefOrRef)],
        TableId::MemberRef =>              &[Coded(C::MemberRefParent), Str, Blob],
        TableId::Constant =>               &[Fixed(1), Fixed(1), Coded(C::HasConstant), Blob],
        TableId::CustomAttribute =>        &[Coded(C::HasCustomAttribute), Coded(C::CustomAttributeType), Blob],
        TableId::FieldMarshal =>           &[Coded(C::HasFieldMarshal), Blob],
        TableId::DeclSecurity =>           &[Fixed(2), Coded(C::HasDeclSecurity), Blob],
        TableId::ClassLayout =>            &[Fixed(2), Fixed(4), Table(TableId::TypeDef)],
        TableId::FieldLayout =>            &[Fixed(4), Table(TableId::Field)],
        TableId::StandAloneSig =>          &[Blob],
        TableId::EventMap =>               &[Table(TableId::TypeDef), Table(TableId::Event)],
        TableId::EventPtr =>               &[Table(TableId::Event)],
        TableId::Event =>                  &[Fixed(2), Str, Coded(C::TypeDefOrRef)],
        TableId::PropertyMap =>            &[Table(TableId::TypeDef), Table(TableId::Property)],
        TableId::PropertyPtr =>            &[Table(TableId::Property)],
        TableId::Property =>               &[Fixed(2), Str, Blob],
        TableId::MethodSemantics =>        &[Fixed(2), Table(TableId::MethodDef), Coded(C::HasSemantics)],
        TableId::MethodImpl =>             &[Table(TableId::TypeDef), Coded(C::MethodDefOrRef), Coded(C::MethodDefOrRef)],
        TableId::ModuleRef =>              &[Str],
        TableId::TypeSpec =>               &[Blob],
        TableId::ImplMap =>                &[Fixed(2), Coded(C::MemberForwarded), Str, Table(TableId::ModuleRef)],
        TableId::FieldRVA =>               &[Fixed(4), Table(TableId::Field)],
        TableId::EncLog =>                 &[Fixed(4), Fixed(4)],
        TableId::EncMap =>                 &[Fixed(4)],
        TableId::Assembly =>               &[Fixed(4), Fixed(2), Fixed(2), Fixed(2), Fixed(2), Fixed(4), Blob, Str, Str],
        TableId::AssemblyProcessor =>      &[Fixed(4)],
        TableId::AssemblyOS =>             &[Fixed(4), Fixed(4), Fixed(4)],
        TableId::AssemblyRef =>            &[Fixed(2), Fixed(2), Fixed(2), Fixed(2), Fixed(4), Blob, Str, Str, Blob],
        TableId::AssemblyRefProcessor =>   &[Fixed(4), Table(TableId::AssemblyRef)],
        TableId::AssemblyRefOS =>          &[Fixed(4), Fixed(4), Fixed(4), Table(TableId::AssemblyRef)],
        TableId::File =>                   &[Fixed(4), Str, Blob],
        TableId::ExportedType =>           &[Fixed(4), Fixed(4), Str, Str, Coded(C::Implementation)],
        TableId::ManifestResource =>       &[Fixed(4), Fixed(4), Str, Coded(C::Implementation)],
        TableId::NestedClass =>            &[Table(TableId::TypeDef), Table(TableId::TypeDef)],
        TableId::GenericParam =>           &[Fixed(2), Fixed(2), Coded(C::TypeOrMethodDef), Str],
        TableId::MethodSpec =>             &[Coded(C::MethodDefOrRef), Blob],
        TableId::GenericParamConstraint => &[Table(TableId::GenericParam), Coded(C::TypeDefOrRef)],
        TableId::Document =>               &[Blob, Guid, Blob, Guid],
        TableId::MethodDebugInformation => &[Table(TableId::Document), Blob],
        TableId::LocalScope =>             &[Table(TableId::MethodDef), Table(TableId::ImportScope), Table(TableId::LocalVariable), Table(TableId::LocalConstant), Fixed(4), Fixed(4)],
        TableId::LocalVariable =>          &[Fixed(2), Fixed(2), Str],
        TableId::LocalConstant =>          &[Str, Blob],
        TableId::ImportScope =>            &[Table(TableId::ImportScope), Blob],
        TableId::StateMachineMethod =>     &[Table(TableId::MethodDef), Table(TableId::MethodDef)],
        TableId::CustomDebugInformation => &[Coded(C::HasCustomDebugInformation), Guid, Blob],
    }
}

/// Sizing information of a metadata image: row counts of every table and the width of heap,
/// table and coded indexes derived from them.
#[derive(Clone, Debug)]
pub struct TableInfo {
    rows: Vec<TableRowInfo>,
    coded_indexes: Vec<u8>,
    row_sizes: Vec<u32>,
    is_large_index_str: bool,
    is_large_index_guid: bool,
    is_large_index_blob: bool,
}

/// Shared handle to a [`TableInfo`].
pub type TableInfoRef = Arc<TableInfo>;

impl TableInfo {
    /// Number of table slots addressable by the 64-bit `valid` mask.
    pub const SLOTS: usize = 64;

    /// Builds the sizing information from per-table row counts (indexed by table number) and
    /// the tables-stream heap size flags.
    ///
    /// For a portable PDB, `rows` must also carry the counts of the type-system tables the
    /// `#Pdb` stream references, since debug tables index into them.
    #[must_use]
    pub fn new(rows: &[u32; Self::SLOTS], heap_size_flags: u8) -> Self {
        let mut info = TableInfo {
            rows: rows.iter().map(|count| TableRowInfo::new(*count)).collect(),
            coded_indexes: vec![2; CodedIndexType::COUNT],
            row_sizes: vec![0; Self::SLOTS],
            is_large_index_str: heap_size_flags & 0x01 != 0,
            is_large_index_guid: heap_size_flags & 0x02 != 0,
            is_large_index_blob: heap_size_flags & 0x04 != 0,
        };

        info.calculate_coded_index_bytes();
        info.calculate_row_sizes();
        info
    }

    /// Convenience constructor used by tests and builders.
    #[must_use]
    pub fn with_tables(
        tables: &[(TableId, u32)],
        large_str: bool,
        large_blob: bool,
        large_guid: bool,
    ) -> Self {
        let mut rows = [0_u32; Self::SLOTS];
        for (table, count) in tables {
            rows[table.id() as usize] = *count;
        }

        let flags = u8::from(large_str) | (u8::from(large_guid) << 1) | (u8::from(large_blob) << 2);
        Self::new(&rows, flags)
    }

    fn calculate_coded_index_bytes(&mut self) {
        for ci_type in CodedIndexType::iter() {
            let max_rows = ci_type
                .tables()
                .iter()
                .flatten()
                .map(|table| self.rows[table.id() as usize].rows)
                .max()
                .unwrap_or(0);

            self.coded_indexes[ci_type as usize] =
                if u64::from(max_rows) < (1_u64 << (16 - ci_type.tag_bits())) {
                    2
                } else {
                    4
                };
        }
    }

    fn calculate_row_sizes(&mut self) {
        for table in TableId::iter() {
            let size = columns(table)
                .iter()
                .map(|column| u32::from(self.column_bytes(*column)))
                .sum();
            self.row_sizes[table.id() as usize] = size;
        }
    }

    /// Width in bytes of one column.
    #[must_use]
    pub fn column_bytes(&self, column: Column) -> u8 {
        match column {
            Column::Fixed(size) => size,
            Column::Str => self.str_bytes(),
            Column::Guid => self.guid_bytes(),
            Column::Blob => self.blob_bytes(),
            Column::Table(table) => self.table_index_bytes(table),
            Column::Coded(ci_type) => self.coded_index_bytes(ci_type),
        }
    }

    /// Size in bytes of one row of `table`.
    #[must_use]
    pub fn row_size(&self, table: TableId) -> u32 {
        self.row_sizes[table.id() as usize]
    }

    /// Row counts and index width of `table`.
    #[must_use]
    pub fn get(&self, table: TableId) -> &TableRowInfo {
        &self.rows[table.id() as usize]
    }

    /// Number of rows in `table`.
    #[must_use]
    pub fn rows(&self, table: TableId) -> u32 {
        self.rows[table.id() as usize].rows
    }

    /// `true` if plain indexes into `table` are 4 bytes wide.
    #[must_use]
    pub fn is_large(&self, table: TableId) -> bool {
        self.rows[table.id() as usize].is_large
    }

    /// `true` if `#Strings` indexes are 4 bytes wide.
    #[must_use]
    pub fn is_large_str(&self) -> bool {
        self.is_large_index_str
    }

    /// `true` if `#GUID` indexes are 4 bytes wide.
    #[must_use]
    pub fn is_large_guid(&self) -> bool {
        self.is_large_index_guid
    }

    /// `true` if `#Blob` indexes are 4 bytes wide.
    #[must_use]
    pub fn is_large_blob(&self) -> bool {
        self.is_large_index_blob
    }

    /// Width of a `#Strings` index.
    #[must_use]
    pub fn str_bytes(&self) -> u8 {
        if self.is_large_index_str {
            4
        } else {
            2
        }
    }

    /// Width of a `#GUID` index.
    #[must_use]
    pub fn guid_bytes(&self) -> u8 {
        if self.is_large_index_guid {
            4
        } else {
            2
        }
    }

    /// Width of a `#Blob` index.
    #[must_use]
    pub fn blob_bytes(&self) -> u8 {
        if self.is_large_index_blob {
            4
        } else {
            2
        }
    }

    /// Width of a plain index into `table`.
    #[must_use]
    pub fn table_index_bytes(&self, table: TableId) -> u8 {
        if self.is_large(table) {
            4
        } else {
            2
        }
    }

    /// Width of a coded index of the given kind.
    #[must_use]
    pub fn coded_index_bytes(&self, ci_type: CodedIndexType) -> u8 {
        self.coded_indexes[ci_type as usize]
    }
}
