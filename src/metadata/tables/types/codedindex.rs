use strum::{EnumCount, EnumIter};

use crate::{
    file::io::read_le_at_dyn,
    metadata::{
        tables::types::{TableId, TableInfoRef},
        token::Token,
    },
    Result,
};

/// The coded index kinds of ECMA-335 II.24.2.6, plus `HasCustomDebugInformation` from the
/// portable PDB format.
///
/// A coded index packs a table selector (the low `tag_bits` bits) and a row id into one column.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, EnumIter, EnumCount)]
#[repr(usize)]
#[allow(missing_docs)]
pub enum CodedIndexType {
    TypeDefOrRef,
    HasConstant,
    HasCustomAttribute,
    HasFieldMarshal,
    HasDeclSecurity,
    MemberRefParent,
    HasSemantics,
    MethodDefOrRef,
    MemberForwarded,
    Implementation,
    CustomAttributeType,
    ResolutionScope,
    TypeOrMethodDef,
    HasCustomDebugInformation,
}

const HAS_CUSTOM_ATTRIBUTE: [Option<TableId>; 22] = [
    Some(TableId::MethodDef),
    Some(TableId::Field),
    Some(TableId::TypeRef),
    Some(TableId::TypeDef),
    Some(TableId::Param),
    Some(TableId::InterfaceImpl),
    Some(TableId::MemberRef),
    Some(TableId::Module),
    Some(TableId::DeclSecurity),
    Some(TableId::Property),
    Some(TableId::Event),
    Some(TableId::StandAloneSig),
    Some(TableId::ModuleRef),
    Some(TableId::TypeSpec),
    Some(TableId::Assembly),
    Some(TableId::AssemblyRef),
    Some(TableId::File),
    Some(TableId::ExportedType),
    Some(TableId::ManifestResource),
    Some(TableId::GenericParam),
    Some(TableId::GenericParamConstraint),
    Some(TableId::MethodSpec),
];

const HAS_CUSTOM_DEBUG_INFORMATION: [Option<TableId>; 27] = [
    Some(TableId::MethodDef),
    Some(TableId::Field),
    Some(TableId::TypeRef),
    Some(TableId::TypeDef),
    Some(TableId::Param),
    Some(TableId::InterfaceImpl),
    Some(TableId::MemberRef),
    Some(TableId::Module),
    Some(TableId::DeclSecurity),
    Some(TableId::Property),
    Some(TableId::Event),
    Some(TableId::StandAloneSig),
    Some(TableId::ModuleRef),
    Some(TableId::TypeSpec),
    Some(TableId::Assembly),
    Some(TableId::AssemblyRef),
    Some(TableId::File),
    Some(TableId::ExportedType),
    Some(TableId::ManifestResource),
    Some(TableId::GenericParam),
    Some(TableId::GenericParamConstraint),
    Some(TableId::MethodSpec),
    Some(TableId::Document),
    Some(TableId::LocalScope),
    Some(TableId::LocalVariable),
    Some(TableId::LocalConstant),
    Some(TableId::ImportScope),
];

impl CodedIndexType {
    /// The tables a tag selects, in tag order. `None` marks tags reserved as "not used".
    #[must_use]
    pub fn tables(&self) -> &'static [Option<TableId>] {
        match self {
            CodedIndexType::TypeDefOrRef => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasConstant => &[
                Some(TableId::Field),
                Some(TableId::Param),
                Some(TableId::Property),
            ],
            CodedIndexType::HasCustomAttribute => &HAS_CUSTOM_ATTRIBUTE,
            CodedIndexType::HasFieldMarshal => &[Some(TableId::Field), Some(TableId::Param)],
            CodedIndexType::HasDeclSecurity => &[
                Some(TableId::TypeDef),
                Some(TableId::MethodDef),
                Some(TableId::Assembly),
            ],
            CodedIndexType::MemberRefParent => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::ModuleRef),
                Some(TableId::MethodDef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasSemantics => &[Some(TableId::Event), Some(TableId::Property)],
            CodedIndexType::MethodDefOrRef => &[Some(TableId::MethodDef), Some(TableId::MemberRef)],
            CodedIndexType::MemberForwarded => &[Some(TableId::Field), Some(TableId::MethodDef)],
            CodedIndexType::Implementation => &[
                Some(TableId::File),
                Some(TableId::AssemblyRef),
                Some(TableId::ExportedType),
            ],
            CodedIndexType::CustomAttributeType => &[
                None,
                None,
                Some(TableId::MethodDef),
                Some(TableId::MemberRef),
                None,
            ],
            CodedIndexType::ResolutionScope => &[
                Some(TableId::Module),
                Some(TableId::ModuleRef),
                Some(TableId::AssemblyRef),
                Some(TableId::TypeRef),
            ],
            CodedIndexType::TypeOrMethodDef => &[Some(TableId::TypeDef), Some(TableId::MethodDef)],
            CodedIndexType::HasCustomDebugInformation => &HAS_CUSTOM_DEBUG_INFORMATION,
        }
    }

    /// Number of low bits used as the table selector.
    #[must_use]
    pub fn tag_bits(&self) -> u32 {
        let count = self.tables().len();
        usize::BITS - (count - 1).leading_zeros()
    }

    /// Encodes a table and row into the coded value, the inverse of [`CodedIndex::decode`].
    #[must_use]
    pub fn encode(&self, table: TableId, row: u32) -> Option<u32> {
        let tag = self.tables().iter().position(|t| *t == Some(table))?;
        Some((row << self.tag_bits()) | tag as u32)
    }
}

/// A decoded coded index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodedIndex {
    /// The table the tag selected
    pub tag: TableId,
    /// The row id, 0 for a null reference
    pub row: u32,
    /// The token form of `tag` and `row`
    pub token: Token,
}

impl CodedIndex {
    /// Reads a coded index column at `offset`, sized per `info`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is too short or the tag selects no table.
    pub fn read(
        data: &[u8],
        offset: &mut usize,
        info: &TableInfoRef,
        ci_type: CodedIndexType,
    ) -> Result<Self> {
        let value = read_le_at_dyn(data, offset, info.coded_index_bytes(ci_type) == 4)?;
        Self::decode(value, ci_type)
    }

    /// Splits a raw coded value into table and row.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is out of range or reserved.
    pub fn decode(value: u32, ci_type: CodedIndexType) -> Result<Self> {
        let tag_bits = ci_type.tag_bits();
        let tag = (value & ((1 << tag_bits) - 1)) as usize;
        let row = value >> tag_bits;

        match ci_type.tables().get(tag) {
            Some(Some(table)) => Ok(CodedIndex::new(*table, row)),
            _ => Err(malformed_error!(
                "Invalid tag {} for coded index {:?}",
                tag,
                ci_type
            )),
        }
    }

    /// Creates a coded index from its parts.
    #[must_use]
    pub fn new(tag: TableId, row: u32) -> CodedIndex {
        CodedIndex {
            tag,
            row,
            token: Token::from_parts(tag.id(), row),
        }
    }

    /// A coded index with row 0 references nothing.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.row == 0
    }
}
