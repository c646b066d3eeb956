//! Metadata tables of ECMA-335 assemblies and portable PDBs.
//!
//! Only the tables the symbolicator consults get typed row structs; the remaining tables are
//! still described by [`types::columns`] so that their sizes, and thereby the offsets of the
//! tables that follow them, are known.
//!
//! Rows are exposed in their raw form (`XxxRaw`): heap columns are indexes into the owning
//! image's heaps, resolved by [`crate::metadata::image::MetadataImage`].

mod customattribute;
mod document;
mod field;
mod genericparam;
mod interfaceimpl;
mod memberref;
mod methoddebuginformation;
mod methoddef;
mod methodspec;
mod module;
mod nestedclass;
mod param;
mod standalonesig;
mod typedef;
mod typeref;
mod typespec;
pub mod types;

pub use customattribute::CustomAttributeRaw;
pub use document::DocumentRaw;
pub use field::FieldRaw;
pub use genericparam::GenericParamRaw;
pub use interfaceimpl::InterfaceImplRaw;
pub use memberref::MemberRefRaw;
pub use methoddebuginformation::MethodDebugInformationRaw;
pub use methoddef::MethodDefRaw;
pub use methodspec::MethodSpecRaw;
pub use module::ModuleRaw;
pub use nestedclass::NestedClassRaw;
pub use param::ParamRaw;
pub use standalonesig::StandAloneSigRaw;
pub use typedef::TypeDefRaw;
pub use typeref::TypeRefRaw;
pub use typespec::TypeSpecRaw;
pub use types::{
    CodedIndex, CodedIndexType, MetadataTable, RowReadable, TableId, TableInfo, TableInfoRef,
    TableIterator, TableRowInfo,
};
