use strum::{EnumCount, EnumIter};

/// Identifiers of the metadata tables, ECMA-335 II.22 plus the portable PDB debug tables.
///
/// The discriminant is the table number as it appears in the high byte of a token and as the
/// bit position in the tables-stream `valid` mask.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, EnumIter, EnumCount)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum TableId {
    Module = 0x00,
    TypeRef = 0x01,
    TypeDef = 0x02,
    FieldPtr = 0x03,
    Field = 0x04,
    MethodPtr = 0x05,
    MethodDef = 0x06,
    ParamPtr = 0x07,
    Param = 0x08,
    InterfaceImpl = 0x09,
    MemberRef = 0x0A,
    Constant = 0x0B,
    CustomAttribute = 0x0C,
    FieldMarshal = 0x0D,
    DeclSecurity = 0x0E,
    ClassLayout = 0x0F,
    FieldLayout = 0x10,
    StandAloneSig = 0x11,
    EventMap = 0x12,
    EventPtr = 0x13,
    Event = 0x14,
    PropertyMap = 0x15,
    PropertyPtr = 0x16,
    Property = 0x17,
    MethodSemantics = 0x18,
    MethodImpl = 0x19,
    ModuleRef = 0x1A,
    TypeSpec = 0x1B,
    ImplMap = 0x1C,
    FieldRVA = 0x1D,
    EncLog = 0x1E,
    EncMap = 0x1F,
    Assembly = 0x20,
    AssemblyProcessor = 0x21,
    AssemblyOS = 0x22,
    AssemblyRef = 0x23,
    AssemblyRefProcessor = 0x24,
    AssemblyRefOS = 0x25,
    File = 0x26,
    ExportedType = 0x27,
    ManifestResource = 0x28,
    NestedClass = 0x29,
    GenericParam = 0x2A,
    MethodSpec = 0x2B,
    GenericParamConstraint = 0x2C,
    Document = 0x30,
    MethodDebugInformation = 0x31,
    LocalScope = 0x32,
    LocalVariable = 0x33,
    LocalConstant = 0x34,
    ImportScope = 0x35,
    StateMachineMethod = 0x36,
    CustomDebugInformation = 0x37,
}

impl TableId {
    /// The first table that belongs to the portable PDB debug tables.
    pub const FIRST_DEBUG_TABLE: u8 = 0x30;

    /// Returns the table number.
    #[must_use]
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Returns `true` for the tables that live in a portable PDB rather than in an assembly.
    #[must_use]
    pub fn is_debug_table(self) -> bool {
        self.id() >= Self::FIRST_DEBUG_TABLE
    }
}

impl TryFrom<u8> for TableId {
    type Error = crate::Error;

    fn try_from(value: u8) -> crate::Result<Self> {
        use strum::IntoEnumIterator;

        TableId::iter()
            .find(|table| table.id() == value)
            .ok_or_else(|| malformed_error!("Unknown metadata table - 0x{:02x}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids() {
        assert_eq!(TableId::MethodDef.id(), 6);
        assert_eq!(TableId::Document.id(), 0x30);
        assert!(TableId::MethodDebugInformation.is_debug_table());
        assert!(!TableId::GenericParamConstraint.is_debug_table());
        assert_eq!(TableId::COUNT, 53);
    }

    #[test]
    fn from_u8() {
        assert_eq!(TableId::try_from(0x2A).unwrap(), TableId::GenericParam);
        assert!(TableId::try_from(0x2D).is_err());
        assert!(TableId::try_from(0x3F).is_err());
    }
}
