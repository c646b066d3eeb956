//! Value types of decoded custom attribute blobs (ECMA-335 II.23.3).

/// The declared type of a custom attribute constructor parameter.
///
/// Attribute blobs are not self-describing for fixed arguments; the constructor signature says
/// how each value is encoded. The owner of the metadata maps the signature's types into this
/// enum before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgType {
    /// `bool`
    Bool,
    /// `char`
    Char,
    /// `sbyte`
    I1,
    /// `byte`
    U1,
    /// `short`
    I2,
    /// `ushort`
    U2,
    /// `int`
    I4,
    /// `uint`
    U4,
    /// `long`
    I8,
    /// `ulong`
    U8,
    /// `float`
    R4,
    /// `double`
    R8,
    /// `string`
    String,
    /// `System.Type`, serialized as a type name string
    Type,
    /// `object`, serialized with a leading type tag
    Object,
    /// Enum with the given underlying type
    Enum(Box<ArgType>),
    /// Single-dimensional array
    SzArray(Box<ArgType>),
}

/// One decoded argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomAttributeArgument {
    /// Boolean value
    Bool(bool),
    /// Character value (16-bit Unicode)
    Char(char),
    /// Any integer value, widened
    Int(i64),
    /// `ulong` value that does not fit into `i64`
    UInt(u64),
    /// Floating point value, widened
    Float(f64),
    /// String value; `None` for a null string
    String(Option<String>),
    /// Type name in reflection form; `None` for a null type
    Type(Option<String>),
    /// Array value; `None` for a null array
    Array(Option<Vec<CustomAttributeArgument>>),
}

impl CustomAttributeArgument {
    /// The string payload of a `String` or `Type` argument.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CustomAttributeArgument::String(value) | CustomAttributeArgument::Type(value) => {
                value.as_deref()
            }
            _ => None,
        }
    }
}

/// Named field or property argument.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttributeNamedArgument {
    /// Field (true) or property (false)
    pub is_field: bool,
    /// Name of the field or property
    pub name: String,
    /// Value of the argument
    pub value: CustomAttributeArgument,
}

/// A decoded custom attribute blob.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomAttributeValue {
    /// Constructor arguments in declaration order
    pub fixed_args: Vec<CustomAttributeArgument>,
    /// Field and property assignments
    pub named_args: Vec<CustomAttributeNamedArgument>,
}

/// `CorSerializationType` constants as defined in corhdr.h
#[allow(non_snake_case, missing_docs)]
pub mod SERIALIZATION_TYPE {
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0A;
    pub const U8: u8 = 0x0B;
    pub const R4: u8 = 0x0C;
    pub const R8: u8 = 0x0D;
    pub const STRING: u8 = 0x0E;
    pub const SZARRAY: u8 = 0x1D;
    pub const TYPE: u8 = 0x50;
    pub const TAGGED_OBJECT: u8 = 0x51;
    pub const FIELD: u8 = 0x53;
    pub const PROPERTY: u8 = 0x54;
    pub const ENUM: u8 = 0x55;
}
