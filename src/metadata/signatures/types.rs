use crate::metadata::token::Token;

#[allow(non_snake_case, dead_code, missing_docs)]
/// Bytes that encode the element types of a signature blob (ECMA-335 II.23.1.16)
pub mod ELEMENT_TYPE {
    pub const END: u8 = 0x00;
    pub const VOID: u8 = 0x01;
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0a;
    pub const U8: u8 = 0x0b;
    pub const R4: u8 = 0x0c;
    pub const R8: u8 = 0x0d;
    pub const STRING: u8 = 0x0e;
    // Followed by type
    pub const PTR: u8 = 0x0f;
    // Followed by type
    pub const BYREF: u8 = 0x10;
    // Followed by TypeDef or TypeRef token
    pub const VALUETYPE: u8 = 0x11;
    // Followed by TypeDef or TypeRef token
    pub const CLASS: u8 = 0x12;
    // Generic parameter of a type, by number
    pub const VAR: u8 = 0x13;
    // type rank boundsCount bound1 … loCount lo1 …
    pub const ARRAY: u8 = 0x14;
    // Followed by type type-arg-count type-1 ... type-n
    pub const GENERICINST: u8 = 0x15;
    pub const TYPEDBYREF: u8 = 0x16;
    // System.IntPtr
    pub const I: u8 = 0x18;
    // System.UIntPtr
    pub const U: u8 = 0x19;
    // Followed by full method signature
    pub const FNPTR: u8 = 0x1b;
    // System.Object
    pub const OBJECT: u8 = 0x1c;
    // Single-dim array with 0 lower bound
    pub const SZARRAY: u8 = 0x1d;
    // Generic parameter of a method, by number
    pub const MVAR: u8 = 0x1e;
    // Required modifier, followed by a TypeDef or TypeRef token
    pub const CMOD_REQD: u8 = 0x1f;
    // Optional modifier, followed by a TypeDef or TypeRef token
    pub const CMOD_OPT: u8 = 0x20;
    pub const INTERNAL: u8 = 0x21;
    pub const MODIFIER: u8 = 0x40;
    // Sentinel for vararg method signature
    pub const SENTINEL: u8 = 0x41;
    // Local variable that points at a pinned object
    pub const PINNED: u8 = 0x45;
}

/// A type as it is encoded in a signature blob.
///
/// Class and value types are kept as `TypeDefOrRef` tokens; turning them into names is left to
/// whoever owns the tables the tokens point into.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub enum TypeSignature {
    #[default]
    Unknown,
    Void,
    Boolean,
    Char,
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    I8,
    U8,
    R4,
    R8,
    String,
    /// Unmanaged pointer to the inner type
    Ptr(Box<TypeSignature>),
    /// Managed reference to the inner type
    ByRef(Box<TypeSignature>),
    /// A value type, by `TypeDefOrRef` token
    ValueType(Token),
    /// A reference type, by `TypeDefOrRef` token
    Class(Token),
    /// The n-th generic parameter of the enclosing type
    GenericParamType(u32),
    /// A general array with the given rank
    Array(Box<TypeSignature>, u32),
    /// An instantiated generic type: definition and arguments
    GenericInst(Box<TypeSignature>, Vec<TypeSignature>),
    TypedByRef,
    I,
    U,
    /// A function pointer
    FnPtr(Box<SignatureMethod>),
    Object,
    /// A single-dimension, zero-based array
    SzArray(Box<TypeSignature>),
    /// The n-th generic parameter of the method
    GenericParamMethod(u32),
    /// A pinned local
    Pinned(Box<TypeSignature>),
}

/// A parameter or return type of a method signature
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignatureParameter {
    /// Custom modifiers (`modreq`/`modopt`) of the parameter, as `TypeDefOrRef` tokens
    pub modifiers: Vec<Token>,
    /// Parameter is passed by reference
    pub by_ref: bool,
    /// The type of the parameter, without the by-ref marker
    pub base: TypeSignature,
}

/// A method signature (II.23.2.1)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignatureMethod {
    /// The method takes an implicit `this`
    pub has_this: bool,
    /// The `this` parameter is listed explicitly
    pub explicit_this: bool,
    /// The method uses the vararg calling convention
    pub vararg: bool,
    /// Number of generic parameters of the method
    pub param_count_generic: u32,
    /// The return type
    pub return_type: SignatureParameter,
    /// The declared parameters
    pub params: Vec<SignatureParameter>,
}

/// A field signature (II.23.2.4)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignatureField {
    /// Custom modifiers of the field
    pub modifiers: Vec<Token>,
    /// The type of the field
    pub base: TypeSignature,
}

/// A local variable of a method body
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignatureLocalVariable {
    /// The local is a managed reference
    pub is_byref: bool,
    /// The local is pinned
    pub is_pinned: bool,
    /// The type of the local
    pub base: TypeSignature,
}

/// A local variable signature (II.23.2.6)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignatureLocalVariables {
    /// The locals, in slot order
    pub locals: Vec<SignatureLocalVariable>,
}

/// A method specification signature (II.23.2.15)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignatureMethodSpec {
    /// The generic arguments of the instantiation
    pub generic_args: Vec<TypeSignature>,
}
