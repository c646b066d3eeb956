//! The metadata capability the demystifier runs against.
//!
//! [`MetadataProvider`] is the narrow view of a loaded module that name resolution needs:
//! enumerate the methods of a type, read parameters and custom attributes, and fetch raw IL.
//! [`crate::metadata::cilmodule::CilModule`] implements it over a PE file; tests implement it
//! in memory.

use crate::metadata::{customattributes::CustomAttributeValue, token::Token};

/// `MethodImplAttributes.AggressiveInlining`
pub const METHOD_IMPL_AGGRESSIVE_INLINING: u32 = 0x0100;

/// Full names of the attributes and interfaces name resolution looks for.
#[allow(missing_docs)]
pub mod well_known {
    pub const COMPILER_GENERATED: &str = "System.Runtime.CompilerServices.CompilerGeneratedAttribute";
    pub const ASYNC_STATE_MACHINE: &str = "System.Runtime.CompilerServices.AsyncStateMachineAttribute";
    pub const ITERATOR_STATE_MACHINE: &str =
        "System.Runtime.CompilerServices.IteratorStateMachineAttribute";
    pub const ASYNC_ITERATOR_STATE_MACHINE: &str =
        "System.Runtime.CompilerServices.AsyncIteratorStateMachineAttribute";
    pub const TUPLE_ELEMENT_NAMES: &str =
        "System.Runtime.CompilerServices.TupleElementNamesAttribute";
    pub const DYNAMIC: &str = "System.Runtime.CompilerServices.DynamicAttribute";
    pub const PARAM_ARRAY: &str = "System.ParamArrayAttribute";
    pub const STACK_TRACE_HIDDEN: &str = "System.Diagnostics.StackTraceHiddenAttribute";
    pub const I_ASYNC_STATE_MACHINE: &str = "System.Runtime.CompilerServices.IAsyncStateMachine";
    pub const I_ENUMERATOR: &str = "System.Collections.IEnumerator";
}

/// A named class or value type as it appears in a signature.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeRefName {
    /// The `TypeDef` token when the type is defined in the same module
    pub token: Option<Token>,
    /// Namespace of the outermost type
    pub namespace: String,
    /// Metadata name, including a `` `N `` arity suffix for generic types
    pub name: String,
    /// Metadata names of the enclosing types, outermost first
    pub enclosing: Vec<String>,
}

impl TypeRefName {
    /// Creates a name for a top-level type.
    #[must_use]
    pub fn new(namespace: &str, name: &str) -> Self {
        TypeRefName {
            token: None,
            namespace: namespace.to_string(),
            name: name.to_string(),
            enclosing: Vec::new(),
        }
    }

    /// The reflection full name: `Ns.Outer+Inner`.
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut full_name = String::new();
        if !self.namespace.is_empty() {
            full_name.push_str(&self.namespace);
            full_name.push('.');
        }

        for enclosing in &self.enclosing {
            full_name.push_str(enclosing);
            full_name.push('+');
        }

        full_name.push_str(&self.name);
        full_name
    }

    /// Whether this is `namespace.name` at the top level.
    #[must_use]
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.enclosing.is_empty() && self.namespace == namespace && self.name == name
    }
}

/// A type as it appears in a signature, with every reference already resolved to a name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub enum TypeSig {
    #[default]
    Unknown,
    Void,
    Bool,
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
    Object,
    IntPtr,
    UIntPtr,
    TypedReference,
    /// A class or value type
    Named(TypeRefName),
    /// An instantiated generic type
    GenericInst(TypeRefName, Vec<TypeSig>),
    /// A type or method generic parameter, by name
    GenericParam(String),
    /// Single-dimensional, zero-based array
    SzArray(Box<TypeSig>),
    /// Multi-dimensional array with its rank
    Array(Box<TypeSig>, u32),
    /// Unmanaged pointer
    Pointer(Box<TypeSig>),
    /// Managed reference (`ref`/`out`/`in`)
    ByRef(Box<TypeSig>),
    /// Function pointer
    FnPtr,
}

impl TypeSig {
    /// The type definition token of named or generic instance types defined in this module.
    #[must_use]
    pub fn definition(&self) -> Option<Token> {
        match self {
            TypeSig::Named(name) | TypeSig::GenericInst(name, _) => name.token,
            _ => None,
        }
    }

    /// Whether this is a managed reference.
    #[must_use]
    pub fn is_by_ref(&self) -> bool {
        matches!(self, TypeSig::ByRef(_))
    }

    /// Whether this is an instantiated generic type.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        matches!(self, TypeSig::GenericInst(..))
    }
}

/// A method definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    /// The `MethodDef` token
    pub token: Token,
    /// Metadata name
    pub name: String,
    /// The `TypeDef` token of the declaring type; `None` for global methods
    pub declaring_type: Option<Token>,
    /// `MethodAttributes`
    pub flags: u32,
    /// `MethodImplAttributes`
    pub impl_flags: u32,
    /// Return type; `None` for constructors
    pub return_type: Option<TypeSig>,
    /// Method generic parameters, as [`TypeSig::GenericParam`]
    pub generic_arguments: Vec<TypeSig>,
}

impl MethodInfo {
    /// Instance or static constructor.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == ".ctor" || self.name == ".cctor"
    }

    /// Marked to be inlined aggressively.
    #[must_use]
    pub fn is_aggressive_inlining(&self) -> bool {
        self.impl_flags & METHOD_IMPL_AGGRESSIVE_INLINING != 0
    }
}

/// A type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// The `TypeDef` token
    pub token: Token,
    /// Namespace of the type (of its outermost enclosing type for nested types)
    pub namespace: String,
    /// Metadata name
    pub name: String,
    /// The enclosing type of nested types
    pub enclosing: Option<Token>,
    /// Names of the type's generic parameters, including those repeated from enclosing types
    pub generic_parameters: Vec<String>,
    /// Full names of the interfaces the type implements directly
    pub interfaces: Vec<String>,
}

/// A field definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// The `Field` token
    pub token: Token,
    /// Metadata name
    pub name: String,
    /// The `TypeDef` token of the declaring type
    pub declaring_type: Token,
    /// `static` field
    pub is_static: bool,
}

/// `ParamAttributes.In`
pub const PARAM_IN: u32 = 0x0001;
/// `ParamAttributes.Out`
pub const PARAM_OUT: u32 = 0x0002;

/// A method parameter (or the return parameter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    /// The `Param` token, `None` when the parameter has no `Param` row
    pub token: Option<Token>,
    /// Declared name
    pub name: Option<String>,
    /// 1-based position, 0 for the return parameter
    pub sequence: u32,
    /// Declared type, including a by-ref wrapper
    pub param_type: TypeSig,
    /// `ParamAttributes`
    pub flags: u32,
}

impl ParameterInfo {
    /// `out` parameter.
    #[must_use]
    pub fn is_out(&self) -> bool {
        self.flags & PARAM_OUT != 0
    }

    /// `in` parameter.
    #[must_use]
    pub fn is_in(&self) -> bool {
        self.flags & PARAM_IN != 0
    }
}

/// A custom attribute applied to a type, method, field or parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttributeInfo {
    /// Full name of the attribute type
    pub type_name: String,
    /// Decoded arguments; empty when the blob could not be decoded
    pub value: CustomAttributeValue,
}

/// The parts of a method body name resolution inspects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MethodBodyInfo {
    /// The IL code, without the header
    pub il: Vec<u8>,
    /// Types of the local variables
    pub locals: Vec<TypeSig>,
}

/// Read access to the metadata of one module.
///
/// Tokens passed in and returned are always tokens of the same module. Lookups of tokens that
/// do not exist return `None` or an empty list; name resolution treats missing data as "not
/// resolvable" and falls back to a weaker display form.
pub trait MetadataProvider: Send + Sync {
    /// Looks up a `MethodDef`.
    fn method(&self, method: Token) -> Option<MethodInfo>;

    /// Looks up a `TypeDef`.
    fn type_info(&self, type_token: Token) -> Option<TypeInfo>;

    /// Looks up a `Field`.
    fn field(&self, field: Token) -> Option<FieldInfo>;

    /// All methods (constructors included) declared by a type, in metadata order.
    fn methods(&self, type_token: Token) -> Vec<Token>;

    /// Parameters of a method, by sequence, without the return parameter.
    fn parameters(&self, method: Token) -> Vec<ParameterInfo>;

    /// The return parameter of a method; `None` for constructors.
    fn return_parameter(&self, method: Token) -> Option<ParameterInfo>;

    /// Custom attributes applied to a type, method, field or parameter.
    fn custom_attributes(&self, owner: Token) -> Vec<CustomAttributeInfo>;

    /// The body of a method; `None` for abstract, runtime or P/Invoke methods.
    fn method_body(&self, method: Token) -> Option<MethodBodyInfo>;

    /// Maps a method operand of an IL instruction (`MethodDef`, `MemberRef` or `MethodSpec`) to
    /// the `MethodDef` it refers to, when that method is defined in this module.
    fn resolve_method(&self, operand: Token) -> Option<Token>;

    /// Maps a field operand of an IL instruction (`Field` or `MemberRef`) to its `Field` row,
    /// when that field is defined in this module.
    fn resolve_field(&self, operand: Token) -> Option<Token>;

    /// Whether the custom attributes of `owner` include one with the given full name.
    fn has_attribute(&self, owner: Token, type_name: &str) -> bool {
        self.custom_attributes(owner)
            .iter()
            .any(|attribute| attribute.type_name == type_name)
    }

    /// The reflection name of a type definition: namespace, enclosing types and name.
    fn type_name(&self, type_token: Token) -> Option<TypeRefName> {
        let info = self.type_info(type_token)?;

        let mut enclosing = Vec::new();
        let mut namespace = info.namespace.clone();
        let mut current = info.enclosing;
        // Nesting in valid metadata is acyclic; the bound guards against corrupt NestedClass rows
        for _ in 0..64 {
            let Some(token) = current else {
                break;
            };
            let Some(outer) = self.type_info(token) else {
                break;
            };

            enclosing.insert(0, outer.name.clone());
            namespace = outer.namespace.clone();
            current = outer.enclosing;
        }

        Some(TypeRefName {
            token: Some(type_token),
            namespace,
            name: info.name,
            enclosing,
        })
    }

    /// The type of a definition as a signature: generic definitions are instantiated over
    /// their own parameters, as reflection shows them.
    fn type_signature(&self, type_token: Token) -> Option<TypeSig> {
        let name = self.type_name(type_token)?;
        let info = self.type_info(type_token)?;

        if info.generic_parameters.is_empty() {
            Some(TypeSig::Named(name))
        } else {
            Some(TypeSig::GenericInst(
                name,
                info.generic_parameters
                    .into_iter()
                    .map(TypeSig::GenericParam)
                    .collect(),
            ))
        }
    }
}
