//! Signature blob parsing (ECMA-335 II.23.2).
//!
//! Method, field, local-variable and method-spec signatures are decoded into
//! [`TypeSignature`] trees. Type references stay as tokens; naming them is done by
//! [`crate::metadata::cilmodule::CilModule`], which knows the tables they point into.
//!
//! # Examples
//!
//! ```rust
//! use dotsym::metadata::signatures::{parse_method_signature, TypeSignature};
//!
//! // instance string M(int32)
//! let sig = parse_method_signature(&[0x20, 0x01, 0x0E, 0x08])?;
//! assert!(sig.has_this);
//! assert_eq!(sig.return_type.base, TypeSignature::String);
//! assert_eq!(sig.params[0].base, TypeSignature::I4);
//! # Ok::<(), dotsym::Error>(())
//! ```

mod parser;
mod types;

pub use parser::*;
pub use types::*;

use crate::Result;

/// Parses a `MethodDefSig` or `MethodRefSig` blob.
///
/// # Errors
/// Returns an error if the blob is truncated or malformed.
pub fn parse_method_signature(data: &[u8]) -> Result<SignatureMethod> {
    let mut parser = SignatureParser::new(data);
    parser.parse_method_signature()
}

/// Parses a `FieldSig` blob.
///
/// # Errors
/// Returns an error if the blob is truncated or malformed.
pub fn parse_field_signature(data: &[u8]) -> Result<SignatureField> {
    let mut parser = SignatureParser::new(data);
    parser.parse_field_signature()
}

/// Parses a `LocalVarSig` blob.
///
/// # Errors
/// Returns an error if the blob is truncated or malformed.
pub fn parse_local_var_signature(data: &[u8]) -> Result<SignatureLocalVariables> {
    let mut parser = SignatureParser::new(data);
    parser.parse_local_var_signature()
}

/// Parses a `TypeSpec` blob.
///
/// # Errors
/// Returns an error if the blob is truncated or malformed.
pub fn parse_type_spec_signature(data: &[u8]) -> Result<TypeSignature> {
    let mut parser = SignatureParser::new(data);
    parser.parse_type_spec_signature()
}

/// Parses a `MethodSpec` instantiation blob.
///
/// # Errors
/// Returns an error if the blob is truncated or malformed.
pub fn parse_method_spec_signature(data: &[u8]) -> Result<SignatureMethodSpec> {
    let mut parser = SignatureParser::new(data);
    parser.parse_method_spec_signature()
}
