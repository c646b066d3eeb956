//! Custom attribute blobs (ECMA-335 II.23.3).
//!
//! The symbolicator reads a handful of compiler attributes: the state machine attributes that
//! link an `async` or iterator method to its generated type, `TupleElementNamesAttribute`,
//! `DynamicAttribute`, `ParamArrayAttribute` and `StackTraceHiddenAttribute`. Their blobs are
//! decoded here against the constructor's parameter types.
//!
//! # Examples
//!
//! ```rust
//! use dotsym::metadata::customattributes::{parse_custom_attribute_data, ArgType};
//!
//! // [AsyncStateMachine(typeof(Program.<Main>d__0))]
//! let mut blob = vec![0x01, 0x00, 18];
//! blob.extend_from_slice(b"Program+<Main>d__0");
//! blob.extend_from_slice(&[0x00, 0x00]);
//!
//! let value = parse_custom_attribute_data(&blob, &[ArgType::Type])?;
//! assert_eq!(value.fixed_args[0].as_str(), Some("Program+<Main>d__0"));
//! # Ok::<(), dotsym::Error>(())
//! ```

mod parser;
mod types;

pub use parser::{parse_custom_attribute_data, CustomAttributeParser};
pub use types::*;
