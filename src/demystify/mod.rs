//! Readable method names for frames in compiler-generated code.
//!
//! The C# compiler lowers `async` methods, iterators, lambdas and local functions into methods
//! with names such as `<RunAsync>d__4.MoveNext` or `<>c.<Main>b__0_1`. This module traces such
//! methods back to the method the user wrote and renders a C#-like signature for it:
//!
//! ```text
//! App.Program+<RunAsync>d__4.MoveNext()   =>  async Task App.Program.RunAsync(int delay)
//! App.Program+<>c.<Main>b__0_1(int x)     =>  void App.Program.Main(string[] args)+(int x) => { } [1]
//! ```
//!
//! Resolution runs against a [`MetadataProvider`], the narrow metadata view implemented by
//! [`crate::metadata::cilmodule::CilModule`] for PE files.
//!
//! # Key Components
//!
//! - [`Demystifier`] - Resolves a method token to a [`ResolvedMethod`]
//! - [`GeneratedName`] - Parser for compiler-generated names
//! - [`type_display_name`] - C# keyword and generic rendering of signature types
//! - [`show_in_stack_trace`] - Frame visibility filter
//!
//! # Examples
//!
//! ```rust
//! use dotsym::demystify::{GeneratedName, GeneratedNameKind};
//!
//! let name = GeneratedName::parse("<Main>b__0_1").unwrap();
//! assert_eq!(name.kind, GeneratedNameKind::LambdaMethod);
//! assert_eq!(name.original_name(), "Main");
//! ```

mod demystifier;
mod generatedname;
mod provider;
mod resolved;
mod typename;
mod visibility;

pub use demystifier::{Demystifier, MAX_RESOLVE_DEPTH};
pub use generatedname::{GeneratedName, GeneratedNameKind};
pub use provider::*;
pub use resolved::{ParameterPrefix, ResolvedMethod, ResolvedParameter};
pub use typename::{
    append_type_display_name, generic_type_name, is_value_tuple, type_display_name,
    DisplayNameOptions,
};
pub use visibility::{is_runtime_plumbing, show_in_stack_trace};
