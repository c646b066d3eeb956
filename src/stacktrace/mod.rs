//! Captured stack traces and their symbolication.
//!
//! A [`StackTraceInformation`] is what a crashing process sends: one
//! [`StackFrameInformation`] per frame (module MVID, method token, IL offset, and whatever the
//! runtime could already resolve) plus the [`crate::symbols::DebugMeta`] of every module whose
//! frames lack source lines. A [`Symbolicator`] later fills in file, line and column from the
//! modules' portable PDBs and, given the modules' metadata, readable method names.
//!
//! # Examples
//!
//! ```rust
//! use dotsym::stacktrace::{StackFrameInformation, StackTraceInformation, TraceFormat};
//! use uguid::Guid;
//!
//! let mut trace = StackTraceInformation::empty();
//! trace.push(
//!     StackFrameInformation::new(Guid::ZERO, 0x0600_0001, 12, true)
//!         .with_method("void App.Program.Main(string[] args)")
//!         .with_location("/src/App/Program.cs", 14, 13),
//!     None,
//! );
//!
//! assert_eq!(
//!     trace.render(TraceFormat::Default)?,
//!     "   at void App.Program.Main(string[] args) in /src/App/Program.cs:line 14:13\n"
//! );
//! # Ok::<(), dotsym::Error>(())
//! ```

mod frame;
mod symbolicator;
mod trace;

pub use frame::StackFrameInformation;
pub use symbolicator::Symbolicator;
pub use trace::{StackTraceInformation, TraceFormat};
