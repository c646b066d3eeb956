//! # dotsym Prelude
//!
//! The types most symbolication code needs, for glob import.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotsym operations
pub use crate::Error;

/// The result type used throughout dotsym
pub use crate::Result;

/// Low-level file parsing utilities
pub use crate::{File, Parser};

// ================================================================================================
// Stack Traces
// ================================================================================================

/// Frames, traces and their rendering
pub use crate::stacktrace::{StackFrameInformation, StackTraceInformation, Symbolicator, TraceFormat};

// ================================================================================================
// Symbols
// ================================================================================================

/// Debug metadata, symbol lookup and configuration
pub use crate::symbols::{
    extract_debug_meta, resolve_sequence_point, DebugMeta, DebugType, FileSystemOpener,
    SymbolFileOpener, SymbolOptions, SymbolReaderCache,
};

// ================================================================================================
// Metadata
// ================================================================================================

/// Loaded modules and portable PDBs
pub use crate::metadata::{
    cilmodule::CilModule,
    portablepdb::{PortablePdb, SourceLocation},
    sequencepoints::SequencePoint,
    token::Token,
};

// ================================================================================================
// Demystification
// ================================================================================================

/// Generated-name resolution and frame visibility
pub use crate::demystify::{
    show_in_stack_trace, Demystifier, GeneratedName, GeneratedNameKind, MetadataProvider,
    ResolvedMethod, ResolvedParameter,
};
