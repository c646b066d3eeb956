use std::sync::Arc;

use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds {
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Symbolication is best-effort: a symbol file that simply does not exist is never an error
/// (lookups return `Ok(None)`), and a method name that cannot be demystified falls back to a
/// weaker display form. The variants below are reserved for input that is genuinely broken, such
/// as a binary whose debug directory is inconsistent or a symbol file that fails to parse.
///
/// # Error Categories
///
/// ## File Parsing Errors
/// - [`Error::Malformed`] - Corrupted or invalid file structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond file boundaries
/// - [`Error::NotSupported`] - Unsupported file format or feature
/// - [`Error::Empty`] - Empty input provided
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::GoblinErr`] - PE parsing errors from goblin crate
/// - [`Error::Json`] - Structured stack trace (de)serialization errors
///
/// ## Symbolication Errors
/// - [`Error::SymbolFile`] - A symbol file was found for a module but could not be read
/// - [`Error::RecursionLimit`] - Maximum recursion depth exceeded
///
/// # Examples
///
/// ```rust,no_run
/// use dotsym::{Error, metadata::portablepdb::PortablePdb};
/// use std::path::Path;
///
/// match PortablePdb::from_file(Path::new("module.pdb")) {
///     Ok(pdb) => println!("pdb id {}", pdb.pdb_id().0),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed file: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    // File parsing Errors
    /// The file is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    #[error("Out of Bound read would have occurred - {file}:{line}")]
    OutOfBounds {
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// This file type is not supported.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),

    /// Error from the goblin crate during PE parsing.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// Error while serializing or deserializing a structured stack trace.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// A symbol file was located for a module but could not be used.
    ///
    /// The inner error is shared, since the cache hands the same failure to every lookup of
    /// the module.
    #[error("Symbol file for module {module_id} failed - {source}")]
    SymbolFile {
        /// The module whose symbol file failed
        module_id: uguid::Guid,
        /// The underlying parse error
        source: Arc<Error>,
    },

    /// Recursion limit reached.
    ///
    /// Signatures and generated-name lookups are bounded; this error reports the limit that was
    /// exceeded.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),
}
