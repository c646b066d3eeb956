//! Where [`crate::symbols::SymbolReaderCache`] looks for symbol files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Symbol file lookup configuration.
///
/// The default suits developer machines: no symbol store, but the path the compiler recorded in
/// the binary is tried, which is usually where the PDB still sits. Servers that symbolicate
/// traces from other machines should use [`SymbolOptions::server`], which never touches the
/// recorded path.
///
/// # Examples
///
/// ```rust
/// use dotsym::symbols::SymbolOptions;
///
/// let options = SymbolOptions::server("/var/lib/symbols").with_verify_pdb_id(false);
/// assert!(!options.attempt_original_symbol_path);
///
/// let options: SymbolOptions = serde_json::from_str(r#"{ "symbols_path": "/srv/pdb" }"#)?;
/// assert_eq!(options.symbol_extension, "pdb");
/// assert!(options.attempt_original_symbol_path);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolOptions {
    /// Root of the symbol store; `None` disables both store lookups
    pub symbols_path: Option<PathBuf>,
    /// Try the symbol file path recorded in the binary after the store
    pub attempt_original_symbol_path: bool,
    /// Extension of symbol files in the per-module store layout, without the dot
    pub symbol_extension: String,
    /// Reject symbol files whose PDB id differs from the binary's CodeView signature
    pub verify_pdb_id: bool,
}

impl Default for SymbolOptions {
    fn default() -> Self {
        SymbolOptions {
            symbols_path: None,
            attempt_original_symbol_path: true,
            symbol_extension: "pdb".to_string(),
            verify_pdb_id: true,
        }
    }
}

impl SymbolOptions {
    /// Options for a symbolication server: search only below `root`.
    pub fn server(root: impl Into<PathBuf>) -> Self {
        SymbolOptions {
            symbols_path: Some(root.into()),
            attempt_original_symbol_path: false,
            ..Self::default()
        }
    }

    /// Sets the symbol store root.
    #[must_use]
    pub fn with_symbols_path(mut self, root: impl Into<PathBuf>) -> Self {
        self.symbols_path = Some(root.into());
        self
    }

    /// Enables or disables probing the recorded symbol path.
    #[must_use]
    pub fn with_original_symbol_path(mut self, enabled: bool) -> Self {
        self.attempt_original_symbol_path = enabled;
        self
    }

    /// Sets the symbol file extension used in the per-module layout.
    #[must_use]
    pub fn with_symbol_extension(mut self, extension: &str) -> Self {
        self.symbol_extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Enables or disables the PDB id check.
    #[must_use]
    pub fn with_verify_pdb_id(mut self, enabled: bool) -> Self {
        self.verify_pdb_id = enabled;
        self
    }

    /// The symbol store root, if any.
    #[must_use]
    pub fn symbols_path(&self) -> Option<&Path> {
        self.symbols_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = SymbolOptions::default();
        assert!(options.symbols_path().is_none());
        assert!(options.attempt_original_symbol_path);
        assert!(options.verify_pdb_id);
        assert_eq!(options.symbol_extension, "pdb");
    }

    #[test]
    fn server() {
        let options = SymbolOptions::server("/srv/symbols");
        assert_eq!(options.symbols_path(), Some(Path::new("/srv/symbols")));
        assert!(!options.attempt_original_symbol_path);
        assert!(options.verify_pdb_id);
    }

    #[test]
    fn builders() {
        let options = SymbolOptions::default()
            .with_symbols_path("/tmp/pdb")
            .with_original_symbol_path(false)
            .with_symbol_extension(".ppdb")
            .with_verify_pdb_id(false);

        assert_eq!(options.symbols_path(), Some(Path::new("/tmp/pdb")));
        assert!(!options.attempt_original_symbol_path);
        assert_eq!(options.symbol_extension, "ppdb");
        assert!(!options.verify_pdb_id);
    }

    #[test]
    fn partial_config() {
        let options: SymbolOptions =
            serde_json::from_str(r#"{ "attempt_original_symbol_path": false }"#).unwrap();
        assert!(options.symbols_path.is_none());
        assert!(!options.attempt_original_symbol_path);
        assert_eq!(options.symbol_extension, "pdb");
    }
}
