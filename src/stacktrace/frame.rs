use std::fmt;

use serde::{Deserialize, Serialize};
use uguid::Guid;

use crate::metadata::token::Token;

/// One frame of a captured stack trace.
///
/// The capturing side fills in what the runtime knew at the time of the failure: the method
/// token and IL offset, the module's MVID and, when the runtime had symbols loaded, the source
/// location. Symbolication never edits a frame; it produces a new one with the missing fields
/// filled in (see [`StackFrameInformation::with_location`]).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrameInformation {
    /// Rendered method, e.g. `async Task App.Program.RunAsync(int delay)`
    pub method: Option<String>,
    /// Metadata token of the method (`0x06xxxxxx`)
    pub method_index: Option<u32>,
    /// Source file
    pub file_name: Option<String>,
    /// IL or native offset into the method body
    pub offset: Option<u32>,
    /// MVID of the module declaring the method
    pub mvid: Option<Guid>,
    /// Whether [`StackFrameInformation::offset`] is an IL offset
    #[serde(rename = "isILOffset")]
    pub is_il_offset: Option<bool>,
    /// Build id of ahead-of-time compiled code
    pub aotid: Option<String>,
    /// Full name of the declaring assembly
    pub assembly_full_name: Option<String>,
    /// Full name of the declaring type, nested types joined with `.`
    pub type_full_name: Option<String>,
    /// 1-based source line
    pub line_number: Option<u32>,
    /// 1-based source column
    pub column_number: Option<u32>,
    /// Rendered parameters of the method
    #[serde(default)]
    pub parameters: Option<Vec<String>>,
    /// Rendered generic arguments of the method
    #[serde(default)]
    pub generic_arguments: Option<Vec<String>>,
}

impl StackFrameInformation {
    /// A frame as the capturing side records it for a method without symbols.
    pub fn new(mvid: Guid, method_index: u32, offset: u32, is_il_offset: bool) -> Self {
        StackFrameInformation {
            method_index: Some(method_index),
            offset: Some(offset),
            mvid: Some(mvid),
            is_il_offset: Some(is_il_offset),
            ..Self::default()
        }
    }

    /// Sets the rendered method name.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Sets the declaring assembly and type names.
    #[must_use]
    pub fn with_declaring(mut self, assembly: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.assembly_full_name = Some(assembly.into());
        self.type_full_name = Some(type_name.into());
        self
    }

    /// Sets the ahead-of-time build id.
    #[must_use]
    pub fn with_aotid(mut self, aotid: impl Into<String>) -> Self {
        self.aotid = Some(aotid.into());
        self
    }

    /// A copy of this frame with the source location added.
    ///
    /// Location fields the frame already carries are kept.
    #[must_use]
    pub fn with_location(&self, file: impl Into<String>, line: u32, column: u32) -> Self {
        let mut frame = self.clone();
        frame.file_name = frame.file_name.or_else(|| Some(file.into()));
        frame.line_number = frame.line_number.or(Some(line));
        frame.column_number = frame.column_number.or(Some(column));
        frame
    }

    /// Whether [`StackFrameInformation::offset`] was captured as a native code offset.
    #[must_use]
    pub fn is_native_offset(&self) -> bool {
        self.is_il_offset == Some(false)
    }

    /// The method token, if one was captured.
    #[must_use]
    pub fn method_token(&self) -> Option<Token> {
        self.method_index.map(Token::new)
    }

    /// Whether the frame still lacks a source line.
    #[must_use]
    pub fn needs_symbols(&self) -> bool {
        self.line_number.is_none()
    }

    /// Writes the frame as one stack trace line, without the line break.
    ///
    /// Writes nothing for a frame without method name.
    pub(crate) fn write_line(&self, out: &mut impl fmt::Write) -> fmt::Result {
        let Some(method) = &self.method else {
            return Ok(());
        };

        write!(out, "   at {method}")?;
        if let Some(file) = &self.file_name {
            write!(out, " in {file}")?;
        } else if let Some(mvid) = &self.mvid {
            write!(out, " in <{}", mvid.to_string().replace('-', ""))?;
            if let Some(aotid) = &self.aotid {
                write!(out, "#{aotid}")?;
            }
            out.write_char('>')?;
        }

        if let Some(line) = self.line_number {
            write!(out, ":line {line}")?;
        }

        if let Some(column) = self.column_number {
            write!(out, ":{column}")?;
        }

        Ok(())
    }
}

impl fmt::Display for StackFrameInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_line(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mvid() -> Guid {
        Guid::from_bytes([
            0x10, 0x32, 0x54, 0x76, 0x98, 0xBA, 0xDC, 0xFE, 0x01, 0x23, 0x45, 0x67, 0x89, 0xAB,
            0xCD, 0xEF,
        ])
    }

    #[test]
    fn resolved_line() {
        let frame = StackFrameInformation::new(mvid(), 0x0600_0001, 12, true)
            .with_method("void App.Program.Main(string[] args)")
            .with_location("/src/App/Program.cs", 14, 13);

        assert_eq!(
            frame.to_string(),
            "   at void App.Program.Main(string[] args) in /src/App/Program.cs:line 14:13"
        );
        assert!(!frame.needs_symbols());
    }

    #[test]
    fn module_placeholder() {
        let hex = mvid().to_string().replace('-', "");
        let frame = StackFrameInformation::new(mvid(), 0x0600_0001, 12, true).with_method("App.Program.Main()");
        assert_eq!(frame.to_string(), format!("   at App.Program.Main() in <{hex}>"));

        let frame = frame.with_aotid("b2e1");
        assert_eq!(frame.to_string(), format!("   at App.Program.Main() in <{hex}#b2e1>"));
    }

    #[test]
    fn bare_method() {
        let frame = StackFrameInformation::default().with_method("App.Program.Main()");
        assert_eq!(frame.to_string(), "   at App.Program.Main()");
    }

    #[test]
    fn unnamed_frames_render_nothing() {
        let frame = StackFrameInformation::new(mvid(), 0x0600_0001, 0, true);
        assert_eq!(frame.to_string(), "");
        assert_eq!(frame.method_token(), Some(Token::new(0x0600_0001)));
    }

    #[test]
    fn location_leaves_original_untouched() {
        let frame = StackFrameInformation::new(mvid(), 0x0600_0002, 4, true);
        let resolved = frame.with_location("a.cs", 1, 2);

        assert!(frame.needs_symbols());
        assert_eq!(resolved.method_index, frame.method_index);
        assert_eq!(resolved.file_name.as_deref(), Some("a.cs"));
    }

    #[test]
    fn location_keeps_captured_fields() {
        let mut frame = StackFrameInformation::new(mvid(), 0x0600_0002, 4, true);
        frame.file_name = Some("Captured.cs".to_string());
        frame.column_number = Some(7);

        let resolved = frame.with_location("Program.cs", 12, 13);
        assert_eq!(resolved.file_name.as_deref(), Some("Captured.cs"));
        assert_eq!(resolved.line_number, Some(12));
        assert_eq!(resolved.column_number, Some(7));
    }

    #[test]
    fn native_offsets() {
        assert!(StackFrameInformation::new(mvid(), 0x0600_0002, 4, false).is_native_offset());
        assert!(!StackFrameInformation::new(mvid(), 0x0600_0002, 4, true).is_native_offset());
        assert!(!StackFrameInformation::default().is_native_offset());
    }
}
