//! Sequence points of portable PDB `MethodDebugInformation` rows.
//!
//! A method's sequence points map ranges of its IL to source spans. They are stored as one
//! delta-encoded blob per method (see the portable PDB format, "Sequence Points Blob"):
//!
//! ```text
//! header:  LocalSignature            compressed uint (StandAloneSig row id)
//!          InitialDocument           compressed uint, only if the row's Document column is null
//! records: δILOffset                 compressed uint; absolute for the first record
//!          then one of:
//!          - document record         δILOffset == 0 on a later record, then Document (uint)
//!          - hidden point            ΔLines == 0 and ΔColumns == 0
//!          - visible point           ΔLines (uint), ΔColumns (uint if ΔLines == 0, else int),
//!                                    δStartLine, δStartColumn (uint for the first visible
//!                                    point, int deltas afterwards)
//! ```
//!
//! # Examples
//!
//! ```rust
//! use dotsym::metadata::sequencepoints::parse_sequence_points;
//!
//! // LocalSignature 0, one point at IL 0 spanning line 10, columns 9..20, in document 1
//! let blob: &[u8] = &[0x00, 0x00, 0x00, 0x0B, 0x0A, 0x09];
//! let points = parse_sequence_points(blob, 1)?;
//! assert_eq!(points.0.len(), 1);
//! assert_eq!(points.0[0].start_line, 10);
//! assert_eq!(points.0[0].document, 1);
//! # Ok::<(), dotsym::Error>(())
//! ```

use crate::{file::parser::Parser, Result};

/// Start line of a hidden sequence point.
pub const HIDDEN_LINE: u32 = 0x00FE_EFEE;

/// A single mapping from an IL offset to a source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencePoint {
    /// Offset in the method's IL stream
    pub il_offset: u32,
    /// Starting line in the source file, [`HIDDEN_LINE`] for hidden points
    pub start_line: u32,
    /// Starting column in the source file
    pub start_col: u16,
    /// Ending line in the source file
    pub end_line: u32,
    /// Ending column in the source file
    pub end_col: u16,
    /// Row of the `Document` table this point belongs to
    pub document: u32,
}

impl SequencePoint {
    /// True for points that carry no source location.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.start_line == HIDDEN_LINE
    }
}

/// The sequence points of one method, in blob order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequencePoints(pub Vec<SequencePoint>);

impl SequencePoints {
    /// Returns the sequence point starting exactly at `il_offset`, if any.
    #[must_use]
    pub fn find_by_il_offset(&self, il_offset: u32) -> Option<&SequencePoint> {
        self.0.iter().find(|sp| sp.il_offset == il_offset)
    }
}

fn column(value: i64) -> Result<u16> {
    u16::try_from(value).map_err(|_| malformed_error!("Sequence point column out of range - {}", value))
}

fn line(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| malformed_error!("Sequence point line out of range - {}", value))
}

/// Parses a sequence points blob.
///
/// `document` is the `Document` column of the owning `MethodDebugInformation` row; when it is
/// 0 the blob names its initial document itself.
///
/// # Errors
///
/// Returns an error if the blob is truncated, starts with a document record, or a delta moves a
/// line or column out of range.
pub fn parse_sequence_points(blob: &[u8], document: u32) -> Result<SequencePoints> {
    let mut parser = Parser::new(blob);
    let mut points = Vec::new();

    // Header
    parser.read_compressed_uint()?;
    let mut document = if document == 0 {
        parser.read_compressed_uint()?
    } else {
        document
    };

    let mut il_offset = 0_u32;
    let mut previous_start: Option<(u32, u16)> = None;
    let mut first = true;

    while parser.has_more_data() {
        let delta_il = parser.read_compressed_uint()?;

        if !first && delta_il == 0 {
            document = parser.read_compressed_uint()?;
            continue;
        }

        il_offset = if first {
            delta_il
        } else {
            il_offset
                .checked_add(delta_il)
                .ok_or_else(|| malformed_error!("Sequence point IL offset overflows"))?
        };
        first = false;

        let delta_lines = parser.read_compressed_uint()?;
        let delta_columns = if delta_lines == 0 {
            i64::from(parser.read_compressed_uint()?)
        } else {
            i64::from(parser.read_compressed_int()?)
        };

        if delta_lines == 0 && delta_columns == 0 {
            points.push(SequencePoint {
                il_offset,
                start_line: HIDDEN_LINE,
                start_col: 0,
                end_line: HIDDEN_LINE,
                end_col: 0,
                document,
            });
            continue;
        }

        let (start_line, start_col) = match previous_start {
            None => (
                line(i64::from(parser.read_compressed_uint()?))?,
                column(i64::from(parser.read_compressed_uint()?))?,
            ),
            Some((prev_line, prev_col)) => (
                line(i64::from(prev_line) + i64::from(parser.read_compressed_int()?))?,
                column(i64::from(prev_col) + i64::from(parser.read_compressed_int()?))?,
            ),
        };
        previous_start = Some((start_line, start_col));

        points.push(SequencePoint {
            il_offset,
            start_line,
            start_col,
            end_line: line(i64::from(start_line) + i64::from(delta_lines))?,
            end_col: column(i64::from(start_col) + delta_columns)?,
            document,
        });
    }

    Ok(SequencePoints(points))
}
