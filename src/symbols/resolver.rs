//! Mapping an IL offset to a source location through a method's sequence points.

use crate::metadata::sequencepoints::SequencePoint;

/// Finds the sequence point that covers `il_offset`.
///
/// Points are scanned in ascending IL order. The result is the last visible point at or before
/// the offset; hidden points never replace an earlier visible point, but still end the scan
/// once a later point lies past the offset. Returns `None` when the offset precedes every
/// visible point.
///
/// Unsorted input is sorted on a copy first.
///
/// # Examples
///
/// ```rust
/// use dotsym::metadata::sequencepoints::SequencePoint;
/// use dotsym::symbols::resolve_sequence_point;
///
/// let at = |il_offset, start_line| SequencePoint {
///     il_offset,
///     start_line,
///     start_col: 9,
///     end_line: start_line,
///     end_col: 20,
///     document: 1,
/// };
/// let points = [at(0, 10), at(6, 11), at(12, 14)];
///
/// assert_eq!(resolve_sequence_point(&points, 8).map(|sp| sp.start_line), Some(11));
/// assert_eq!(resolve_sequence_point(&points, 100).map(|sp| sp.start_line), Some(14));
/// ```
#[must_use]
pub fn resolve_sequence_point(points: &[SequencePoint], il_offset: u32) -> Option<SequencePoint> {
    if points.windows(2).all(|pair| pair[0].il_offset <= pair[1].il_offset) {
        return scan(points, il_offset);
    }

    let mut sorted = points.to_vec();
    sorted.sort_by_key(|point| point.il_offset);
    scan(&sorted, il_offset)
}

fn scan(points: &[SequencePoint], il_offset: u32) -> Option<SequencePoint> {
    let mut best = None;
    for point in points {
        if point.il_offset > il_offset {
            break;
        }

        if !point.is_hidden() {
            best = Some(*point);
        }
    }

    best
}
