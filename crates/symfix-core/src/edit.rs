//! Range-based text patching with format preservation

use thiserror::Error;

use crate::text::TextRange;

/// Errors that can occur during edit application
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Overlapping edits detected at offset {0}")]
    OverlappingEdits(usize),

    #[error("Edit range {start}..{end} out of bounds for source length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },
}

/// Replace one byte range of a text with new text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// The source range to replace
    pub range: TextRange,
    /// The replacement text
    pub replacement: String,
}

impl Edit {
    pub fn new(range: TextRange, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    /// An edit that removes its range
    pub fn delete(range: TextRange) -> Self {
        Self::new(range, "")
    }

    /// Get the byte offset where this edit starts
    pub fn start_offset(&self) -> usize {
        self.range.start_offset()
    }

    /// Get the byte offset where this edit ends
    pub fn end_offset(&self) -> usize {
        self.range.end_offset()
    }
}

/// Apply edits to source text, leaving every byte outside the edits untouched
///
/// Edits are applied in reverse order (from end to start) to maintain
/// valid offsets throughout the process. Two empty-range insertions at the
/// same offset are not allowed either.
pub fn apply_edits(source: &str, edits: &[Edit]) -> Result<String, EditError> {
    if edits.is_empty() {
        return Ok(source.to_string());
    }

    // Sort edits by start position (descending) for safe replacement
    let mut sorted_edits: Vec<&Edit> = edits.iter().collect();
    sorted_edits.sort_by(|a, b| {
        b.start_offset()
            .cmp(&a.start_offset())
            .then(b.end_offset().cmp(&a.end_offset()))
    });

    // Validate: check for overlapping edits and bounds
    let source_len = source.len();
    let mut prev_start: Option<usize> = None;

    for edit in &sorted_edits {
        let start = edit.start_offset();
        let end = edit.end_offset();

        if end > source_len || start > end {
            return Err(EditError::RangeOutOfBounds {
                start,
                end,
                len: source_len,
            });
        }

        if let Some(prev) = prev_start {
            if end > prev || (start == prev && end == prev) {
                return Err(EditError::OverlappingEdits(start));
            }
        }

        prev_start = Some(start);
    }

    let mut result = source.to_string();
    for edit in sorted_edits {
        result.replace_range(edit.start_offset()..edit.end_offset(), &edit.replacement);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(start, end)
    }

    #[test]
    fn test_simple_replacement() {
        let source = "$r->setStatusCode(200);";
        let edit = Edit::new(range(18, 21), "Response::HTTP_OK");

        let result = apply_edits(source, &[edit]).unwrap();
        assert_eq!(result, "$r->setStatusCode(Response::HTTP_OK);");
    }

    #[test]
    fn test_multiple_edits() {
        let source = "f(200); g(404);";
        let edits = vec![
            Edit::new(range(2, 5), "OK"),
            Edit::new(range(10, 13), "NOT_FOUND"),
        ];

        let result = apply_edits(source, &edits).unwrap();
        assert_eq!(result, "f(OK); g(NOT_FOUND);");
    }

    #[test]
    fn test_empty_edits() {
        let source = "unchanged";
        let result = apply_edits(source, &[]).unwrap();
        assert_eq!(result, "unchanged");
    }

    #[test]
    fn test_adjacent_edits_allowed() {
        let source = "abcdef";
        let edits = vec![Edit::new(range(0, 3), "X"), Edit::new(range(3, 6), "Y")];
        assert_eq!(apply_edits(source, &edits).unwrap(), "XY");
    }

    #[test]
    fn test_overlapping_edits() {
        let source = "abcdef";
        let edits = vec![Edit::new(range(0, 4), "X"), Edit::new(range(3, 6), "Y")];
        assert_eq!(
            apply_edits(source, &edits),
            Err(EditError::OverlappingEdits(0))
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let source = "short";
        let edit = Edit::new(range(0, 100), "replacement");

        let result = apply_edits(source, &[edit]);
        assert!(matches!(result, Err(EditError::RangeOutOfBounds { .. })));
    }

    #[test]
    fn test_delete() {
        let source = "f($a, $b);";
        let result = apply_edits(source, &[Edit::delete(range(4, 8))]).unwrap();
        assert_eq!(result, "f($a);");
    }
}
