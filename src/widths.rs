//! Per-position insertion widths shared by every rendered row
//!
//! Phase one folds each read into a [`WidthScanner`]. Scanners built on
//! different workers are combined with [`WidthScanner::merge`], and
//! [`WidthScanner::finish`] freezes the result into [`InsertionWidths`],
//! which the renderer only reads.

use serde::Serialize;

use crate::edit_script::{EditOp, EditScript};
use crate::error::ReadError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidthScanner {
    widths: Vec<usize>,
}

impl WidthScanner {
    pub fn new(reference_len: usize) -> Self {
        WidthScanner { widths: vec![0; reference_len] }
    }

    /// Record the insertions of one read starting at `offset`.
    ///
    /// Insertions that follow each other without a reference-consuming run in
    /// between occupy the same column, so their lengths are summed before the
    /// maximum is taken.
    pub fn scan(&mut self, offset: usize, script: &EditScript<'_>) -> Result<(), ReadError> {
        let reference_len = self.widths.len();
        if offset > reference_len {
            return Err(ReadError::ReferenceOverrun {
                offset,
                position: offset,
                reference_len,
            });
        }

        let mut cursor = offset;
        let mut group = 0;
        for op in script.ops() {
            let op = op?;
            match op {
                EditOp::Insertion(bases) => {
                    if cursor >= reference_len {
                        return Err(ReadError::ReferenceOverrun {
                            offset,
                            position: cursor,
                            reference_len,
                        });
                    }
                    group += bases.len();
                    let width = &mut self.widths[cursor];
                    *width = (*width).max(group);
                }
                EditOp::Match(n) | EditOp::Deletion(n) => {
                    cursor = advance(offset, cursor, n, reference_len)?;
                    if n > 0 {
                        group = 0;
                    }
                }
                EditOp::Mismatch(bases) => {
                    let n = bases.len();
                    cursor = advance(offset, cursor, n, reference_len)?;
                    if n > 0 {
                        group = 0;
                    }
                }
            }
        }
        Ok(())
    }

    /// Pointwise maximum of two scanners over the same reference
    pub fn merge(mut self, other: WidthScanner) -> WidthScanner {
        debug_assert_eq!(self.widths.len(), other.widths.len());
        for (mine, theirs) in self.widths.iter_mut().zip(other.widths) {
            *mine = (*mine).max(theirs);
        }
        self
    }

    pub fn finish(self) -> InsertionWidths {
        InsertionWidths { widths: self.widths }
    }
}

fn advance(
    offset: usize,
    cursor: usize,
    n: usize,
    reference_len: usize,
) -> Result<usize, ReadError> {
    let end = cursor + n;
    if end > reference_len {
        return Err(ReadError::ReferenceOverrun {
            offset,
            position: end - 1,
            reference_len,
        });
    }
    Ok(end)
}

/// Frozen insertion-width table, one slot per reference base.
/// Slot `p` is the widest insertion any read places between `p - 1` and `p`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InsertionWidths {
    widths: Vec<usize>,
}

impl InsertionWidths {
    pub fn get(&self, pos: usize) -> usize {
        self.widths.get(pos).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Total width of the insertion columns before `offset`
    pub fn prefix_width(&self, offset: usize) -> usize {
        self.widths[..offset.min(self.widths.len())].iter().sum()
    }

    pub fn total(&self) -> usize {
        self.widths.iter().sum()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.widths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit_script::EditScriptError;

    fn scan_all(
        reference_len: usize,
        reads: &[(usize, &str)],
    ) -> Result<InsertionWidths, ReadError> {
        let mut scanner = WidthScanner::new(reference_len);
        for &(offset, script) in reads {
            scanner.scan(offset, &EditScript::new(script))?;
        }
        Ok(scanner.finish())
    }

    #[test]
    fn test_empty_table_is_all_zero() {
        let widths = WidthScanner::new(5).finish();
        assert_eq!(widths.as_slice(), &[0, 0, 0, 0, 0]);
        assert_eq!(widths.total(), 0);
    }

    #[test]
    fn test_widest_insertion_wins() {
        let widths = scan_all(2, &[(0, "1=2IGG1="), (0, "1=1IT1=")]).unwrap();
        assert_eq!(widths.as_slice(), &[0, 2]);
    }

    #[test]
    fn test_insertion_is_recorded_at_cursor_after_offset() {
        let widths = scan_all(10, &[(3, "2=1XA3ITTT1D1=")]).unwrap();
        assert_eq!(widths.get(6), 3);
        assert_eq!(widths.total(), 3);
    }

    #[test]
    fn test_adjacent_insertions_accumulate() {
        let widths = scan_all(4, &[(0, "2=1IA2ICC2=")]).unwrap();
        assert_eq!(widths.get(2), 3);
    }

    #[test]
    fn test_zero_length_run_keeps_insertion_group_open() {
        let widths = scan_all(4, &[(0, "2=1IA0=1IC2=")]).unwrap();
        assert_eq!(widths.get(2), 2);
    }

    #[test]
    fn test_scan_is_idempotent_and_order_independent() {
        let reads = [(0, "1=3IAAA3="), (1, "1=1IC2="), (2, "2IGG2=")];
        let once = scan_all(4, &reads).unwrap();

        let mut twice_reads = reads.to_vec();
        twice_reads.extend_from_slice(&reads);
        assert_eq!(scan_all(4, &twice_reads).unwrap(), once);

        let mut reversed = reads.to_vec();
        reversed.reverse();
        assert_eq!(scan_all(4, &reversed).unwrap(), once);
    }

    #[test]
    fn test_merge_takes_pointwise_max() {
        let mut left = WidthScanner::new(3);
        left.scan(0, &EditScript::new("1=2IAA2=")).unwrap();
        let mut right = WidthScanner::new(3);
        right.scan(0, &EditScript::new("2=1IA1=")).unwrap();
        right.scan(0, &EditScript::new("1=1IA2=")).unwrap();

        let merged = left.merge(right).finish();
        assert_eq!(merged.as_slice(), &[0, 2, 1]);
    }

    #[test]
    fn test_prefix_width() {
        let widths = scan_all(5, &[(0, "1=2IAA2=3ICCC2=")]).unwrap();
        assert_eq!(widths.as_slice(), &[0, 2, 0, 3, 0]);
        assert_eq!(widths.prefix_width(0), 0);
        assert_eq!(widths.prefix_width(2), 2);
        assert_eq!(widths.prefix_width(4), 5);
        assert_eq!(widths.prefix_width(5), 5);
    }

    #[test]
    fn test_run_past_reference_end_is_rejected() {
        let err = scan_all(4, &[(2, "3=")]).unwrap_err();
        assert_eq!(
            err,
            ReadError::ReferenceOverrun {
                offset: 2,
                position: 4,
                reference_len: 4,
            }
        );
    }

    #[test]
    fn test_offset_past_reference_end_is_rejected() {
        let err = scan_all(4, &[(5, "")]).unwrap_err();
        assert!(matches!(err, ReadError::ReferenceOverrun { position: 5, .. }));
    }

    #[test]
    fn test_trailing_insertion_has_no_slot() {
        let err = scan_all(4, &[(0, "4=1IA")]).unwrap_err();
        assert!(matches!(err, ReadError::ReferenceOverrun { position: 4, .. }));
    }

    #[test]
    fn test_read_ending_at_reference_end_is_fine() {
        let widths = scan_all(4, &[(1, "3="), (4, "")]).unwrap();
        assert_eq!(widths.total(), 0);
    }

    #[test]
    fn test_parse_errors_propagate() {
        let err = scan_all(4, &[(0, "3Z")]).unwrap_err();
        assert!(matches!(
            err,
            ReadError::EditScript(EditScriptError::UnknownOperator { column: 2, .. })
        ));
    }
}
