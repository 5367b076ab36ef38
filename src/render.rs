//! Column renderer: lays one read out against the frozen insertion widths

use crate::edit_script::{EditOp, EditScript};
use crate::error::ReadError;
use crate::widths::InsertionWidths;

/// Characters used for the non-base cells of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbols {
    /// Before the read starts
    pub blank: u8,
    /// Deleted bases and insertion columns this read spans without inserting
    pub gap: u8,
    /// Pads a short insertion up to the column width
    pub filler: u8,
}

impl Default for Symbols {
    fn default() -> Self {
        Symbols {
            blank: b' ',
            gap: b'-',
            filler: b'=',
        }
    }
}

pub struct Renderer<'a> {
    reference: &'a [u8],
    widths: &'a InsertionWidths,
    symbols: Symbols,
}

impl<'a> Renderer<'a> {
    pub fn new(reference: &'a [u8], widths: &'a InsertionWidths) -> Self {
        Renderer {
            reference,
            widths,
            symbols: Symbols::default(),
        }
    }

    pub fn with_symbols(mut self, symbols: Symbols) -> Self {
        self.symbols = symbols;
        self
    }

    /// The reference row, i.e. `L=` from offset 0
    pub fn render_reference(&self) -> Result<String, ReadError> {
        let script = format!("{}=", self.reference.len());
        self.render(0, &EditScript::new(&script))
    }

    pub fn render(&self, offset: usize, script: &EditScript<'_>) -> Result<String, ReadError> {
        if offset > self.reference.len() {
            return Err(self.overrun(offset, offset));
        }

        let mut row = Vec::new();
        push_n(&mut row, self.symbols.blank, offset + self.widths.prefix_width(offset));

        let mut cursor = offset;
        // Bases this read has already put into the insertion column at `cursor`
        let mut inserted: Option<usize> = None;
        for op in script.ops() {
            match op? {
                EditOp::Match(n) => {
                    for _ in 0..n {
                        self.enter_column(&mut row, offset, cursor, &mut inserted)?;
                        row.push(self.reference[cursor]);
                        cursor += 1;
                    }
                }
                EditOp::Mismatch(bases) => {
                    for &base in bases {
                        self.enter_column(&mut row, offset, cursor, &mut inserted)?;
                        row.push(base);
                        cursor += 1;
                    }
                }
                EditOp::Insertion(bases) => {
                    if cursor >= self.reference.len() {
                        return Err(self.overrun(offset, cursor));
                    }
                    row.extend_from_slice(bases);
                    inserted = Some(inserted.unwrap_or(0) + bases.len());
                }
                EditOp::Deletion(n) => {
                    for _ in 0..n {
                        self.enter_column(&mut row, offset, cursor, &mut inserted)?;
                        row.push(self.symbols.gap);
                        cursor += 1;
                    }
                }
            }
        }
        if let Some(placed) = inserted {
            self.pad_insertion(&mut row, cursor, placed);
        }

        Ok(String::from_utf8_lossy(&row).into_owned())
    }

    /// Emit the insertion column sitting before reference position `cursor`.
    /// If this read inserted there, only the filler is missing, otherwise the
    /// whole column is a gap.
    fn enter_column(
        &self,
        row: &mut Vec<u8>,
        offset: usize,
        cursor: usize,
        inserted: &mut Option<usize>,
    ) -> Result<(), ReadError> {
        if cursor >= self.reference.len() {
            return Err(self.overrun(offset, cursor));
        }
        match inserted.take() {
            Some(placed) => self.pad_insertion(row, cursor, placed),
            None => push_n(row, self.symbols.gap, self.widths.get(cursor)),
        }
        Ok(())
    }

    fn pad_insertion(&self, row: &mut Vec<u8>, cursor: usize, placed: usize) {
        push_n(row, self.symbols.filler, self.widths.get(cursor).saturating_sub(placed));
    }

    fn overrun(&self, offset: usize, position: usize) -> ReadError {
        ReadError::ReferenceOverrun {
            offset,
            position,
            reference_len: self.reference.len(),
        }
    }
}

fn push_n(row: &mut Vec<u8>, symbol: u8, n: usize) {
    row.extend(std::iter::repeat(symbol).take(n));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit_script::EditScriptError;
    use crate::widths::WidthScanner;

    fn widths_for(reference: &str, reads: &[(usize, &str)]) -> InsertionWidths {
        let mut scanner = WidthScanner::new(reference.len());
        for &(offset, script) in reads {
            scanner.scan(offset, &EditScript::new(script)).unwrap();
        }
        scanner.finish()
    }

    fn render_all(reference: &str, reads: &[(usize, &str)]) -> Vec<String> {
        let widths = widths_for(reference, reads);
        let renderer = Renderer::new(reference.as_bytes(), &widths);
        let mut rows = vec![renderer.render_reference().unwrap()];
        for &(offset, script) in reads {
            rows.push(renderer.render(offset, &EditScript::new(script)).unwrap());
        }
        rows
    }

    #[test]
    fn test_identity_read_matches_reference() {
        let rows = render_all("ACGT", &[(0, "4=")]);
        assert_eq!(rows, vec!["ACGT", "ACGT"]);
    }

    #[test]
    fn test_short_insertion_is_padded_with_filler() {
        let rows = render_all("AC", &[(0, "1=2IGG1="), (0, "1=1IT1=")]);
        assert_eq!(rows[0], "A--C");
        assert_eq!(rows[1], "AGGC");
        assert_eq!(rows[2], "AT=C");
    }

    #[test]
    fn test_offset_skips_earlier_insertion_columns() {
        let rows = render_all("ACGTAC", &[(0, "2=3IGGG4="), (3, "3=")]);
        assert_eq!(rows[0], "AC---GTAC");
        assert_eq!(rows[1], "ACGGGGTAC");
        assert_eq!(rows[2], "      TAC");
    }

    #[test]
    fn test_mismatch_and_deletion() {
        let rows = render_all("ACGTACGT", &[(1, "2=1XA2D2=")]);
        assert_eq!(rows[0], "ACGTACGT");
        assert_eq!(rows[1], " CGA--GT");
    }

    #[test]
    fn test_deletion_spans_insertion_column_as_gap() {
        let rows = render_all("ACGT", &[(0, "2=2ICC2="), (0, "1=2D1=")]);
        assert_eq!(rows[0], "AC--GT");
        assert_eq!(rows[1], "ACCCGT");
        assert_eq!(rows[2], "A----T");
    }

    #[test]
    fn test_insertion_followed_by_deletion_only_pads_once() {
        let rows = render_all("ACGT", &[(0, "1=3IAAA3="), (0, "1=1IC2D1=")]);
        assert_eq!(rows[0], "A---CGT");
        assert_eq!(rows[1], "AAAACGT");
        assert_eq!(rows[2], "AC==--T");
    }

    #[test]
    fn test_deletion_after_insertion_clears_padding_flag() {
        // The gap column at position 2 still belongs to read 0 after its deletion
        let rows = render_all("ACGT", &[(0, "1=1IC1D2="), (0, "2=2ITT2=")]);
        assert_eq!(rows[0], "A-C--GT");
        assert_eq!(rows[1], "AC---GT");
        assert_eq!(rows[2], "A-CTTGT");
    }

    #[test]
    fn test_insertion_followed_by_mismatch() {
        let rows = render_all("ACGT", &[(0, "2=2ITT2="), (0, "2=1IG1XA1=")]);
        assert_eq!(rows[2], "ACG=AT");
    }

    #[test]
    fn test_adjacent_insertions_share_one_column() {
        let rows = render_all("ACGT", &[(0, "2=1IA2ICC2="), (0, "2=2IGG2=")]);
        assert_eq!(rows[0], "AC---GT");
        assert_eq!(rows[1], "ACACCGT");
        assert_eq!(rows[2], "ACGG=GT");
    }

    #[test]
    fn test_trailing_insertion_is_padded_at_end() {
        let rows = render_all("ACGT", &[(0, "2=3IAAA2="), (0, "2=1IC")]);
        assert_eq!(rows[2], "ACC==");
    }

    #[test]
    fn test_read_ending_before_insertion_column() {
        let rows = render_all("ACGT", &[(0, "2=3IAAA2="), (0, "2=")]);
        assert_eq!(rows[2], "AC");
    }

    #[test]
    fn test_all_rows_share_column_boundaries() {
        let reads = [(0, "1=2IAA3="), (1, "1=1XT1IG1="), (2, "1IC1D1="), (0, "4=")];
        let rows = render_all("ACGT", &reads);
        let widths = widths_for("ACGT", &reads);
        assert_eq!(rows[0].len(), 4 + widths.total());
        // Last base of each full-length row lands in the same column
        assert_eq!(rows[0].chars().last(), Some('T'));
        assert_eq!(rows[1].len(), rows[0].len());
        assert_eq!(rows[4].len(), rows[0].len());
    }

    #[test]
    fn test_custom_symbols() {
        let reference = "AC";
        let reads = [(0, "1=2IGG1="), (0, "1=1IT1="), (1, "1D")];
        let widths = widths_for(reference, &reads);
        let renderer = Renderer::new(reference.as_bytes(), &widths).with_symbols(Symbols {
            blank: b'.',
            gap: b'*',
            filler: b'+',
        });
        assert_eq!(renderer.render_reference().unwrap(), "A**C");
        assert_eq!(renderer.render(0, &EditScript::new("1=1IT1=")).unwrap(), "AT+C");
        assert_eq!(renderer.render(1, &EditScript::new("1D")).unwrap(), ".***");
    }

    #[test]
    fn test_empty_reference_renders_empty_row() {
        let widths = WidthScanner::new(0).finish();
        let renderer = Renderer::new(b"", &widths);
        assert_eq!(renderer.render_reference().unwrap(), "");
    }

    #[test]
    fn test_render_reports_parse_errors() {
        let widths = WidthScanner::new(4).finish();
        let renderer = Renderer::new(b"ACGT", &widths);
        let err = renderer.render(0, &EditScript::new("abc")).unwrap_err();
        assert!(matches!(
            err,
            ReadError::EditScript(EditScriptError::MalformedLength { column: 1, .. })
        ));
    }

    #[test]
    fn test_render_reports_overrun() {
        let widths = WidthScanner::new(4).finish();
        let renderer = Renderer::new(b"ACGT", &widths);
        let err = renderer.render(2, &EditScript::new("3=")).unwrap_err();
        assert!(matches!(err, ReadError::ReferenceOverrun { position: 4, .. }));
    }
}
