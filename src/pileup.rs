//! Two-phase pileup: scan every read for insertion widths, then render the
//! reference and each read against the frozen table.

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::edit_script::EditScript;
use crate::error::{Error, Result};
use crate::render::{Renderer, Symbols};
use crate::widths::{InsertionWidths, WidthScanner};

/// One input read: where it starts on the reference and how it aligns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRecord {
    /// Passed through to the output untouched
    pub orientation: String,
    pub offset: usize,
    pub edit_script: String,
}

impl ReadRecord {
    pub fn new(
        orientation: impl Into<String>,
        offset: usize,
        edit_script: impl Into<String>,
    ) -> Self {
        ReadRecord {
            orientation: orientation.into(),
            offset,
            edit_script: edit_script.into(),
        }
    }

    pub fn script(&self) -> EditScript<'_> {
        EditScript::new(&self.edit_script)
    }
}

/// A display row. The reference row has no index or orientation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    pub text: String,
}

impl fmt::Display for RenderedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            None => write!(f, "REF  : {}", self.text),
            Some(index) => write!(
                f,
                "{:3} {}: {}",
                index,
                self.orientation.as_deref().unwrap_or(" "),
                self.text
            ),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PileupOptions {
    /// Worker threads for both phases, 0 lets rayon decide
    pub threads: usize,
    pub symbols: Symbols,
}

impl Default for PileupOptions {
    fn default() -> Self {
        PileupOptions {
            threads: 1,
            symbols: Symbols::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Pileup {
    pub reference: RenderedLine,
    pub reads: Vec<RenderedLine>,
    pub widths: InsertionWidths,
}

impl Pileup {
    /// Build every row. Nothing is returned unless all reads are valid.
    pub fn build(reference: &str, reads: &[ReadRecord], options: &PileupOptions) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.threads)
            .build()?;

        pool.install(|| {
            let widths = scan_widths(reference.len(), reads)?;
            log::info!(
                "Scanned {} reads, {} insertion columns add {} bases of width",
                reads.len(),
                widths.as_slice().iter().filter(|&&w| w > 0).count(),
                widths.total()
            );

            let renderer =
                Renderer::new(reference.as_bytes(), &widths).with_symbols(options.symbols);
            let reference_row = RenderedLine {
                index: None,
                orientation: None,
                text: renderer.render_reference().map_err(Error::Reference)?,
            };

            let rows = reads
                .par_iter()
                .enumerate()
                .map(|(index, read)| {
                    let text = renderer
                        .render(read.offset, &read.script())
                        .map_err(|source| Error::Read { index, source })?;
                    Ok(RenderedLine {
                        index: Some(index),
                        orientation: Some(read.orientation.clone()),
                        text,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            log::debug!("Rendered {} rows", rows.len() + 1);

            Ok(Pileup {
                reference: reference_row,
                reads: rows,
                widths,
            })
        })
    }

    /// Reference row first, then reads in input order
    pub fn lines(&self) -> impl Iterator<Item = &RenderedLine> {
        std::iter::once(&self.reference).chain(self.reads.iter())
    }
}

/// Phase one. Each worker folds its share of reads into a private scanner,
/// and the partial tables are merged by pointwise maximum.
pub fn scan_widths(reference_len: usize, reads: &[ReadRecord]) -> Result<InsertionWidths> {
    reads
        .par_iter()
        .enumerate()
        .try_fold(
            || WidthScanner::new(reference_len),
            |mut scanner, (index, read)| {
                scanner
                    .scan(read.offset, &read.script())
                    .map_err(|source| Error::Read { index, source })?;
                Ok(scanner)
            },
        )
        .try_reduce(|| WidthScanner::new(reference_len), |a, b| Ok(a.merge(b)))
        .map(WidthScanner::finish)
}
