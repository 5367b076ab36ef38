//! Line-oriented pileup input
//!
//! The first line is the reference. Every following line is
//! `<orientation> <offset> <edit-script>`, and a line whose first field is
//! `=` ends the read list.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pileup::ReadRecord;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot read input file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("input has no reference line")]
    MissingReference,

    #[error("line {line}: missing {field} field")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line}: invalid offset '{value}'")]
    InvalidOffset { line: usize, value: String },
}

/// Reference plus the reads aligned to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub reference: String,
    pub reads: Vec<ReadRecord>,
}

pub const SENTINEL: &str = "=";

pub fn read_input(path: &Path) -> Result<Alignment, InputError> {
    let text = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_input(&text)
}

pub fn parse_input(text: &str) -> Result<Alignment, InputError> {
    let mut lines = text.lines().enumerate();
    let reference = match lines.next() {
        Some((_, line)) => line.trim().to_string(),
        None => return Err(InputError::MissingReference),
    };

    let mut reads = Vec::new();
    for (idx, line) in lines {
        let line_no = idx + 1;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split(' ');
        let orientation = fields.next().unwrap_or_default();
        if orientation == SENTINEL {
            break;
        }
        let offset_field = fields.next().ok_or(InputError::MissingField {
            line: line_no,
            field: "offset",
        })?;
        let offset = offset_field.parse().map_err(|_| InputError::InvalidOffset {
            line: line_no,
            value: offset_field.to_string(),
        })?;
        let edit_script = fields.next().ok_or(InputError::MissingField {
            line: line_no,
            field: "edit script",
        })?;

        reads.push(ReadRecord {
            orientation: orientation.to_string(),
            offset,
            edit_script: edit_script.to_string(),
        });
    }

    log::debug!("parsed reference of {} bases and {} reads", reference.len(), reads.len());
    Ok(Alignment { reference, reads })
}
