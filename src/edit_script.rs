//! Tokenizer for `=`/`X`/`I`/`D` edit scripts with embedded bases
//!
//! Scripts are `<length><op>` pairs with no separators. `X` and `I` are
//! followed by exactly `length` literal bases, `=` and `D` take their bases
//! from the reference.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditScriptError {
    #[error("malformed length at col {column}\nCIGAR = {script}")]
    MalformedLength { column: usize, script: String },

    #[error("unknown operator '{operator}' at col {column}\nCIGAR = {script}")]
    UnknownOperator {
        column: usize,
        operator: char,
        script: String,
    },

    #[error("missing operator after length at col {column}\nCIGAR = {script}")]
    MissingOperator { column: usize, script: String },

    #[error(
        "operator at col {column} carries {expected} bases \
         but only {available} remain\nCIGAR = {script}"
    )]
    TruncatedPayload {
        column: usize,
        expected: usize,
        available: usize,
        script: String,
    },

    #[error("non-ASCII base at col {column}\nCIGAR = {script}")]
    NonAsciiPayload { column: usize, script: String },
}

impl EditScriptError {
    /// 1-based byte column where parsing stopped
    pub fn column(&self) -> usize {
        match self {
            EditScriptError::MalformedLength { column, .. }
            | EditScriptError::UnknownOperator { column, .. }
            | EditScriptError::MissingOperator { column, .. }
            | EditScriptError::TruncatedPayload { column, .. }
            | EditScriptError::NonAsciiPayload { column, .. } => *column,
        }
    }
}

/// One run of an edit script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp<'a> {
    /// Reference bases copied through
    Match(usize),
    /// Substituted bases, one per reference position
    Mismatch(&'a [u8]),
    /// Bases present in the read only
    Insertion(&'a [u8]),
    /// Reference bases missing from the read
    Deletion(usize),
}

impl EditOp<'_> {
    pub fn len(&self) -> usize {
        match self {
            EditOp::Match(n) | EditOp::Deletion(n) => *n,
            EditOp::Mismatch(bases) | EditOp::Insertion(bases) => bases.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the run advances the reference cursor
    pub fn consumes_reference(&self) -> bool {
        !matches!(self, EditOp::Insertion(_))
    }
}

/// Borrowed view of an encoded edit script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditScript<'a> {
    text: &'a str,
}

impl<'a> EditScript<'a> {
    pub fn new(text: &'a str) -> Self {
        EditScript { text }
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Lazily decode runs left to right. The iterator stops after the first error.
    pub fn ops(&self) -> Ops<'a> {
        Ops {
            text: self.text,
            pos: 0,
            failed: false,
        }
    }

    /// Number of reference bases covered by `=`, `X` and `D` runs
    pub fn reference_span(&self) -> Result<usize, EditScriptError> {
        self.ops().try_fold(0usize, |span, op| {
            let op = op?;
            Ok(if op.consumes_reference() { span + op.len() } else { span })
        })
    }
}

/// Iterator over the runs of an [`EditScript`]
#[derive(Debug, Clone)]
pub struct Ops<'a> {
    text: &'a str,
    pos: usize,
    failed: bool,
}

impl<'a> Ops<'a> {
    fn error_script(&self) -> String {
        self.text.to_string()
    }

    fn next_op(&mut self) -> Result<EditOp<'a>, EditScriptError> {
        let bytes = self.text.as_bytes();
        let start = self.pos;

        let digits = bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 {
            return Err(EditScriptError::MalformedLength {
                column: start + 1,
                script: self.error_script(),
            });
        }
        let len: usize = self.text[start..start + digits].parse().map_err(|_| {
            EditScriptError::MalformedLength {
                column: start + 1,
                script: self.error_script(),
            }
        })?;

        let op_pos = start + digits;
        let Some(&op) = bytes.get(op_pos) else {
            return Err(EditScriptError::MissingOperator {
                column: op_pos + 1,
                script: self.error_script(),
            });
        };
        self.pos = op_pos + 1;

        match op {
            b'=' => Ok(EditOp::Match(len)),
            b'D' => Ok(EditOp::Deletion(len)),
            b'X' | b'I' => {
                let available = bytes.len() - self.pos;
                if available < len {
                    return Err(EditScriptError::TruncatedPayload {
                        column: op_pos + 1,
                        expected: len,
                        available,
                        script: self.error_script(),
                    });
                }
                let bases = &bytes[self.pos..self.pos + len];
                // One byte per column
                if let Some(bad) = bases.iter().position(|b| !b.is_ascii()) {
                    return Err(EditScriptError::NonAsciiPayload {
                        column: self.pos + bad + 1,
                        script: self.error_script(),
                    });
                }
                self.pos += len;
                if op == b'X' {
                    Ok(EditOp::Mismatch(bases))
                } else {
                    Ok(EditOp::Insertion(bases))
                }
            }
            _ => Err(EditScriptError::UnknownOperator {
                column: op_pos + 1,
                operator: self.text[op_pos..].chars().next().unwrap_or(op as char),
                script: self.error_script(),
            }),
        }
    }
}

impl<'a> Iterator for Ops<'a> {
    type Item = Result<EditOp<'a>, EditScriptError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.text.len() {
            return None;
        }
        let item = self.next_op();
        if item.is_err() {
            self.failed = true;
        }
        Some(item)
    }
}
