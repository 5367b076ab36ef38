//! Column-aligned rendering of reads described by `=`/`X`/`I`/`D` edit scripts.
//!
//! Rendering happens in two phases. [`widths::WidthScanner`] walks every read
//! and records, per reference position, the widest insertion any read places
//! there. [`render::Renderer`] then lays out the reference and each read
//! against that frozen table so insertion columns line up across all rows.

pub mod cli;
pub mod edit_script;
pub mod error;
pub mod input;
pub mod pileup;
pub mod render;
pub mod score;
pub mod widths;

pub use edit_script::{EditOp, EditScript, EditScriptError};
pub use error::{Error, ReadError, Result};
pub use input::{parse_input, read_input, Alignment, InputError};
pub use pileup::{scan_widths, Pileup, PileupOptions, ReadRecord, RenderedLine};
pub use render::{Renderer, Symbols};
pub use widths::{InsertionWidths, WidthScanner};
