use thiserror::Error;

use crate::edit_script::EditScriptError;
use crate::input::InputError;
use crate::score::ScoreError;

/// Failure while walking one read's edit script against the reference
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error(transparent)]
    EditScript(#[from] EditScriptError),

    #[error(
        "read at offset {offset} needs reference position {position} \
         but the reference has {reference_len} bases"
    )]
    ReferenceOverrun {
        offset: usize,
        position: usize,
        reference_len: usize,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("read {index}: {source}")]
    Read {
        index: usize,
        #[source]
        source: ReadError,
    },

    #[error("reference: {0}")]
    Reference(#[source] ReadError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
