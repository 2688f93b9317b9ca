use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("input path does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("output directory already exists: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("malformed record {line:?}: {reason}")]
    MalformedRecord { line: String, reason: &'static str },

    #[error("corpus size must be positive, got {0}")]
    InvalidCorpusSize(u64),

    #[error("division by zero: word {word:?} has no documents")]
    DivisionByZero { word: String },

    #[error("query must contain at least one word")]
    EmptyQuery,

    #[error(transparent)]
    Meta(#[from] serde_json::Error),

    #[error("stage {stage} failed")]
    StageFailed {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn malformed(line: &str, reason: &'static str) -> Self {
        Error::MalformedRecord { line: line.to_string(), reason }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
