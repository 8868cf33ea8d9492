use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("Failed to start summarizer {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Summarizer timed out after {0}s")]
    Timeout(u64),

    #[error("Summarizer failed with exit code {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("Summarizer returned an empty summary")]
    Empty,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SummarizeResult<T> = Result<T, SummarizeError>;
