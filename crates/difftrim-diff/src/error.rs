use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    #[error("Failed to load encoding {name}: {message}")]
    Load { name: String, message: String },

    #[error("chars_per_token must be a positive number, got {0}")]
    InvalidRatio(f64),
}

pub type TokenizerResult<T> = Result<T, TokenizerError>;
