//! Git diff budgeting for LLM context
//!
//! This crate fits a multi-file git diff into a fixed token budget. Lock
//! files, docs and other expendable files are summarized or dropped first;
//! source files are only ever cut proportionally, so every changed file
//! keeps a share of the budget.
//!
//! ```ignore
//! let processor = DiffProcessor::new(Tiktoken::new("cl100k_base")?);
//! let (text, was_reduced) = processor.process_diff(&diff, 4000);
//! ```

mod classify;
mod error;
mod processor;
mod summarizer;
mod tokens;
mod types;

pub use classify::{categorize_file, sort_files};
pub use error::{TokenizerError, TokenizerResult};
pub use processor::{
    extract_filename, DiffProcessor, DIFF_HEADER, REMAINING_TRUNCATED_MARKER, TRUNCATED_MARKER,
};
pub use summarizer::Summarizer;
pub use tokens::{build_tokenizer, HeuristicTokenizer, Tiktoken, Tokenizer, HEURISTIC_ENCODING};
pub use types::{ChunkOutcome, ChunkReport, DiffChunk, FileCategory, Reduction, SACRIFICE_ORDER};
