//! Type definitions for diff budgeting

use serde::Serialize;

/// Semantic category of a changed file, used to decide what is expendable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Logic,
    Config,
    Docs,
    Lock,
    Unknown,
    Ignored,
}

impl FileCategory {
    /// Sort priority, most important first
    pub fn priority(self) -> u8 {
        match self {
            FileCategory::Logic => 1,
            FileCategory::Config => 2,
            FileCategory::Docs => 3,
            FileCategory::Unknown => 4,
            FileCategory::Lock => 5,
            FileCategory::Ignored => 6,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FileCategory::Logic => "logic",
            FileCategory::Config => "config",
            FileCategory::Docs => "docs",
            FileCategory::Lock => "lock",
            FileCategory::Unknown => "unknown",
            FileCategory::Ignored => "ignored",
        }
    }
}

/// Categories sacrificed wholesale when over budget, first victim first.
/// `Logic` is absent: it is only ever cut proportionally.
pub const SACRIFICE_ORDER: [FileCategory; 5] = [
    FileCategory::Ignored,
    FileCategory::Lock,
    FileCategory::Unknown,
    FileCategory::Docs,
    FileCategory::Config,
];

/// The diff block for one changed file
#[derive(Debug, Clone)]
pub struct DiffChunk {
    pub filename: String,
    pub content: String,
    pub token_count: usize,
    pub category: FileCategory,
}

/// What happened to a chunk during reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkOutcome {
    /// Content untouched
    Kept,
    /// Replaced by a summary marker
    Summarized,
    /// Replaced by a truncation marker; no summarizer was configured
    Truncated,
    /// Replaced by a truncation marker after the summarizer failed
    SummaryFailed,
    /// A replacement was attempted but was not smaller than the original
    Skipped,
    /// Cut to a proportional share of the budget
    Budgeted,
}

/// Per-chunk entry of a [`Reduction`]
#[derive(Debug, Clone, Serialize)]
pub struct ChunkReport {
    pub filename: String,
    pub category: FileCategory,
    pub original_tokens: usize,
    pub final_tokens: usize,
    pub outcome: ChunkOutcome,
}

/// Result of fitting a diff into a token budget
#[derive(Debug, Clone, Serialize)]
pub struct Reduction {
    pub text: String,
    pub was_reduced: bool,
    pub token_limit: usize,
    pub original_tokens: usize,
    pub final_tokens: usize,
    pub chunks: Vec<ChunkReport>,
}
