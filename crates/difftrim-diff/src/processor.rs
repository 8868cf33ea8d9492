//! Core diff budgeting logic
//!
//! A diff over budget is reduced in three phases:
//!
//! 1. **Categorical sacrifice**: non-logic files are replaced by a summary
//!    (or a truncation marker) in [`SACRIFICE_ORDER`], largest first.
//! 2. **Proportional budgeting**: if still over, every file is cut to a share
//!    of the limit proportional to its current size.
//! 3. **Hard safety cut**: the reassembled text is truncated to the limit if
//!    marker overhead pushed it over.

use super::classify::categorize_file;
use super::summarizer::Summarizer;
use super::tokens::Tokenizer;
use super::types::{ChunkOutcome, ChunkReport, DiffChunk, Reduction, SACRIFICE_ORDER};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// File header that starts every block of a git diff
pub const DIFF_HEADER: &str = "diff --git ";

/// Appended to a file cut during proportional budgeting
pub const TRUNCATED_MARKER: &str = "\n...[Truncated]...";

/// Appended to the whole output when the final safety cut fires
pub const REMAINING_TRUNCATED_MARKER: &str = "\n...[Remaining Diff Truncated]...";

const UNKNOWN_FILENAME: &str = "unknown";

/// Fits diffs into a token budget.
///
/// Holds no per-call state: every call parses its own chunks, so one
/// processor can serve many threads.
pub struct DiffProcessor {
    tokenizer: Box<dyn Tokenizer + Send + Sync>,
    summarizer: Option<Box<dyn Summarizer + Send + Sync>>,
}

impl DiffProcessor {
    pub fn new<T>(tokenizer: T) -> Self
    where
        T: Tokenizer + Send + Sync + 'static,
    {
        Self {
            tokenizer: Box::new(tokenizer),
            summarizer: None,
        }
    }

    /// Summarize sacrificed files instead of replacing them with a bare marker
    pub fn with_summarizer<S>(mut self, summarizer: S) -> Self
    where
        S: Summarizer + Send + Sync + 'static,
    {
        self.summarizer = Some(Box::new(summarizer));
        self
    }

    pub fn tokenizer(&self) -> &(dyn Tokenizer + Send + Sync) {
        self.tokenizer.as_ref()
    }

    /// Split a diff into one chunk per file, in order of appearance
    pub fn parse_diff(&self, diff_text: &str) -> Vec<DiffChunk> {
        diff_text
            .split(DIFF_HEADER)
            .filter(|part| !part.trim().is_empty())
            .map(|part| {
                let content = format!("{}{}", DIFF_HEADER, part);
                let filename = extract_filename(part);
                let category = categorize_file(&filename);
                let token_count = self.tokenizer.count_tokens(&content);

                DiffChunk {
                    filename,
                    content,
                    token_count,
                    category,
                }
            })
            .collect()
    }

    /// Fit `diff_text` into `token_limit` tokens.
    ///
    /// Returns the input unchanged and `false` when it already fits.
    pub fn process_diff(&self, diff_text: &str, token_limit: usize) -> (String, bool) {
        let reduction = self.process_diff_with_report(diff_text, token_limit);
        (reduction.text, reduction.was_reduced)
    }

    /// Like [`process_diff`](Self::process_diff), with a per-file account
    /// of what was cut.
    ///
    /// `ChunkReport::final_tokens` is measured before the hard safety cut,
    /// which only applies to the joined text.
    pub fn process_diff_with_report(&self, diff_text: &str, token_limit: usize) -> Reduction {
        let mut chunks = self.parse_diff(diff_text);
        let original_tokens: usize = chunks.iter().map(|c| c.token_count).sum();

        let mut reports: Vec<ChunkReport> = chunks
            .iter()
            .map(|chunk| ChunkReport {
                filename: chunk.filename.clone(),
                category: chunk.category,
                original_tokens: chunk.token_count,
                final_tokens: chunk.token_count,
                outcome: ChunkOutcome::Kept,
            })
            .collect();

        if original_tokens <= token_limit {
            debug!(original_tokens, token_limit, "diff fits token budget");
            return Reduction {
                text: diff_text.to_string(),
                was_reduced: false,
                token_limit,
                original_tokens,
                final_tokens: original_tokens,
                chunks: reports,
            };
        }

        info!(
            original_tokens,
            token_limit,
            files = chunks.len(),
            "diff exceeds token budget, reducing"
        );

        let running =
            self.sacrifice_by_category(&mut chunks, &mut reports, original_tokens, token_limit);

        if running > token_limit {
            let total_current_size: usize = chunks.iter().map(|c| c.token_count).sum();
            if total_current_size == 0 {
                return Reduction {
                    text: String::new(),
                    was_reduced: true,
                    token_limit,
                    original_tokens,
                    final_tokens: 0,
                    chunks: reports,
                };
            }
            self.budget_proportionally(&mut chunks, &mut reports, total_current_size, token_limit);
        }

        for (report, chunk) in reports.iter_mut().zip(&chunks) {
            report.final_tokens = chunk.token_count;
        }

        let mut text = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut final_tokens = self.tokenizer.count_tokens(&text);
        if final_tokens > token_limit {
            debug!(final_tokens, token_limit, "applying hard safety cut");
            text = self.tokenizer.truncate_to_limit(&text, token_limit);
            text.push_str(REMAINING_TRUNCATED_MARKER);
            final_tokens = self.tokenizer.count_tokens(&text);
        }

        info!(original_tokens, final_tokens, token_limit, "diff reduced");

        Reduction {
            text,
            was_reduced: true,
            token_limit,
            original_tokens,
            final_tokens,
            chunks: reports,
        }
    }

    /// Phase A: replace whole non-logic files, most expendable category
    /// first and largest file first within a category. Returns the new
    /// running total.
    fn sacrifice_by_category(
        &self,
        chunks: &mut [DiffChunk],
        reports: &mut [ChunkReport],
        mut running: usize,
        token_limit: usize,
    ) -> usize {
        for category in SACRIFICE_ORDER {
            if running <= token_limit {
                break;
            }

            let mut targets: Vec<usize> = (0..chunks.len())
                .filter(|&i| chunks[i].category == category)
                .collect();
            targets.sort_by(|&a, &b| chunks[b].token_count.cmp(&chunks[a].token_count));

            for index in targets {
                if running <= token_limit {
                    break;
                }

                let chunk = &mut chunks[index];
                let (replacement, outcome) = self.replacement_for(chunk);
                let new_count = self.tokenizer.count_tokens(&replacement);

                // Only apply if it saves space
                if new_count < chunk.token_count {
                    debug!(
                        file = %chunk.filename,
                        category = category.as_str(),
                        from = chunk.token_count,
                        to = new_count,
                        "sacrificed file"
                    );
                    running -= chunk.token_count - new_count;
                    chunk.content = replacement;
                    chunk.token_count = new_count;
                    reports[index].outcome = outcome;
                } else {
                    debug!(file = %chunk.filename, "replacement not smaller, keeping file");
                    reports[index].outcome = ChunkOutcome::Skipped;
                }
            }
        }

        running
    }

    fn replacement_for(&self, chunk: &DiffChunk) -> (String, ChunkOutcome) {
        let Some(summarizer) = self.summarizer.as_ref() else {
            return (
                format!(
                    "{}{} [TRUNCATED]\n...Diff too large...\n",
                    DIFF_HEADER, chunk.filename
                ),
                ChunkOutcome::Truncated,
            );
        };

        // A panicking summarizer counts as a failed one
        let result =
            panic::catch_unwind(AssertUnwindSafe(|| summarizer.summarize(&chunk.content)))
                .unwrap_or_else(|_| Err(anyhow::anyhow!("summarizer panicked")));

        match result {
            Ok(summary) => (
                format!("{}{} [SUMMARIZED]\n{}\n", DIFF_HEADER, chunk.filename, summary),
                ChunkOutcome::Summarized,
            ),
            Err(e) => {
                warn!(file = %chunk.filename, "summarization failed: {:#}", e);
                (
                    format!(
                        "{}{} [TRUNCATED]\n...Diff too large and summarization failed...\n",
                        DIFF_HEADER, chunk.filename
                    ),
                    ChunkOutcome::SummaryFailed,
                )
            }
        }
    }

    /// Phase B: cut every file to `limit * size / total` tokens so the
    /// remaining deficit is shared instead of wiping out one file.
    fn budget_proportionally(
        &self,
        chunks: &mut [DiffChunk],
        reports: &mut [ChunkReport],
        total_current_size: usize,
        token_limit: usize,
    ) {
        for (chunk, report) in chunks.iter_mut().zip(reports.iter_mut()) {
            let budget = (token_limit as u128 * chunk.token_count as u128
                / total_current_size as u128) as usize;

            if budget < chunk.token_count {
                let mut content = self.tokenizer.truncate_to_limit(&chunk.content, budget);
                content.push_str(TRUNCATED_MARKER);
                debug!(file = %chunk.filename, budget, from = chunk.token_count, "budgeted file");

                chunk.token_count = self.tokenizer.count_tokens(&content);
                chunk.content = content;
                if matches!(report.outcome, ChunkOutcome::Kept | ChunkOutcome::Skipped) {
                    report.outcome = ChunkOutcome::Budgeted;
                }
            }
        }
    }
}

/// Best-effort path of the file a diff block touches.
///
/// `header_tail` is the block with the leading `diff --git ` removed, so its
/// first line looks like `a/src/main.rs b/src/main.rs`.
pub fn extract_filename(header_tail: &str) -> String {
    let first_line = header_tail.lines().next().unwrap_or("");

    if let Some(index) = first_line.find(" b/") {
        let path = first_line[index + 3..].trim();
        if !path.is_empty() {
            return path.to_string();
        }
    }

    // git quotes paths containing spaces or special characters
    if let Some(index) = first_line.find(" \"b/") {
        let path = first_line[index + 4..].trim().trim_end_matches('"');
        if !path.is_empty() {
            return path.to_string();
        }
    }

    let tokens: Vec<&str> = first_line.split_whitespace().collect();
    if tokens.len() >= 2 {
        if let Some(last) = tokens.last() {
            let path = last.strip_prefix("b/").unwrap_or(last);
            if !path.is_empty() {
                return path.to_string();
            }
        }
    }

    UNKNOWN_FILENAME.to_string()
}
