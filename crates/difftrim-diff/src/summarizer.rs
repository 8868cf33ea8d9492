//! Summarizer capability injected into the diff processor

/// Produces a short natural-language summary of one file's diff.
///
/// Implementations may block (typically a round trip to a completion
/// service) and may fail; the processor treats any error as non-fatal.
pub trait Summarizer {
    fn summarize(&self, chunk_content: &str) -> anyhow::Result<String>;
}

impl<F> Summarizer for F
where
    F: Fn(&str) -> anyhow::Result<String>,
{
    fn summarize(&self, chunk_content: &str) -> anyhow::Result<String> {
        self(chunk_content)
    }
}
