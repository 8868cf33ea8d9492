//! Token accounting: counting and token-bounded truncation

use super::error::{TokenizerError, TokenizerResult};
use difftrim_core::BudgetConfig;
use tiktoken_rs::CoreBPE;
use tracing::debug;

/// Name of the character-ratio tokenizer in configuration
pub const HEURISTIC_ENCODING: &str = "heuristic";

/// Counts tokens and cuts text to a token limit.
pub trait Tokenizer {
    /// Number of tokens `text` encodes to; 0 for the empty string
    fn count_tokens(&self, text: &str) -> usize;

    /// `text` unchanged if it fits in `limit` tokens, otherwise the decoded
    /// prefix of its first `limit` tokens. The cut may land mid-word.
    fn truncate_to_limit(&self, text: &str, limit: usize) -> String;
}

impl<T: Tokenizer + ?Sized> Tokenizer for Box<T> {
    fn count_tokens(&self, text: &str) -> usize {
        (**self).count_tokens(text)
    }

    fn truncate_to_limit(&self, text: &str, limit: usize) -> String {
        (**self).truncate_to_limit(text, limit)
    }
}

/// BPE tokenizer backed by tiktoken-rs
pub struct Tiktoken {
    bpe: CoreBPE,
    encoding: String,
}

impl Tiktoken {
    pub fn new(encoding: &str) -> TokenizerResult<Self> {
        let bpe = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            other => return Err(TokenizerError::UnknownEncoding(other.to_string())),
        }
        .map_err(|e| TokenizerError::Load {
            name: encoding.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            bpe,
            encoding: encoding.to_string(),
        })
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }
}

impl Tokenizer for Tiktoken {
    fn count_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_ordinary(text).len()
    }

    fn truncate_to_limit(&self, text: &str, limit: usize) -> String {
        if limit == 0 {
            return String::new();
        }

        let tokens = self.bpe.encode_ordinary(text);
        if tokens.len() <= limit {
            return text.to_string();
        }

        // A prefix can split a multi-byte character across tokens; drop
        // tokens until it decodes.
        let mut end = limit;
        while end > 0 {
            if let Ok(prefix) = self.bpe.decode(tokens[..end].to_vec()) {
                return prefix;
            }
            end -= 1;
        }
        String::new()
    }
}

/// Estimates tokens from a fixed characters-per-token ratio.
///
/// No vocabulary to load, so it works offline. A ratio of 1.0 makes every
/// character one token.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicTokenizer {
    chars_per_token: f64,
}

impl HeuristicTokenizer {
    pub fn new(chars_per_token: f64) -> TokenizerResult<Self> {
        if !chars_per_token.is_finite() || chars_per_token <= 0.0 {
            return Err(TokenizerError::InvalidRatio(chars_per_token));
        }
        Ok(Self { chars_per_token })
    }
}

impl Tokenizer for HeuristicTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        let chars = text.chars().count();
        (chars as f64 / self.chars_per_token).ceil() as usize
    }

    fn truncate_to_limit(&self, text: &str, limit: usize) -> String {
        if limit == 0 {
            return String::new();
        }
        if self.count_tokens(text) <= limit {
            return text.to_string();
        }
        let keep = (limit as f64 * self.chars_per_token).floor() as usize;
        text.chars().take(keep).collect()
    }
}

/// Build the tokenizer named by `[budget] encoding`
pub fn build_tokenizer(config: &BudgetConfig) -> TokenizerResult<Box<dyn Tokenizer + Send + Sync>> {
    if config.encoding == HEURISTIC_ENCODING {
        debug!(chars_per_token = config.chars_per_token, "using heuristic tokenizer");
        Ok(Box::new(HeuristicTokenizer::new(config.chars_per_token)?))
    } else {
        let tokenizer = Tiktoken::new(&config.encoding)?;
        debug!(encoding = tokenizer.encoding(), "using BPE tokenizer");
        Ok(Box::new(tokenizer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_tokens() {
        let tokenizer = Tiktoken::new("cl100k_base").unwrap();
        assert_eq!(tokenizer.count_tokens(""), 0);
        let count = tokenizer.count_tokens("Hello world");
        assert!(count > 0 && count <= 3);
    }

    #[test]
    fn test_truncate_to_limit() {
        let tokenizer = Tiktoken::new("cl100k_base").unwrap();
        let text = "word ".repeat(100);

        let truncated = tokenizer.truncate_to_limit(&text, 10);
        assert!(tokenizer.count_tokens(&truncated) <= 10);
        assert!(truncated.len() < text.len());
        assert!(text.starts_with(&truncated));
    }

    #[test]
    fn test_truncate_within_limit_is_identity() {
        let tokenizer = Tiktoken::new("cl100k_base").unwrap();
        let text = "fn main() {}\n";
        assert_eq!(tokenizer.truncate_to_limit(text, 1000), text);
        assert_eq!(tokenizer.truncate_to_limit(text, 0), "");
    }

    #[test]
    fn test_truncate_multibyte_text() {
        let tokenizer = Tiktoken::new("cl100k_base").unwrap();
        let text = "日本語のテキスト🎉".repeat(20);
        for limit in 1..12 {
            let truncated = tokenizer.truncate_to_limit(&text, limit);
            assert!(truncated.len() < text.len());
            assert!(text.starts_with(&truncated));
        }
    }

    #[test]
    fn test_encoding_name() {
        let tokenizer = Tiktoken::new("o200k_base").unwrap();
        assert_eq!(tokenizer.encoding(), "o200k_base");
    }

    #[test]
    fn test_unknown_encoding() {
        assert!(matches!(
            Tiktoken::new("gpt2-ish"),
            Err(TokenizerError::UnknownEncoding(name)) if name == "gpt2-ish"
        ));
    }

    #[test]
    fn test_heuristic_tokenizer() {
        let tokenizer = HeuristicTokenizer::new(4.0).unwrap();
        assert_eq!(tokenizer.count_tokens(""), 0);
        assert_eq!(tokenizer.count_tokens("abcd"), 1);
        assert_eq!(tokenizer.count_tokens("abcde"), 2);

        let truncated = tokenizer.truncate_to_limit(&"x".repeat(100), 5);
        assert_eq!(truncated.len(), 20);
        assert_eq!(tokenizer.count_tokens(&truncated), 5);
    }

    #[test]
    fn test_heuristic_fractional_ratio_respects_limit() {
        let tokenizer = HeuristicTokenizer::new(3.5).unwrap();
        let text = "y".repeat(1000);
        for limit in [1, 3, 7, 100] {
            let truncated = tokenizer.truncate_to_limit(&text, limit);
            assert!(tokenizer.count_tokens(&truncated) <= limit);
        }
    }

    #[test]
    fn test_heuristic_rejects_bad_ratio() {
        assert!(HeuristicTokenizer::new(0.0).is_err());
        assert!(HeuristicTokenizer::new(-1.0).is_err());
        assert!(HeuristicTokenizer::new(f64::NAN).is_err());
    }

    #[test]
    fn test_build_tokenizer() {
        let config = BudgetConfig {
            encoding: HEURISTIC_ENCODING.to_string(),
            chars_per_token: 1.0,
            ..BudgetConfig::default()
        };
        let tokenizer = build_tokenizer(&config).unwrap();
        assert_eq!(tokenizer.count_tokens("abc"), 3);

        let tokenizer = build_tokenizer(&BudgetConfig::default()).unwrap();
        assert!(tokenizer.count_tokens("abc") >= 1);

        let config = BudgetConfig {
            encoding: "nope".to_string(),
            ..BudgetConfig::default()
        };
        assert!(build_tokenizer(&config).is_err());
    }
}
