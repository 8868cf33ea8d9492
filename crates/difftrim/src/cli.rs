use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "difftrim",
    version,
    about = "Fit git diffs into an LLM token budget"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Specify configuration file path
    #[arg(long, env = "DIFFTRIM_CONFIG", global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, env = "DIFFTRIM_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read a diff from stdin and print it fitted to the token budget
    Fit(FitArgs),

    /// Print paths most important first, with their categories
    Classify {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// File paths to classify
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the token count of stdin
    Count {
        /// Tokenizer encoding
        #[arg(long, env = "DIFFTRIM_ENCODING")]
        encoding: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct FitArgs {
    /// Token budget for the output
    #[arg(short, long, env = "DIFFTRIM_TOKEN_LIMIT")]
    pub limit: Option<usize>,

    /// Tokenizer encoding (cl100k_base, o200k_base, p50k_base, heuristic)
    #[arg(long, env = "DIFFTRIM_ENCODING")]
    pub encoding: Option<String>,

    /// Summarizer command; enables summarization of sacrificed files.
    /// Paths are relative to the working directory, bare names are plugins
    /// looked up in `plugins_dir`
    #[arg(long, env = "DIFFTRIM_SUMMARIZER", conflicts_with = "no_summarize")]
    pub summarizer: Option<String>,

    /// Never call the summarizer, even if enabled in config
    #[arg(long)]
    pub no_summarize: bool,

    /// Print a JSON report instead of the diff
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fit() {
        let cli = Cli::try_parse_from(["difftrim", "fit", "--limit", "2000", "--json"]).unwrap();
        match cli.command {
            Command::Fit(args) => {
                assert_eq!(args.limit, Some(2000));
                assert!(args.json);
                assert!(!args.no_summarize);
            }
            _ => panic!("expected fit"),
        }
    }

    #[test]
    fn test_summarizer_conflicts_with_no_summarize() {
        let result = Cli::try_parse_from([
            "difftrim",
            "fit",
            "--summarizer",
            "sum.sh",
            "--no-summarize",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_classify_requires_paths() {
        assert!(Cli::try_parse_from(["difftrim", "classify"]).is_err());

        let cli = Cli::try_parse_from(["difftrim", "classify", "a.py", "b.md"]).unwrap();
        match cli.command {
            Command::Classify { paths, json } => {
                assert_eq!(paths, vec!["a.py", "b.md"]);
                assert!(!json);
            }
            _ => panic!("expected classify"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli =
            Cli::try_parse_from(["difftrim", "count", "--config", "/tmp/difftrim.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("/tmp/difftrim.toml"));
    }
}
