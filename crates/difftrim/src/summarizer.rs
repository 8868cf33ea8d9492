//! Summarizer backed by an external command.
//!
//! The command receives one file's diff on stdin and prints the summary on
//! stdout. It runs with a filtered environment (`pass_env`) plus
//! `DIFFTRIM_PROMPT`, so a script can forward both to whatever completion
//! service it talks to.

use crate::error::{SummarizeError, SummarizeResult};
use difftrim_core::SummarizerConfig;
use difftrim_diff::Summarizer;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::runtime::Handle;

/// Instructions handed to the summarizer command
pub const SUMMARY_PROMPT: &str = "Summarize the following git diff of a single file in one or two \
sentences. Name the functional change, not the formatting. Reply with the summary only.";

pub struct CommandSummarizer {
    config: SummarizerConfig,
    command_path: PathBuf,
    handle: Handle,
}

impl CommandSummarizer {
    /// `handle` must belong to a multi-threaded runtime; `summarize` blocks
    /// on it and has to be called from outside async context (for example
    /// inside `spawn_blocking`).
    pub fn new(config: SummarizerConfig, handle: Handle) -> Self {
        let command_path = config.command_path();
        Self {
            config,
            command_path,
            handle,
        }
    }

    fn environment(&self) -> HashMap<String, String> {
        self.filter_environment(std::env::vars())
    }

    /// Variables matched by `pass_env` (`PREFIX*` or an exact name), plus
    /// `DIFFTRIM_PROMPT`
    fn filter_environment(
        &self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> HashMap<String, String> {
        let mut env_vars = HashMap::new();

        for (key, value) in vars {
            let passed = self.config.pass_env.iter().any(|pattern| {
                match pattern.strip_suffix('*') {
                    Some(prefix) => key.starts_with(prefix),
                    None => key == *pattern,
                }
            });
            if passed {
                env_vars.insert(key, value);
            }
        }

        env_vars.insert("DIFFTRIM_PROMPT".to_string(), SUMMARY_PROMPT.to_string());
        env_vars
    }

    async fn run(&self, chunk_content: &str) -> SummarizeResult<String> {
        let mut child = Command::new(&self.command_path)
            .args(&self.config.args)
            .env_clear()
            .envs(self.environment())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SummarizeError::Spawn {
                command: self.command_path.display().to_string(),
                source,
            })?;

        let stdin = child.stdin.take();
        let input = chunk_content.as_bytes().to_vec();
        let write_input = async move {
            if let Some(mut stdin) = stdin {
                // The command may exit without reading everything
                if let Err(e) = stdin.write_all(&input).await {
                    if e.kind() != ErrorKind::BrokenPipe {
                        return Err(e);
                    }
                }
            }
            Ok(())
        };

        let secs = self.config.timeout_secs;
        let (written, output) = tokio::time::timeout(Duration::from_secs(secs), async {
            tokio::join!(write_input, child.wait_with_output())
        })
        .await
        .map_err(|_| SummarizeError::Timeout(secs))?;
        written?;
        let output = output?;

        if !output.status.success() {
            return Err(SummarizeError::Failed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let summary = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if summary.is_empty() {
            return Err(SummarizeError::Empty);
        }
        Ok(summary)
    }
}

impl Summarizer for CommandSummarizer {
    fn summarize(&self, chunk_content: &str) -> anyhow::Result<String> {
        let summary = self.handle.block_on(self.run(chunk_content))?;
        tracing::debug!(
            command = %self.command_path.display(),
            chars = summary.len(),
            "summarizer returned"
        );
        Ok(summary)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tokio::runtime::Runtime;

    fn shell(script: &str, timeout_secs: u64) -> SummarizerConfig {
        SummarizerConfig {
            enabled: true,
            command: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            timeout_secs,
            ..SummarizerConfig::default()
        }
    }

    fn summarize(config: SummarizerConfig, input: &str) -> anyhow::Result<String> {
        let runtime = Runtime::new().unwrap();
        let summarizer = CommandSummarizer::new(config, runtime.handle().clone());
        summarizer.summarize(input)
    }

    #[test]
    fn test_summary_is_trimmed_stdout() {
        let config = shell("cat > /dev/null; echo '  Adds retry logic  '", 10);
        assert_eq!(summarize(config, "diff --git a/x b/x\n").unwrap(), "Adds retry logic");
    }

    #[test]
    fn test_chunk_is_passed_on_stdin() {
        let config = shell("wc -l | tr -d ' '", 10);
        assert_eq!(summarize(config, "one\ntwo\nthree\n").unwrap(), "3");
    }

    #[test]
    fn test_environment_is_filtered() {
        let config = SummarizerConfig {
            pass_env: vec!["DIFFTRIM_*".to_string(), "HOME".to_string()],
            ..SummarizerConfig::default()
        };
        let runtime = Runtime::new().unwrap();
        let summarizer = CommandSummarizer::new(config, runtime.handle().clone());

        let vars = [
            ("DIFFTRIM_MODEL", "small"),
            ("HOME", "/home/dev"),
            ("HOMEBREW_PREFIX", "/opt/homebrew"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string()));

        let env = summarizer.filter_environment(vars);
        assert_eq!(env.get("DIFFTRIM_MODEL").map(String::as_str), Some("small"));
        assert_eq!(env.get("HOME").map(String::as_str), Some("/home/dev"));
        assert!(!env.contains_key("HOMEBREW_PREFIX"));
        assert!(!env.contains_key("AWS_SECRET_ACCESS_KEY"));
        assert_eq!(
            env.get("DIFFTRIM_PROMPT").map(String::as_str),
            Some(SUMMARY_PROMPT)
        );
    }

    #[test]
    fn test_unlisted_variables_do_not_reach_the_command() {
        let mut config = shell("cat > /dev/null; echo \"${HOME:-hidden}\"", 10);
        config.pass_env = vec!["PATH".to_string()];
        assert_eq!(summarize(config, "x").unwrap(), "hidden");
    }

    #[test]
    fn test_prompt_is_exported() {
        let config = shell("cat > /dev/null; printf '%s' \"$DIFFTRIM_PROMPT\"", 10);
        assert_eq!(summarize(config, "x").unwrap(), SUMMARY_PROMPT);
    }

    #[test]
    fn test_non_zero_exit_is_error() {
        let config = shell("cat > /dev/null; echo boom >&2; exit 3", 10);
        let err = summarize(config, "x").unwrap_err();
        match err.downcast_ref::<SummarizeError>() {
            Some(SummarizeError::Failed { code, stderr }) => {
                assert_eq!(*code, 3);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_output_is_error() {
        let config = shell("cat > /dev/null", 10);
        let err = summarize(config, "x").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SummarizeError>(),
            Some(SummarizeError::Empty)
        ));
    }

    #[test]
    fn test_timeout() {
        let config = shell("sleep 5", 1);
        let err = summarize(config, "x").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SummarizeError>(),
            Some(SummarizeError::Timeout(1))
        ));
    }

    #[test]
    fn test_missing_command() {
        let config = SummarizerConfig {
            command: "/nonexistent/summarize.sh".to_string(),
            ..SummarizerConfig::default()
        };
        let err = summarize(config, "x").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SummarizeError>(),
            Some(SummarizeError::Spawn { .. })
        ));
    }
}
