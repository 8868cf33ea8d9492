use crate::cli::{Command, FitArgs};
use crate::summarizer::CommandSummarizer;
use anyhow::{Context, Result};
use difftrim_core::{BudgetConfig, Config};
use difftrim_diff::{
    build_tokenizer, categorize_file, sort_files, DiffProcessor, FileCategory, Reduction,
};
use serde::Serialize;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tokio::runtime::Handle;

pub async fn execute(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Fit(args) => fit(args, &config).await,
        Command::Classify { json, paths } => classify(&paths, json),
        Command::Count { encoding } => count(encoding, &config).await,
    }
}

async fn read_stdin() -> Result<String> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read diff from stdin")?;
    Ok(input)
}

async fn fit(args: FitArgs, config: &Config) -> Result<()> {
    let mut budget = config.budget();
    if let Some(limit) = args.limit {
        budget.token_limit = limit;
    }
    if let Some(encoding) = args.encoding {
        budget.encoding = encoding;
    }

    let mut summarizer = config.summarizer();
    if let Some(command) = args.summarizer {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        summarizer.command = resolve_cli_command(command, &cwd);
        summarizer.args.clear();
        summarizer.enabled = true;
    }
    if args.no_summarize {
        summarizer.enabled = false;
    }

    let input = read_stdin().await?;
    let tokenizer = build_tokenizer(&budget).context("Failed to build tokenizer")?;
    let mut processor = DiffProcessor::new(tokenizer);
    if summarizer.enabled {
        tracing::info!(command = %summarizer.command_path().display(), "summarizer enabled");
        processor = processor.with_summarizer(CommandSummarizer::new(summarizer, Handle::current()));
    }

    // The summarizer blocks on the runtime, so the engine runs off the async workers
    let token_limit = budget.token_limit;
    let reduction = tokio::task::spawn_blocking(move || {
        processor.process_diff_with_report(&input, token_limit)
    })
    .await
    .context("Diff processing task failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reduction)?);
    } else {
        print!("{}", reduction.text);
        if reduction.was_reduced {
            eprintln!("{}", reduction_notice(&reduction));
        }
    }

    Ok(())
}

/// A `--summarizer` value that names a path (`./sum.sh`, `bin/sum`) is taken
/// relative to the working directory. Bare names stay plugin names and
/// resolve against `plugins_dir`.
fn resolve_cli_command(command: String, cwd: &Path) -> String {
    let is_bare = !command.contains('/') && !command.contains(std::path::MAIN_SEPARATOR);
    if is_bare
        || command.starts_with('~')
        || command.starts_with('$')
        || Path::new(&command).is_absolute()
    {
        return command;
    }
    cwd.join(&command).to_string_lossy().to_string()
}

fn reduction_notice(reduction: &Reduction) -> String {
    format!(
        "Warning: diff reduced from {} to {} tokens to fit the {} token budget",
        reduction.original_tokens, reduction.final_tokens, reduction.token_limit
    )
}

#[derive(Debug, Serialize)]
struct ClassifiedPath<'a> {
    path: &'a str,
    category: FileCategory,
}

fn classify(paths: &[String], json: bool) -> Result<()> {
    let classified: Vec<ClassifiedPath> = sort_files(paths)
        .into_iter()
        .map(|path| ClassifiedPath {
            path,
            category: categorize_file(path),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&classified)?);
    } else {
        for entry in &classified {
            println!("{:<8} {}", entry.category.as_str(), entry.path);
        }
    }

    Ok(())
}

async fn count(encoding: Option<String>, config: &Config) -> Result<()> {
    let budget = BudgetConfig {
        encoding: encoding.unwrap_or_else(|| config.budget().encoding),
        ..config.budget()
    };

    let input = read_stdin().await?;
    let tokenizer = build_tokenizer(&budget).context("Failed to build tokenizer")?;
    println!("{}", tokenizer.count_tokens(&input));

    Ok(())
}
