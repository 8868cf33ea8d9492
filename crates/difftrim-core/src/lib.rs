//! # difftrim-core
//!
//! Shared configuration and logging setup for the difftrim crates.
//!
//! - `config`: layered TOML configuration (defaults, global, repo, explicit file)
//! - `logging`: tracing subscriber setup writing to stderr or a rolling file

pub mod config;
pub mod error;
pub mod logging;

pub use config::{BudgetConfig, Config, LogConfig, SummarizerConfig};
pub use error::{ConfigError, ConfigResult};
