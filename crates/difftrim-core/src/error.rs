use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid log level: {0}")]
    LogLevel(String),

    #[error("Logging already initialized")]
    LogInit,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
