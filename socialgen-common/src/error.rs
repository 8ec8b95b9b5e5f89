//! Common error types for SocialGen

use thiserror::Error;

/// Common result type for SocialGen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the studio crates
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed startup setting. Fatal: the server never binds.
    #[error("Startup configuration error: {0}")]
    StartupConfig(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML config file could not be parsed
    #[error("Config file parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
