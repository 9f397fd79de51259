//! Error type for the command-line front end.

use thiserror::Error;
use varnish_common::config::ConfigError;
use varnish_common::functions::FunctionError;

#[derive(Debug, Error)]
pub enum CliError {
    /// No facts file was given and the configuration has no `[facts]` section.
    #[error("no host facts available: pass --facts FILE or add a [facts] section to the config")]
    NoFacts,

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Function(#[from] FunctionError),

    #[error("output encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;
