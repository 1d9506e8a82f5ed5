//! Error types surfaced to the user.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParunError {
    #[error("can't read command-list: no such file '{}'", .0.display())]
    CommandListNotFound(PathBuf),

    #[error("no commands to run")]
    NoCommands,

    #[error("invalid minimum height '{0}' (expected a positive integer)")]
    InvalidMinHeight(String),

    #[error("can't determine terminal height: {0}")]
    GeometryUnavailable(String),

    #[error("can't find `{0}` in PATH")]
    MultiplexerNotFound(String),
}
