//! Terminal height probing.

use crate::error::ParunError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::{Command, Stdio};

static RE_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"LINES=(\d+)").unwrap());

/// Source of the current terminal height, in text lines.
pub trait TerminalProbe {
    fn lines(&self) -> Result<u16, ParunError>;
}

/// Asks xterm's `resize` utility for the terminal size.
pub struct ResizeProbe {
    program: String,
}

impl ResizeProbe {
    pub fn new() -> Self {
        Self {
            program: "resize".to_string(),
        }
    }
}

impl Default for ResizeProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalProbe for ResizeProbe {
    fn lines(&self) -> Result<u16, ParunError> {
        let output = Command::new(&self.program)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                ParunError::GeometryUnavailable(format!("failed to run `{}`: {}", self.program, e))
            })?;

        parse_resize_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Pull the `LINES=<n>` value out of `resize` output.
pub fn parse_resize_output(output: &str) -> Result<u16, ParunError> {
    RE_LINES
        .captures(output)
        .and_then(|caps| caps[1].parse::<u16>().ok())
        .ok_or_else(|| ParunError::GeometryUnavailable("can't parse `resize` output".to_string()))
}
