//! Where the commands come from: inline arguments or a command-list file.

use crate::error::ParunError;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// A single positional argument names a command-list file; anything else is
/// a list of inline commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSource {
    Inline(Vec<String>),
    File(PathBuf),
}

impl CommandSource {
    pub fn from_args(mut args: Vec<String>) -> Self {
        if args.len() == 1 {
            CommandSource::File(PathBuf::from(args.remove(0)))
        } else {
            CommandSource::Inline(args)
        }
    }

    pub fn load(&self) -> Result<Vec<String>> {
        match self {
            CommandSource::Inline(commands) => Ok(commands.clone()),
            CommandSource::File(path) => {
                if !path.exists() {
                    return Err(ParunError::CommandListNotFound(path.clone()).into());
                }

                let bytes = fs::read(path)
                    .with_context(|| format!("can't read command-list '{}'", path.display()))?;
                Ok(parse_command_list(&String::from_utf8_lossy(&bytes)))
            }
        }
    }

    /// Session name to use when none was given: the command-list basename.
    pub fn default_session_name(&self) -> Option<String> {
        match self {
            CommandSource::Inline(_) => None,
            CommandSource::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        }
    }
}

/// Parse command-list text into commands.
///
/// Lines are trimmed; blank lines and `#` comments (including a shebang) are
/// skipped. A trailing backslash joins the line with the next one, with the
/// backslash dropped and nothing inserted in its place. A continuation still
/// open at end of file is discarded.
pub fn parse_command_list(text: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut command = String::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(head) = line.strip_suffix('\\') {
            command.push_str(head);
        } else {
            command.push_str(line);
            commands.push(std::mem::take(&mut command));
        }
    }

    commands
}
