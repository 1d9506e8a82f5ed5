//! Session configuration, resolved once at startup.

use crate::error::ParunError;

/// Built-in minimum pane height, used when neither flag nor environment set one.
pub const DEFAULT_MIN_HEIGHT: u16 = 8;

/// Environment variable holding the default minimum pane height.
pub const MIN_HEIGHT_ENV: &str = "PARUN_MINHEIGHT";

/// Everything one invocation needs to know. Always holds at least one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    name: Option<String>,
    daemon: bool,
    min_height: u16,
    commands: Vec<String>,
}

impl SessionConfig {
    pub fn new(commands: Vec<String>, min_height: u16) -> Result<Self, ParunError> {
        if commands.is_empty() {
            return Err(ParunError::NoCommands);
        }
        if min_height == 0 {
            return Err(ParunError::InvalidMinHeight(min_height.to_string()));
        }

        Ok(Self {
            name: None,
            daemon: false,
            min_height,
            commands,
        })
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name.filter(|n| !n.is_empty());
        self
    }

    pub fn with_daemon(mut self, daemon: bool) -> Self {
        self.daemon = daemon;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn daemon(&self) -> bool {
        self.daemon
    }

    pub fn min_height(&self) -> u16 {
        self.min_height
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }
}

/// Pick the minimum pane height: explicit flag, then environment, then default.
///
/// The environment value is only looked at when no flag was given, and an
/// empty value counts as unset.
pub fn resolve_min_height(flag: Option<u16>, env_value: Option<&str>) -> Result<u16, ParunError> {
    if let Some(height) = flag {
        return Ok(height);
    }

    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => match raw.parse::<u16>() {
            Ok(height) if height > 0 => Ok(height),
            _ => Err(ParunError::InvalidMinHeight(raw.to_string())),
        },
        None => Ok(DEFAULT_MIN_HEIGHT),
    }
}
