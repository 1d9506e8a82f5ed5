//! GNU screen invocation.

use crate::error::ParunError;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io;
use std::os::fd::AsFd;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

const SCREEN: &str = "screen";

/// One multiplexer launch: the rendered script plus session options.
#[derive(Debug, Clone, Copy)]
pub struct LaunchRequest<'a> {
    pub script: &'a Path,
    pub daemon: bool,
    pub session_name: Option<&'a str>,
}

impl LaunchRequest<'_> {
    /// Command-line arguments for screen
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-c".into(), self.script.into()];
        if self.daemon {
            args.push("-dm".into());
        }
        if let Some(name) = self.session_name {
            args.push("-S".into());
            args.push(name.into());
        }
        args
    }
}

/// Something that can run a session script and report its exit status.
pub trait Multiplexer {
    fn launch(&self, request: &LaunchRequest<'_>) -> Result<i32>;
}

pub struct Screen {
    binary: PathBuf,
}

impl Screen {
    /// Find `screen` on PATH.
    pub fn locate() -> Result<Self, ParunError> {
        which::which(SCREEN)
            .map(Self::with_binary)
            .map_err(|_| ParunError::MultiplexerNotFound(SCREEN.to_string()))
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Multiplexer for Screen {
    fn launch(&self, request: &LaunchRequest<'_>) -> Result<i32> {
        // screen insists on a terminal for stdin; stdin may be a drained pipe
        let tty = io::stderr()
            .as_fd()
            .try_clone_to_owned()
            .context("Failed to duplicate stderr")?;

        let args = request.args();
        debug!(binary = %self.binary.display(), ?args, "launching multiplexer");

        let status = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::from(tty))
            .status()
            .with_context(|| format!("Failed to run {}", self.binary.display()))?;

        let code = exit_code(status);
        debug!(code, "multiplexer exited");
        Ok(code)
    }
}

/// Exit code to propagate; signals map to 128 + signal like a shell does.
fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}
