//! Temporary files that remove themselves when dropped.

use anyhow::{Context, Result};
use scopeguard::ScopeGuard;
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Path of a temporary file, deleted when the guard goes out of scope.
pub type TempFile = ScopeGuard<PathBuf, fn(PathBuf)>;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Every temp file currently alive in this process.
static LIVE: Registry = Registry::new();

/// Set of paths to delete if the process is interrupted before the guards drop.
pub struct Registry {
    paths: Mutex<Vec<PathBuf>>,
}

impl Registry {
    pub const fn new() -> Self {
        Self {
            paths: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.paths.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, path: &Path) {
        self.lock().push(path.to_path_buf());
    }

    pub fn unregister(&self, path: &Path) {
        self.lock().retain(|p| p != path);
    }

    #[cfg(test)]
    pub fn contains(&self, path: &Path) -> bool {
        self.lock().iter().any(|p| p == path)
    }

    /// Delete every registered file and forget them.
    pub fn remove_all(&self) {
        for path in self.lock().drain(..) {
            let _ = fs::remove_file(&path);
        }
    }
}

/// Delete every temp file still alive. Called from the signal handler.
pub fn remove_all_live() {
    LIVE.remove_all();
}

/// Create a temporary file holding `contents`.
pub fn create(prefix: &str, contents: &[u8]) -> Result<TempFile> {
    create_with(&env::temp_dir(), prefix, |file| file.write_all(contents))
}

/// Create a temporary file holding everything `reader` yields.
pub fn from_reader(prefix: &str, reader: &mut dyn Read) -> Result<TempFile> {
    create_with(&env::temp_dir(), prefix, |file| {
        io::copy(reader, file).map(|_| ())
    })
}

fn create_with(
    dir: &Path,
    prefix: &str,
    fill: impl FnOnce(&mut File) -> io::Result<()>,
) -> Result<TempFile> {
    let (path, mut file) = loop {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!("{}.{}.{}", prefix, process::id(), n));

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(&path)
        {
            Ok(file) => {
                LIVE.register(&path);
                break (path, file);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to create temp file in {}", dir.display()))
            }
        }
    };

    debug!(path = %path.display(), "created temp file");
    let guard: TempFile = scopeguard::guard(path, remove as fn(PathBuf));

    fill(&mut file)
        .and_then(|_| file.flush())
        .with_context(|| format!("Failed to write temp file {}", guard.display()))?;

    Ok(guard)
}

fn remove(path: PathBuf) {
    LIVE.unregister(&path);
    match fs::remove_file(&path) {
        Ok(()) => debug!(path = %path.display(), "removed temp file"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove temp file"),
    }
}
