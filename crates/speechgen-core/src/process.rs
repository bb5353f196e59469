//! Subprocess plumbing shared by the adapters and the external converters

use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Lookups are cached for the lifetime of the process
static TOOL_CACHE: OnceLock<Mutex<HashMap<String, Option<PathBuf>>>> = OnceLock::new();

/// Resolve an executable name (or path) once per process.
pub fn locate(program: &str) -> Option<PathBuf> {
    let cache = TOOL_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut tools = cache.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(known) = tools.get(program) {
        return known.clone();
    }

    let found = which::which(program).ok();
    match &found {
        Some(path) => debug!("Found {} at {}", program, path.display()),
        None => debug!("{} not found", program),
    }
    tools.insert(program.to_string(), found.clone());
    found
}

/// Run a program to completion, killing it if it outlives `limit`.
///
/// A non-zero exit is an error carrying the captured stderr. A program that
/// cannot be spawned because it does not exist maps to
/// [`Error::ToolUnavailable`].
pub async fn run_with_timeout<I, S>(program: &Path, args: I, limit: Duration) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let name = program.display().to_string();

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ToolUnavailable(name.clone()),
            _ => Error::IoError(e),
        })?;

    // Dropping the wait future on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(output) => output?,
        Err(_) => {
            return Err(Error::Timeout {
                program: name,
                limit,
            })
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::ProcessFailed {
            program: name,
            status: output.status.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(output)
}
