//! Platform-specific discovery of the `gemini` CLI.
//!
//! The strategy is picked once per host and yields the argv prefix used for
//! every invocation.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use super::error::LocateError;

/// Path of the CLI entry point relative to an npm `node_modules` root.
const NODE_ENTRY: [&str; 5] = ["node_modules", "@google", "gemini-cli", "dist", "index.js"];

/// Command discovery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandLocator {
    /// `which gemini`.
    Unix,
    /// `where gemini`, with npm-install fallbacks.
    Windows,
}

impl CommandLocator {
    /// Strategy for the host this binary was built for.
    pub fn for_host() -> Self {
        if cfg!(windows) { CommandLocator::Windows } else { CommandLocator::Unix }
    }

    /// Resolve the argv prefix that starts the CLI.
    pub async fn locate(self) -> Result<Vec<String>, LocateError> {
        let command = match self {
            CommandLocator::Unix => locate_unix().await,
            CommandLocator::Windows => locate_windows().await,
        }?;
        tracing::debug!(?command, locator = ?self, "located gemini CLI");
        Ok(command)
    }
}

/// Run a lookup command and return the first non-empty stdout line.
async fn first_line(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().await.ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(String::from)
}

async fn locate_unix() -> Result<Vec<String>, LocateError> {
    first_line("which", &["gemini"]).await.map(|path| vec![path]).ok_or(LocateError::NotFound)
}

async fn locate_windows() -> Result<Vec<String>, LocateError> {
    if let Some(path) = first_line("where", &["gemini"]).await
        && Path::new(&path).exists()
    {
        return Ok(windows_command_for(Path::new(&path)));
    }

    let prefix = first_line("npm", &["config", "get", "prefix"]).await.ok_or(LocateError::NotFound)?;
    let entry = node_entry(Path::new(&prefix));
    if entry.exists() {
        return Ok(vec!["node".into(), entry.to_string_lossy().into_owned()]);
    }

    Err(LocateError::NotFound)
}

/// Build the argv prefix for a `gemini` path found on a Windows `PATH`.
///
/// Batch shims run directly; otherwise the npm entry script next to the shim
/// runs under node, falling back to running the shim under bash.
pub fn windows_command_for(path: &Path) -> Vec<String> {
    let display = path.to_string_lossy().into_owned();
    let extension = path.extension().map(|e| e.to_ascii_lowercase());
    if matches!(extension.as_deref().and_then(|e| e.to_str()), Some("cmd" | "bat")) {
        return vec![display];
    }

    if let Some(dir) = path.parent() {
        let entry = node_entry(dir);
        if entry.exists() {
            return vec!["node".into(), entry.to_string_lossy().into_owned()];
        }
    }

    vec!["bash".into(), display]
}

fn node_entry(root: &Path) -> PathBuf {
    NODE_ENTRY.iter().fold(root.to_path_buf(), |path, part| path.join(part))
}
