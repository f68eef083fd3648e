//! Gemini CLI backend.
//!
//! Runs the `gemini` CLI in headless mode as a subprocess.
//!
//! ### Invocation
//!
//! - **Command**: `<gemini> -p <prompt> --yolo --output-format json -m <model>`
//! - **Discovery**: resolved once at startup via [`CommandLocator`], or taken
//!   verbatim from `gemini_command` in config.
//! - **Timeout**: the child is killed when the time bound elapses.
//! - **Errors**: non-zero exit or spawn failure maps to
//!   [`BackendError::Process`]; running out of time maps to
//!   [`BackendError::Timeout`].
//! - **Missing CLI**: [`GeminiBackend`] defers a failed lookup to the first
//!   invocation, so cached results are served on hosts without the CLI.

pub mod error;
pub mod locate;

pub use error::LocateError;
pub use locate::CommandLocator;

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gsearch_core::{AppConfig, BackendError, SearchBackend};
use tokio::process::Command;

/// Longest stderr excerpt carried in a process error.
const MAX_STDERR_CHARS: usize = 500;

/// Gemini CLI invoked as a subprocess.
#[derive(Debug, Clone)]
pub struct GeminiCli {
    program: Vec<String>,
}

impl GeminiCli {
    /// Use an explicit argv prefix.
    pub fn new(program: Vec<String>) -> Result<Self, LocateError> {
        if program.is_empty() || program[0].is_empty() {
            return Err(LocateError::EmptyCommand);
        }
        Ok(Self { program })
    }

    /// Discover the CLI with the given strategy.
    pub async fn locate(locator: CommandLocator) -> Result<Self, LocateError> {
        Self::new(locator.locate().await?)
    }

    /// Use `gemini_command` from config if set, otherwise discover for this host.
    pub async fn from_config(config: &AppConfig) -> Result<Self, LocateError> {
        match &config.gemini_command {
            Some(command) => Self::new(command.argv()),
            None => Self::locate(CommandLocator::for_host()).await,
        }
    }

    pub fn program(&self) -> &[String] {
        &self.program
    }

    fn command(&self, prompt: &str, model: &str) -> Command {
        let mut cmd = Command::new(&self.program[0]);
        cmd.args(&self.program[1..])
            .args(["-p", prompt, "--yolo", "--output-format", "json", "-m", model])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl SearchBackend for GeminiCli {
    async fn invoke(&self, prompt: &str, model: &str, timeout: Duration) -> Result<Vec<u8>, BackendError> {
        let start = Instant::now();
        tracing::debug!("running gemini CLI: model={}", model);

        let mut cmd = self.command(prompt, model);
        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Err(_) => return Err(BackendError::Timeout(timeout)),
            Ok(Err(e)) => return Err(BackendError::Process(format!("failed to start {}: {}", self.program[0], e))),
            Ok(Ok(output)) => output,
        };

        tracing::debug!("gemini CLI exited with {} in {:?}", output.status, start.elapsed());

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(MAX_STDERR_CHARS).collect();
            return Err(BackendError::Process(if excerpt.is_empty() {
                output.status.to_string()
            } else {
                format!("{}: {}", output.status, excerpt)
            }));
        }

        Ok(output.stdout)
    }
}

/// The Gemini CLI if it could be found, or the reason it could not.
#[derive(Debug, Clone)]
pub enum GeminiBackend {
    Ready(GeminiCli),
    Unavailable(String),
}

impl GeminiBackend {
    /// Resolve the CLI from config. Lookup failures are logged and reported
    /// by [`SearchBackend::invoke`].
    pub async fn from_config(config: &AppConfig) -> Self {
        match GeminiCli::from_config(config).await {
            Ok(cli) => Self::Ready(cli),
            Err(e) => {
                tracing::warn!("gemini CLI unavailable: {}", e);
                Self::Unavailable(e.to_string())
            }
        }
    }
}

#[async_trait]
impl SearchBackend for GeminiBackend {
    async fn invoke(&self, prompt: &str, model: &str, timeout: Duration) -> Result<Vec<u8>, BackendError> {
        match self {
            Self::Ready(cli) => cli.invoke(prompt, model, timeout).await,
            Self::Unavailable(reason) => Err(BackendError::Process(reason.clone())),
        }
    }
}
