//! Client code for gemini-search.
//!
//! This crate provides the concrete search backend: locating the Gemini CLI
//! for the host platform and running it as a subprocess.

pub mod gemini;

pub use gemini::{CommandLocator, GeminiBackend, GeminiCli, LocateError};
