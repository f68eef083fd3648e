//! Gemini CLI client error types.

/// Errors from locating the Gemini CLI.
#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    /// No `gemini` executable could be found.
    #[error("could not find gemini CLI; install it with: npm install -g @google/gemini-cli")]
    NotFound,

    /// The configured command override is empty.
    #[error("configured gemini command is empty")]
    EmptyCommand,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LocateError::NotFound;
        assert!(err.to_string().contains("npm install -g @google/gemini-cli"));

        let err = LocateError::EmptyCommand;
        assert!(err.to_string().contains("empty"));
    }
}
