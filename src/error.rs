//! Application error type.
//!
//! Every fatal condition carries the process exit code it maps to, so the
//! binary can stay a thin wrapper around the library.

/// Bad input: unreadable template, bad CLI value, I/O failure on an artifact.
pub const EXIT_INPUT: u8 = 2;
/// The scan finished but nothing matched.
pub const EXIT_NO_DATA: u8 = 3;
/// Structural problem that makes the whole invocation unsafe to continue
/// (record shape mismatch, steady window longer than a run).
pub const EXIT_STRUCTURAL: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::new(EXIT_STRUCTURAL, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True for errors that must abort the whole aggregation rather than
    /// just the run that raised them.
    pub fn is_structural(&self) -> bool {
        self.exit_code == EXIT_STRUCTURAL
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
