//! Error types shared across the workspace.

mod config;

pub use config::ConfigError;

/// How serious an error is for the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// Informational, nothing to do.
    Info,
    /// The value was rejected but a default can be used.
    Warning,
    /// The operation can be retried.
    Recoverable,
    /// The process cannot continue.
    Fatal,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Recoverable => write!(f, "recoverable"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}
