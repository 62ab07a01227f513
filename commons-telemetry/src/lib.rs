//! # Commons Telemetry
//!
//! Logging and tracing for the Commons platform.
//!
//! - **Structured Logging**: JSON or pretty `tracing` output to stdout and rolling files
//! - **Data Masking**: session tokens, JWTs and domain verification tokens are
//!   redacted before they reach any writer
//! - **Spans**: request, tenant resolution and scoped query spans

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

/// Logging configuration and initialization
pub mod logging;

/// Sensitive data masking
pub mod masking;

/// Span definitions
pub mod spans;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::logging::{LogConfig, LogFormat, LogOutput, LoggingError, init_logging};
    pub use crate::masking::{Sensitive, SensitiveDataMasker};
    pub use crate::spans::*;
}
