//! # Commons Core
//!
//! Shared configuration plumbing for the Commons community-management platform.
//!
//! This crate provides:
//! - Configuration loading from YAML, TOML and JSON files
//! - Validation with path-aware error messages
//! - Environment variable overrides (`COMMONS_*`)
//! - The platform-wide configuration sections (server, tenancy, logging)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]

/// Error types
pub mod error;

/// Configuration management
pub mod config;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::*;
}
