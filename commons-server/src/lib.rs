//! # Commons Server
//!
//! Process entry point of the Commons platform.
//!
//! This crate provides:
//! - Configuration loading (`server`, `tenancy`, `logging`, `api`, `organizations`, `shutdown`)
//! - Logging initialization
//! - Provisioning of the configured organizations
//! - API server startup and graceful shutdown on SIGINT/SIGTERM

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod server;
pub mod shutdown;

pub use config::{AppConfig, OrganizationSeed, ShutdownConfig};
pub use server::{CommonsServer, ServerError, ServerState};
pub use shutdown::ShutdownController;
